//! Registry loading and joined-output persistence.

use crate::joiner::JoinOutcome;
use crate::registry::{Registry, RegistryEntry, RegistryError};
use coursemap_crawl::store::{load_json, write_json_atomic, write_text_atomic, LoadError, PersistError};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RegistryLoadError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("invalid registry {}: {source}", path.display())]
    Invalid {
        path: std::path::PathBuf,
        #[source]
        source: RegistryError,
    },
}

pub fn load_registry(path: &Path) -> Result<Registry, RegistryLoadError> {
    let entries: Vec<RegistryEntry> = load_json(path)?;
    Registry::new(entries).map_err(|source| RegistryLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `{ "<output_field>": [...] }` atomically.
pub fn save_joined(path: &Path, outcome: &JoinOutcome, output_field: &str) -> Result<(), PersistError> {
    write_json_atomic(path, &outcome.to_document(output_field))
}

/// Write the unmatched names, one per line, in report order.
pub fn save_unmatched_report(path: &Path, names: &[String]) -> Result<(), PersistError> {
    let mut text = names.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    write_text_atomic(path, &text)
}
