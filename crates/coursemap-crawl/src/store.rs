//! JSON persistence for crawl artifacts.
//!
//! Writes go to a temp file in the destination directory and are renamed into
//! place, so a failed run never leaves a truncated artifact behind.

use crate::record::Record;
use crate::replay::CaptureFrame;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize output for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, value).map_err(|source| PersistError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        w.write_all(b"\n").map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Atomically replace `path` with `text`.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<(), PersistError> {
    write_atomic(path, |w| {
        w.write_all(text.as_bytes()).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Write through a temp file in the destination directory, then rename it
/// over `path`. The temp file is removed if `fill` fails.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut BufWriter<&fs::File>) -> Result<(), PersistError>,
{
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_err)?;

    let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        fill(&mut w)?;
        w.flush().map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Persist crawled records as a JSON array.
pub fn save_records(path: &Path, records: &[Record]) -> Result<(), PersistError> {
    write_json_atomic(path, records)
}

/// Persist capture frames as JSON Lines, the layout
/// [`ReplaySession::from_jsonl`](crate::ReplaySession::from_jsonl) reads.
pub fn write_capture(path: &Path, frames: &[CaptureFrame]) -> Result<(), PersistError> {
    write_atomic(path, |w| {
        for frame in frames {
            serde_json::to_writer(&mut *w, frame).map_err(|source| PersistError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
            w.write_all(b"\n").map_err(|source| PersistError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    })
}

/// Load a record file as raw payloads (entries without an `id` are kept).
pub fn load_record_payloads(path: &Path) -> Result<Vec<Value>, LoadError> {
    load_json(path)
}
