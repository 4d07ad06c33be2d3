//! Canonical institution registry.

use crate::normalize::normalize_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Registry identifier. Registries use integer ids, but string ids are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        match id {
            EntityId::Int(n) => Value::from(n),
            EntityId::Text(s) => Value::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: EntityId,
    pub name: String,
    /// Fields the join does not interpret (homepage, logo, city, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegistryEntry {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate registry id {0}")]
    DuplicateId(EntityId),
}

/// Read-only registry with normalized names computed once at load.
///
/// Entry order is load order and is the match tie-break order.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    normalized: Vec<String>,
}

impl Registry {
    pub fn new(entries: Vec<RegistryEntry>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for e in &entries {
            if !seen.insert(&e.id) {
                return Err(RegistryError::DuplicateId(e.id.clone()));
            }
        }
        let normalized = entries.iter().map(|e| normalize_name(&e.name)).collect();
        Ok(Self {
            entries,
            normalized,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// `(entry, normalized name)` pairs in registry order.
    pub fn iter_normalized(&self) -> impl Iterator<Item = (&RegistryEntry, &str)> {
        self.entries
            .iter()
            .zip(self.normalized.iter().map(String::as_str))
    }
}
