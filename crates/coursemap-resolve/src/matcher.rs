//! Containment-based fuzzy matching against the registry.
//!
//! Conservative on purpose: the first registry entry (in load order) whose
//! normalized name contains, or is contained in, the normalized input wins.
//! No scoring and no best-of-N selection. Short registry names can therefore
//! capture unrelated longer inputs; see the adversarial tests below.
//!
//! An empty normalized name (e.g. "University of Science and Technology")
//! never matches anything, since the empty string is contained in every name.

use crate::normalize::normalize_name;
use crate::registry::{EntityId, Registry, RegistryEntry};

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'r> {
    Matched(&'r RegistryEntry),
    Unmatched { name: String },
}

impl<'r> MatchResult<'r> {
    pub fn entity_id(&self) -> Option<&'r EntityId> {
        match self {
            MatchResult::Matched(e) => Some(&e.id),
            MatchResult::Unmatched { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher<'r> {
    registry: &'r Registry,
}

impl<'r> FuzzyMatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, name: &str) -> MatchResult<'r> {
        match self.find(&normalize_name(name)) {
            Some(entry) => MatchResult::Matched(entry),
            None => MatchResult::Unmatched {
                name: name.to_string(),
            },
        }
    }

    /// Match an already-normalized name.
    pub fn find(&self, normalized: &str) -> Option<&'r RegistryEntry> {
        if normalized.is_empty() {
            return None;
        }
        self.registry
            .iter_normalized()
            .find(|(_, candidate)| {
                !candidate.is_empty()
                    && (normalized.contains(candidate) || candidate.contains(normalized))
            })
            .map(|(entry, _)| entry)
    }
}
