//! Institution resolution for crawled catalogs
//!
//! Joins crawled course records against a canonical university registry:
//!
//! - [`normalize`]: name canonicalization shared by both sides of a comparison.
//! - [`registry`]: the read-only join target, normalized once at load.
//! - [`matcher`]: first-containment-wins fuzzy matching.
//! - [`joiner`]: per-record resolution, foreign-key attachment, unmatched report.
//! - [`store`]: registry loading and joined-output persistence.

pub mod joiner;
pub mod matcher;
pub mod normalize;
pub mod registry;
pub mod store;

pub use joiner::{EntityJoiner, JoinOptions, JoinOutcome};
pub use matcher::{FuzzyMatcher, MatchResult};
pub use normalize::normalize_name;
pub use registry::{EntityId, Registry, RegistryEntry, RegistryError};
pub use store::{load_registry, save_joined, save_unmatched_report, RegistryLoadError};
