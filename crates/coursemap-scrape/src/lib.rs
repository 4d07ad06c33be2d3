//! HTML side-scrapers
//!
//! Small, best-effort extractors that sit next to the catalog crawl:
//! - [`logo`]: homepage logo discovery for registry enrichment,
//! - [`table`]: static study-finder tables,
//! - [`next_data`]: server-rendered Next.js page data.
//!
//! These are untrusted heuristics over arbitrary markup, not contracts.

pub mod logo;
pub mod next_data;
pub mod table;

pub use logo::{enrich_logos, find_logo, LogoSummary, PageFetcher, LOGO_SELECTORS};
pub use next_data::{extract_next_data, has_next_data};
pub use table::{parse_study_table, SelectorError, StudyRow};
