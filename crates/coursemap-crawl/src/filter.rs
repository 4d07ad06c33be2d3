//! Response filtering: decide whether an intercepted exchange carries a page of
//! listings, and pull the listing array out of it.
//!
//! Filtering never fails. Anything that doesn't look like a successful JSON
//! page of results is reported as [`FilterOutcome::NotApplicable`] with the
//! reason, and the crawl carries on.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where catalog pages put their result array (Next.js data routes).
pub const DEFAULT_RESULTS_POINTER: &str = "/pageProps/data/searchResult/results";

/// One observed request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl Exchange {
    /// Convenience constructor for a `200 application/json` exchange.
    pub fn json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Non-2xx status.
    Status(u16),
    /// Missing or non-JSON content type.
    ContentType,
    /// Declared JSON but the body does not parse.
    InvalidJson,
    /// Parsed, but the results pointer does not resolve to an array.
    MissingPath,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Status(s) => write!(f, "status {s}"),
            SkipReason::ContentType => f.write_str("not a json response"),
            SkipReason::InvalidJson => f.write_str("body is not valid json"),
            SkipReason::MissingPath => f.write_str("results path absent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    NotApplicable(SkipReason),
    /// The exchange carries a results page. `skipped` counts array elements
    /// that had no identity key.
    Records { records: Vec<Record>, skipped: usize },
}

impl FilterOutcome {
    /// Records carried by the exchange (empty when not applicable).
    pub fn into_records(self) -> Vec<Record> {
        match self {
            FilterOutcome::NotApplicable(_) => Vec::new(),
            FilterOutcome::Records { records, .. } => records,
        }
    }
}

/// Extracts listing records from exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFilter {
    results_pointer: String,
}

impl Default for ResponseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_POINTER)
    }
}

impl ResponseFilter {
    /// `results_pointer` is an RFC 6901 JSON pointer (`/a/b/c`).
    pub fn new(results_pointer: impl Into<String>) -> Self {
        Self {
            results_pointer: results_pointer.into(),
        }
    }

    pub fn results_pointer(&self) -> &str {
        &self.results_pointer
    }

    pub fn inspect(&self, exchange: &Exchange) -> FilterOutcome {
        if !exchange.is_success() {
            return FilterOutcome::NotApplicable(SkipReason::Status(exchange.status));
        }
        if !exchange.is_json() {
            return FilterOutcome::NotApplicable(SkipReason::ContentType);
        }
        let doc: Value = match serde_json::from_str(&exchange.body) {
            Ok(v) => v,
            Err(_) => return FilterOutcome::NotApplicable(SkipReason::InvalidJson),
        };
        self.extract_from_value(&doc)
    }

    /// Apply the results pointer to an already-parsed document.
    pub fn extract_from_value(&self, doc: &Value) -> FilterOutcome {
        let Some(Value::Array(items)) = doc.pointer(&self.results_pointer) else {
            return FilterOutcome::NotApplicable(SkipReason::MissingPath);
        };

        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0usize;
        for item in items {
            match Record::from_payload(item.clone()) {
                Some(r) => records.push(r),
                None => skipped += 1,
            }
        }
        FilterOutcome::Records { records, skipped }
    }
}
