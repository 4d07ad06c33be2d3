//! Embedded Next.js page data (`<script id="__NEXT_DATA__">`).
//!
//! Server-rendered catalog pages ship their first page of results inline.
//! The crawler's response filter can be pointed at `/props/pageProps/...` of
//! this document to read it without a rendering session.

use scraper::{Html, Selector};
use serde_json::Value;

pub const NEXT_DATA_MARKER: &str = "__NEXT_DATA__";

/// Cheap textual probe; true for any mention of the marker.
pub fn has_next_data(html: &str) -> bool {
    html.contains(NEXT_DATA_MARKER)
}

/// Parse the JSON payload of `script#__NEXT_DATA__`.
pub fn extract_next_data(html: &str) -> Option<Value> {
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let doc = Html::parse_document(html);
    let script = doc.select(&selector).next()?;
    let text: String = script.text().collect();
    match serde_json::from_str(text.trim()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(error = %e, "__NEXT_DATA__ script is not valid json");
            None
        }
    }
}
