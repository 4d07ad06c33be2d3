//! Best-effort logo discovery for registry entries.
//!
//! Looks through a homepage for the usual logo markup and resolves the first
//! hit against the page URL. This is a heuristic: plenty of sites put their
//! logo in CSS or inline SVG without a `src`, and those come back as `None`.

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

/// Tried in order; the first selector with a usable image URL wins.
pub const LOGO_SELECTORS: &[&str] = &[
    r#"img[src*="logo"]"#,
    r#"img[alt*="logo"]"#,
    r#"img[class*="logo"]"#,
    r#"a[class*="logo"] img"#,
    "header img",
    r#"svg[class*="logo"]"#,
];

/// Fetches page markup. The CLI backs this with an HTTP client; tests use fixtures.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> Result<String, String>;
}

pub fn find_logo(page_url: &Url, html: &str) -> Option<Url> {
    let doc = Html::parse_document(html);
    for sel in LOGO_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        let Some(el) = doc.select(&selector).next() else {
            continue;
        };
        let src = el
            .value()
            .attr("src")
            .or_else(|| el.value().attr("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(src) = src {
            if let Ok(url) = page_url.join(src) {
                return Some(url);
            }
        }
    }
    None
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoSummary {
    /// Entries that already had an absolute logo URL.
    pub kept: usize,
    pub found: usize,
    /// Entries left with `logo: null` (no homepage, fetch failure, or no hit).
    pub missing: usize,
}

/// Fill in `logo` for every entry that lacks an absolute one.
///
/// Entries are JSON objects with `name`, optional `homepage` and `logo`.
/// Failures never abort the pass; the entry just ends up with `logo: null`.
pub fn enrich_logos(entries: &mut [Value], fetcher: &dyn PageFetcher) -> LogoSummary {
    let mut summary = LogoSummary::default();

    for entry in entries.iter_mut() {
        let Some(obj) = entry.as_object_mut() else {
            continue;
        };
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();

        let has_logo = obj
            .get("logo")
            .and_then(Value::as_str)
            .map(|s| s.starts_with("http"))
            .unwrap_or(false);
        if has_logo {
            tracing::debug!(%name, "logo already present");
            summary.kept += 1;
            continue;
        }

        let homepage = obj
            .get("homepage")
            .and_then(Value::as_str)
            .filter(|s| s.starts_with("http"))
            .and_then(|s| Url::parse(s).ok());

        let logo = match homepage {
            None => {
                tracing::warn!(%name, "skipping entry without a valid homepage");
                None
            }
            Some(home) => match fetcher.fetch(&home) {
                Ok(html) => {
                    let found = find_logo(&home, &html);
                    if found.is_none() {
                        tracing::info!(%name, url = %home, "no logo matched the known selectors");
                    }
                    found
                }
                Err(e) => {
                    tracing::warn!(%name, url = %home, error = %e, "failed to fetch homepage");
                    None
                }
            },
        };

        match logo {
            Some(url) => {
                tracing::info!(%name, logo = %url, "found logo");
                obj.insert("logo".to_string(), Value::String(url.to_string()));
                summary.found += 1;
            }
            None => {
                obj.insert("logo".to_string(), Value::Null);
                summary.missing += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct Fixtures(HashMap<String, Result<String, String>>);

    impl PageFetcher for Fixtures {
        fn fetch(&self, url: &Url) -> Result<String, String> {
            self.0
                .get(url.as_str())
                .cloned()
                .unwrap_or_else(|| Err("not found".to_string()))
        }
    }

    fn base() -> Url {
        Url::parse("https://www.uw.edu.pl/en/").unwrap()
    }

    #[test]
    fn resolves_relative_logo_src() {
        let html = r#"<html><body><img src="/static/uw-logo.svg"></body></html>"#;
        assert_eq!(
            find_logo(&base(), html).unwrap().as_str(),
            "https://www.uw.edu.pl/static/uw-logo.svg"
        );
    }

    #[test]
    fn selector_order_is_respected() {
        let html = r#"
            <header><img src="banner.jpg"></header>
            <img class="site-logo" data-src="lazy.png">
        "#;
        // `img[class*=logo]` is tried before `header img`.
        assert_eq!(
            find_logo(&base(), html).unwrap().as_str(),
            "https://www.uw.edu.pl/en/lazy.png"
        );
    }

    #[test]
    fn element_without_source_falls_through() {
        let html = r#"<img alt="logo"><header><img src="/h.png"></header>"#;
        assert_eq!(
            find_logo(&base(), html).unwrap().as_str(),
            "https://www.uw.edu.pl/h.png"
        );
    }

    #[test]
    fn inline_svg_has_no_url() {
        let html = r#"<svg class="logo"><path d="M0 0"/></svg>"#;
        assert!(find_logo(&base(), html).is_none());
    }

    #[test]
    fn enrich_fills_found_and_nulls_missing() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://a.example/".to_string(),
            Ok(r#"<a class="logo" href="/"><img src="a.png"></a>"#.to_string()),
        );
        pages.insert("https://b.example/".to_string(), Err("timeout".to_string()));
        let fetcher = Fixtures(pages);

        let mut entries = vec![
            json!({"id": 1, "name": "A", "homepage": "https://a.example/"}),
            json!({"id": 2, "name": "B", "homepage": "https://b.example/", "logo": "relative.png"}),
            json!({"id": 3, "name": "C", "homepage": "ftp://c.example/"}),
            json!({"id": 4, "name": "D", "homepage": "https://d.example/", "logo": "https://cdn/d.png"}),
        ];
        let summary = enrich_logos(&mut entries, &fetcher);

        assert_eq!(summary, LogoSummary { kept: 1, found: 1, missing: 2 });
        assert_eq!(entries[0]["logo"], "https://a.example/a.png");
        assert_eq!(entries[1]["logo"], Value::Null);
        assert_eq!(entries[2]["logo"], Value::Null);
        assert_eq!(entries[3]["logo"], "https://cdn/d.png");
    }
}
