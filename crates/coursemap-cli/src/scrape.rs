//! Side scrapers: registry logos, study-finder tables, embedded page data.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use coursemap_crawl::store::{load_json, write_json_atomic};
use coursemap_crawl::ResponseFilter;
use coursemap_scrape::{extract_next_data, has_next_data, parse_study_table};
use serde_json::Value;
use std::fs;
use std::path::Path;

#[cfg(feature = "fetch")]
mod http {
    use anyhow::{anyhow, Result};
    use coursemap_scrape::PageFetcher;
    use reqwest::blocking::Client;
    use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
    use std::time::Duration;
    use url::Url;

    const DEFAULT_USER_AGENT: &str = "coursemap/0.3 (+https://github.com/coursemap/coursemap)";

    pub struct HttpFetcher {
        client: Client,
    }

    impl HttpFetcher {
        pub fn new(timeout_secs: u64) -> Result<Self> {
            let mut headers = HeaderMap::new();
            headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
            let client = Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| anyhow!("failed to build http client: {e}"))?;
            Ok(Self { client })
        }
    }

    impl PageFetcher for HttpFetcher {
        fn fetch(&self, url: &Url) -> Result<String, String> {
            let resp = self
                .client
                .get(url.clone())
                .send()
                .map_err(|e| format!("failed to fetch {url}: {e}"))?;
            if !resp.status().is_success() {
                return Err(format!("http status {}", resp.status()));
            }
            resp.text().map_err(|e| format!("failed to read body for {url}: {e}"))
        }
    }
}

pub fn cmd_logos(registry: &Path, out: Option<&Path>, timeout_secs: u64) -> Result<()> {
    let mut entries: Vec<Value> = load_json(registry)
        .with_context(|| format!("failed to load registry: {}", registry.display()))?;
    println!(
        "{} {} universities from {}",
        "Logos".green().bold(),
        entries.len(),
        registry.display()
    );

    #[cfg(feature = "fetch")]
    let summary = {
        let fetcher = http::HttpFetcher::new(timeout_secs)?;
        coursemap_scrape::enrich_logos(&mut entries, &fetcher)
    };
    #[cfg(not(feature = "fetch"))]
    let summary: coursemap_scrape::LogoSummary = {
        let _ = timeout_secs;
        return Err(anyhow!("logo fetching requires the `fetch` feature"));
    };

    let out = out.unwrap_or(registry);
    write_json_atomic(out, &entries)?;

    println!(
        "  {} found={} kept={} missing={}",
        "→".yellow(),
        summary.found,
        summary.kept,
        summary.missing
    );
    println!("  {} {}", "→".cyan(), out.display());
    Ok(())
}

pub fn cmd_table(input: &Path, out: &Path) -> Result<()> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("failed to read page: {}", input.display()))?;
    let rows = parse_study_table(&html)?;
    write_json_atomic(out, &rows)?;

    println!(
        "{} parsed {} courses",
        "Table".green().bold(),
        rows.len()
    );
    println!("  {} {}", "→".cyan(), out.display());
    Ok(())
}

pub fn cmd_next_data(input: &Path, results_pointer: &str) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("file not found: {}", input.display()));
    }
    let html = fs::read_to_string(input)
        .with_context(|| format!("failed to read page: {}", input.display()))?;

    if !has_next_data(&html) {
        println!("{} `__NEXT_DATA__` not found in {}", "Failure:".red().bold(), input.display());
        return Ok(());
    }
    println!("{} `__NEXT_DATA__` found in {}", "Success:".green().bold(), input.display());

    match extract_next_data(&html) {
        Some(doc) => {
            let records = ResponseFilter::new(results_pointer)
                .extract_from_value(&doc)
                .into_records();
            println!("  {} embedded records={}", "→".yellow(), records.len());
        }
        None => println!("  {} marker present but no parseable script", "→".yellow()),
    }
    Ok(())
}
