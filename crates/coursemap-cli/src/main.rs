//! Coursemap CLI
//!
//! Command-line interface for:
//! - crawling a catalog listing into a deduplicated `courses.json`,
//! - joining crawled courses against the university registry,
//! - registry logo enrichment and the static study-finder scraper.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod crawl;
mod join;
mod scrape;

#[derive(Parser)]
#[command(name = "coursemap")]
#[command(author, version, about = "Coursemap: catalog crawling and university joins")]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a catalog listing from a recorded session capture → `courses.json`.
    Crawl(crawl::CrawlArgs),

    /// Join crawled courses against the university registry.
    Join(join::JoinArgs),

    /// Discover homepage logos for registry entries that lack one.
    Logos {
        /// Registry JSON (array of universities with `homepage`).
        #[arg(long, default_value = "assets/data/universities.json")]
        registry: PathBuf,
        /// Output path (defaults to rewriting the registry in place).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Per-request timeout in seconds.
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },

    /// Scrape a saved study-finder page table → JSON rows.
    Table {
        #[arg(long, default_value = "studyfinder.html")]
        input: PathBuf,
        #[arg(short, long, default_value = "courses_scraped.json")]
        out: PathBuf,
    },

    /// Check a saved page for embedded `__NEXT_DATA__` results.
    NextData {
        #[arg(long, default_value = "educations_complete.html")]
        input: PathBuf,
        /// Results pointer inside the embedded document.
        #[arg(long, default_value = "/props/pageProps/data/searchResult/results")]
        results_pointer: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Crawl(args) => crawl::cmd_crawl(args),
        Commands::Join(args) => join::cmd_join(args),
        Commands::Logos {
            registry,
            out,
            timeout_secs,
        } => scrape::cmd_logos(&registry, out.as_deref(), timeout_secs),
        Commands::Table { input, out } => scrape::cmd_table(&input, &out),
        Commands::NextData {
            input,
            results_pointer,
        } => scrape::cmd_next_data(&input, &results_pointer),
    }
}
