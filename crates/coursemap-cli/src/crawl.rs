//! `coursemap crawl`: drive a scroll crawl and persist the deduplicated records.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use coursemap_crawl::{
    store, CrawlConfig, CrawlReport, RecordingSession, RenderSession, ReplaySession, ScrollCrawler,
    DEFAULT_RESULTS_POINTER,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_START_URL: &str = "https://www.educations.com/study-in-poland";

#[derive(Args)]
pub struct CrawlArgs {
    /// Replay a recorded session (JSON Lines of capture frames) instead of
    /// opening the live page.
    #[arg(long)]
    capture: Option<PathBuf>,

    /// Catalog start page. Replays default to the URL stored in the capture.
    #[arg(long)]
    start_url: Option<String>,

    /// Also write what the session observed as a replayable capture.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Show the browser window during a live crawl.
    #[cfg(feature = "live")]
    #[arg(long)]
    show_browser: bool,

    /// Output record file.
    #[arg(short, long, default_value = "courses.json")]
    out: PathBuf,

    /// JSON pointer to the result array inside intercepted responses.
    #[arg(long, default_value = DEFAULT_RESULTS_POINTER)]
    results_pointer: String,

    /// Page-load budget in seconds.
    #[arg(long, default_value_t = 60)]
    navigation_timeout_secs: u64,

    /// Network quiescence wait per growth cycle, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    quiescence_timeout_ms: u64,

    /// Pause after quiescence for client-side rendering, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Stop after this many consecutive cycles with no new records.
    #[arg(long, default_value_t = 3)]
    stall_cycles: usize,

    /// Hard cap on growth cycles.
    #[arg(long, default_value_t = 500)]
    max_cycles: usize,

    /// Overall crawl deadline in seconds (0 = none).
    #[arg(long, default_value_t = 1800)]
    deadline_secs: u64,

    /// Write the output file even when nothing was collected.
    #[arg(long)]
    allow_empty: bool,
}

impl CrawlArgs {
    fn config(&self, start_url: &str) -> Result<CrawlConfig> {
        let start_url = Url::parse(start_url.trim())
            .with_context(|| format!("invalid start URL: {start_url}"))?;
        let mut config = CrawlConfig::new(start_url);
        config.navigation_timeout = Duration::from_secs(self.navigation_timeout_secs);
        config.quiescence_timeout = Duration::from_millis(self.quiescence_timeout_ms);
        config.settle_interval = Duration::from_millis(self.settle_ms);
        config.stall_cycles = self.stall_cycles;
        config.max_cycles = self.max_cycles;
        config.deadline = (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs));
        config.results_pointer = self.results_pointer.clone();
        Ok(config)
    }
}

pub fn cmd_crawl(args: CrawlArgs) -> Result<()> {
    let report = match &args.capture {
        Some(path) => crawl_capture(path, &args)?,
        None => crawl_live(&args)?,
    };

    println!(
        "  {} cycles={} records={} timeouts={} ({})",
        "→".yellow(),
        report.cycles,
        report.records.len(),
        report.timeouts,
        report.stop_reason
    );

    if report.records.is_empty() && !args.allow_empty {
        return Err(anyhow!(
            "no records were collected; nothing written (use --allow-empty to write an empty file)"
        ));
    }

    store::save_records(&args.out, &report.records)?;
    println!("  {} {}", "→".cyan(), args.out.display());
    Ok(())
}

fn crawl_capture(path: &Path, args: &CrawlArgs) -> Result<CrawlReport> {
    let file =
        File::open(path).with_context(|| format!("failed to open capture: {}", path.display()))?;
    let session = ReplaySession::from_jsonl(BufReader::new(file))
        .with_context(|| format!("failed to load capture: {}", path.display()))?;
    tracing::debug!(
        frames = session.remaining_frames(),
        recorded_url = session.recorded_url().unwrap_or("-"),
        "loaded capture"
    );

    let start_url = args
        .start_url
        .as_deref()
        .or(session.recorded_url())
        .unwrap_or(DEFAULT_START_URL)
        .to_string();
    let config = args.config(&start_url)?;
    crawl_with(session, config, &format!("capture={}", path.display()), args)
}

#[cfg(feature = "live")]
fn crawl_live(args: &CrawlArgs) -> Result<CrawlReport> {
    use coursemap_crawl::{LiveOptions, LiveSession};

    let config = args.config(args.start_url.as_deref().unwrap_or(DEFAULT_START_URL))?;
    let defaults = LiveOptions::default();
    let options = LiveOptions {
        headless: !args.show_browser,
        browser_idle_timeout: defaults
            .browser_idle_timeout
            .max(config.navigation_timeout * 2),
        ..defaults
    };
    let session = LiveSession::launch(options).context("failed to start headless Chrome")?;
    crawl_with(session, config, "live", args)
}

#[cfg(not(feature = "live"))]
fn crawl_live(_args: &CrawlArgs) -> Result<CrawlReport> {
    Err(anyhow!(
        "no --capture given and this build has no live browser backend (rebuild with `--features live`)"
    ))
}

fn crawl_with<S: RenderSession>(
    session: S,
    config: CrawlConfig,
    source: &str,
    args: &CrawlArgs,
) -> Result<CrawlReport> {
    println!(
        "{} start={} {} stall_cycles={} max_cycles={}",
        "Crawl".green().bold(),
        config.start_url,
        source,
        config.stall_cycles,
        config.max_cycles
    );

    let Some(record_path) = &args.record else {
        return Ok(ScrollCrawler::new(session, config).run()?);
    };

    let mut crawler = ScrollCrawler::new(RecordingSession::new(session), config);
    let outcome = crawler.run();
    let frames = crawler.into_session().frames();
    if !frames.is_empty() {
        store::write_capture(record_path, &frames)?;
        println!(
            "  {} capture {} ({} frames)",
            "→".cyan(),
            record_path.display(),
            frames.len()
        );
    }
    Ok(outcome?)
}
