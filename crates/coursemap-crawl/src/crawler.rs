//! Scroll-driven crawl loop.
//!
//! ```text
//! Navigating ──► Growing ──► Quiescing ──┬──► Done
//!                   ▲                    │
//!                   └────────────────────┘
//! ```
//!
//! Every exchange the session observes goes through the [`ResponseFilter`] and
//! into the [`DedupAccumulator`] synchronously, from inside the session call
//! that observed it. Extent is sampled only between session calls, so a cycle's
//! "before" and "after" measurements always bracket the records it absorbed.
//!
//! After each cycle the crawl stops when, in order:
//! 1. the extent did not change and the cycle absorbed nothing new,
//! 2. `stall_cycles` consecutive cycles absorbed nothing new (extent ignored),
//! 3. `max_cycles` cycles have run,
//! 4. the overall deadline has passed.
//!
//! An unchanged extent while new records keep arriving does not stop the crawl.

use crate::accumulator::DedupAccumulator;
use crate::filter::{Exchange, FilterOutcome, ResponseFilter, DEFAULT_RESULTS_POINTER};
use crate::record::Record;
use crate::session::{Quiescence, RenderSession, SessionError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: Url,
    /// Budget for the initial page load.
    pub navigation_timeout: Duration,
    /// Bounded wait for network quiescence after each growth request.
    pub quiescence_timeout: Duration,
    /// Fixed pause after quiescence for client-side rendering to catch up.
    pub settle_interval: Duration,
    /// Consecutive zero-yield cycles that end the crawl regardless of extent.
    pub stall_cycles: usize,
    pub max_cycles: usize,
    /// Overall wall-clock budget, measured from the start of navigation.
    pub deadline: Option<Duration>,
    pub results_pointer: String,
}

impl CrawlConfig {
    pub fn new(start_url: Url) -> Self {
        Self {
            start_url,
            navigation_timeout: Duration::from_secs(60),
            quiescence_timeout: Duration::from_secs(5),
            settle_interval: Duration::from_secs(1),
            stall_cycles: 3,
            max_cycles: 500,
            deadline: Some(Duration::from_secs(30 * 60)),
            results_pointer: DEFAULT_RESULTS_POINTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Navigating,
    Growing,
    Quiescing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ExtentConverged,
    Stalled,
    MaxCycles,
    Deadline,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::ExtentConverged => "extent converged",
            StopReason::Stalled => "no new records",
            StopReason::MaxCycles => "cycle cap reached",
            StopReason::Deadline => "deadline exceeded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records: Vec<Record>,
    /// Growth cycles run (navigation excluded).
    pub cycles: usize,
    pub stop_reason: StopReason,
    /// Quiescence waits that hit their timeout.
    pub timeouts: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("failed to load start page: {0}")]
    Navigation(#[source] SessionError),
    #[error("session failed during crawl: {0}")]
    Session(#[from] SessionError),
    #[error("invalid crawl config: {0}")]
    Config(String),
}

/// Drives one crawl over one rendering session.
///
/// The accumulator is owned by this crawler and lives for exactly one run;
/// after [`run`](Self::run) returns, [`state`](Self::state) reports where the
/// crawl ended and the session can be taken back with
/// [`into_session`](Self::into_session).
pub struct ScrollCrawler<S: RenderSession> {
    session: S,
    config: CrawlConfig,
    accumulator: Arc<DedupAccumulator>,
    state: CrawlState,
}

impl<S: RenderSession> ScrollCrawler<S> {
    pub fn new(session: S, config: CrawlConfig) -> Self {
        Self {
            session,
            config,
            accumulator: Arc::new(DedupAccumulator::new()),
            state: CrawlState::Navigating,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn accumulator(&self) -> &DedupAccumulator {
        &self.accumulator
    }

    pub fn into_session(self) -> S {
        self.session
    }

    fn enter(&mut self, next: CrawlState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "crawl state");
            self.state = next;
        }
    }

    /// Run the crawl to completion.
    ///
    /// Navigation failure aborts the run and no records are returned; the
    /// crawler stays in `Navigating` and may be run again. Once any growth
    /// cycle has started the crawler cannot be reused.
    pub fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        if self.state != CrawlState::Navigating || !self.accumulator.is_empty() {
            return Err(CrawlError::Config(format!(
                "crawler already ran (state {:?})",
                self.state
            )));
        }
        if self.config.stall_cycles == 0 {
            return Err(CrawlError::Config("stall_cycles must be > 0".to_string()));
        }
        if self.config.max_cycles == 0 {
            return Err(CrawlError::Config("max_cycles must be > 0".to_string()));
        }

        self.install_handler();
        let started = Instant::now();

        tracing::info!(url = %self.config.start_url, "navigating to start page");
        self.session
            .navigate(&self.config.start_url, self.config.navigation_timeout)
            .map_err(CrawlError::Navigation)?;

        let mut last_extent = self.session.extent()?;
        let mut cycles = 0usize;
        let mut idle_streak = 0usize;
        let mut timeouts = 0usize;

        let stop_reason = loop {
            self.enter(CrawlState::Growing);
            let before = self.accumulator.len();
            self.session.extend()?;

            self.enter(CrawlState::Quiescing);
            if self.session.wait_for_quiescence(self.config.quiescence_timeout)?
                == Quiescence::TimedOut
            {
                timeouts += 1;
                tracing::warn!(
                    cycle = cycles + 1,
                    timeout_ms = self.config.quiescence_timeout.as_millis() as u64,
                    "network quiescence wait timed out; assuming content is loaded"
                );
            }
            if !self.config.settle_interval.is_zero() {
                thread::sleep(self.config.settle_interval);
            }

            cycles += 1;
            let extent = self.session.extent()?;
            let fresh = self.accumulator.len() - before;
            idle_streak = if fresh == 0 { idle_streak + 1 } else { 0 };

            tracing::debug!(
                cycle = cycles,
                extent,
                last_extent,
                fresh,
                total = self.accumulator.len(),
                "growth cycle finished"
            );

            if extent == last_extent && fresh == 0 {
                break StopReason::ExtentConverged;
            }
            if idle_streak >= self.config.stall_cycles {
                break StopReason::Stalled;
            }
            if cycles >= self.config.max_cycles {
                break StopReason::MaxCycles;
            }
            if let Some(deadline) = self.config.deadline {
                if started.elapsed() >= deadline {
                    break StopReason::Deadline;
                }
            }
            last_extent = extent;
        };

        self.enter(CrawlState::Done);
        let records = self.accumulator.snapshot();
        tracing::info!(
            cycles,
            records = records.len(),
            reason = %stop_reason,
            "crawl finished"
        );

        Ok(CrawlReport {
            records,
            cycles,
            stop_reason,
            timeouts,
        })
    }

    fn install_handler(&mut self) {
        let filter = ResponseFilter::new(self.config.results_pointer.clone());
        let accumulator = Arc::clone(&self.accumulator);
        self.session.on_exchange(Box::new(move |exchange: &Exchange| {
            match filter.inspect(exchange) {
                FilterOutcome::NotApplicable(reason) => {
                    tracing::trace!(url = %exchange.url, %reason, "exchange skipped");
                }
                FilterOutcome::Records { records, skipped } => {
                    if skipped > 0 {
                        tracing::debug!(url = %exchange.url, skipped, "results without an id");
                    }
                    let fresh = accumulator.absorb(records);
                    if fresh > 0 {
                        tracing::info!(
                            fresh,
                            total = accumulator.len(),
                            "captured new records"
                        );
                    }
                }
            }
        }));
    }
}
