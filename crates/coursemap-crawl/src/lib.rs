//! Coursemap catalog crawling
//!
//! Collects listing records from paginated, client-rendered catalog pages:
//!
//! ```text
//!  RenderSession ──exchange──► ResponseFilter ──records──► DedupAccumulator
//!       ▲                                                        │
//!       └──── extend / wait / measure ◄──── ScrollCrawler ◄──────┘
//! ```
//!
//! - [`filter`]: decides which intercepted exchanges carry result pages.
//! - [`accumulator`]: first-seen-wins dedup by record id.
//! - [`session`]: the four-operation contract a rendering backend provides.
//! - [`replay`]: a recorded-capture backend (deterministic, used by the CLI and tests).
//! - [`recorder`]: wraps any backend and records what it saw as a replayable capture.
//! - `live` (feature `live`): a headless Chrome backend.
//! - [`crawler`]: the grow / quiesce / converge loop.
//! - [`store`]: atomic JSON persistence.

pub mod accumulator;
pub mod crawler;
pub mod filter;
#[cfg(feature = "live")]
pub mod live;
pub mod record;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod store;

pub use accumulator::DedupAccumulator;
pub use crawler::{CrawlConfig, CrawlError, CrawlReport, CrawlState, ScrollCrawler, StopReason};
pub use filter::{Exchange, FilterOutcome, ResponseFilter, SkipReason, DEFAULT_RESULTS_POINTER};
#[cfg(feature = "live")]
pub use live::{LiveOptions, LiveSession};
pub use record::{Record, RecordId};
pub use recorder::RecordingSession;
pub use replay::{CaptureError, CaptureFrame, ReplaySession};
pub use session::{ExchangeHandler, Quiescence, RenderSession, SessionError};
pub use store::{LoadError, PersistError};
