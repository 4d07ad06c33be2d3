//! Rendering-session contract.
//!
//! The crawler does not drive a browser itself. It talks to a
//! [`RenderSession`], a page-rendering and network-observation service that
//! provides four things:
//!
//! 1. navigate to a URL and wait for the content-loaded signal,
//! 2. deliver every completed network exchange to a registered handler,
//! 3. report the rendered extent and extend the surface (scroll to bottom),
//! 4. wait for network quiescence with a timeout.
//!
//! Handlers run synchronously inside session calls, so an exchange is fully
//! absorbed before the call that observed it returns. A session that observes
//! exchanges on another thread must still deliver them before returning from
//! `extend`/`wait_for_quiescence`.

use crate::filter::Exchange;
use std::time::Duration;
use url::Url;

/// Callback invoked once per completed exchange.
pub type ExchangeHandler = Box<dyn FnMut(&Exchange) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiescence {
    /// No network activity for the session's idle window.
    Idle,
    /// The timeout elapsed with requests still in flight.
    TimedOut,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to start rendering backend: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },
    #[error("page evaluation failed: {0}")]
    Evaluate(String),
    #[error("session closed")]
    Closed,
}

pub trait RenderSession {
    /// Register the exchange handler. Replaces any previous handler.
    fn on_exchange(&mut self, handler: ExchangeHandler);

    /// Load `url` and wait for the content-loaded signal.
    fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), SessionError>;

    /// Current content extent (document height or equivalent).
    fn extent(&mut self) -> Result<u64, SessionError>;

    /// Ask the surface to grow (scroll-to-bottom equivalent).
    fn extend(&mut self) -> Result<(), SessionError>;

    /// Wait until the network goes quiet, or `timeout` elapses.
    fn wait_for_quiescence(&mut self, timeout: Duration) -> Result<Quiescence, SessionError>;
}
