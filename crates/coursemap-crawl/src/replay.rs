//! Deterministic replay of a recorded rendering session.
//!
//! A capture is JSON Lines, one [`CaptureFrame`] per line:
//!
//! ```text
//! {"url": "https://...", "extent": 1200, "exchanges": [ ... ]} <- navigation
//! {"extent": 2400, "exchanges": [ ... ]}                       <- 1st growth
//! {"extent": 2400, "exchanges": [], "quiescence_timed_out": true}
//! ```
//!
//! Frame 0 is what the page did while loading. Every `extend` consumes the
//! next frame: the extent changes immediately and the frame's exchanges are
//! delivered during the following `wait_for_quiescence`. Once frames run out,
//! `extend` is a no-op and the extent stays at its last value, which is what a
//! fully scrolled page looks like.
//!
//! When the navigation frame records the page URL, navigating anywhere else
//! fails the same way a live page load would.

use crate::filter::Exchange;
use crate::session::{ExchangeHandler, Quiescence, RenderSession, SessionError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::BufRead;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFrame {
    /// Page URL; only meaningful on the navigation frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub extent: u64,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub quiescence_timed_out: bool,
}

impl CaptureFrame {
    pub fn new(extent: u64, exchanges: Vec<Exchange>) -> Self {
        Self {
            url: None,
            extent,
            exchanges,
            quiescence_timed_out: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to read capture: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub struct ReplaySession {
    frames: Vec<CaptureFrame>,
    cursor: usize,
    extent: u64,
    pending: VecDeque<Exchange>,
    pending_timed_out: bool,
    handler: Option<ExchangeHandler>,
    navigated: bool,
}

impl ReplaySession {
    pub fn new(frames: Vec<CaptureFrame>) -> Self {
        Self {
            frames,
            cursor: 0,
            extent: 0,
            pending: VecDeque::new(),
            pending_timed_out: false,
            handler: None,
            navigated: false,
        }
    }

    /// Parse a JSON Lines capture. Blank lines and `#` comments are ignored.
    pub fn from_jsonl<R: BufRead>(reader: R) -> Result<Self, CaptureError> {
        let mut frames = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let s = line.trim();
            if s.is_empty() || s.starts_with('#') {
                continue;
            }
            let frame = serde_json::from_str(s).map_err(|source| CaptureError::Parse {
                line: idx + 1,
                source,
            })?;
            frames.push(frame);
        }
        Ok(Self::new(frames))
    }

    /// URL the capture was recorded from, if the navigation frame names one.
    pub fn recorded_url(&self) -> Option<&str> {
        self.frames.first()?.url.as_deref()
    }

    /// Frames not yet consumed (the navigation frame counts until `navigate`).
    pub fn remaining_frames(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }

    fn deliver(&mut self, exchanges: impl IntoIterator<Item = Exchange>) {
        let Some(handler) = self.handler.as_mut() else {
            return;
        };
        for ex in exchanges {
            handler(&ex);
        }
    }
}

impl RenderSession for ReplaySession {
    fn on_exchange(&mut self, handler: ExchangeHandler) {
        self.handler = Some(handler);
    }

    fn navigate(&mut self, url: &Url, _timeout: Duration) -> Result<(), SessionError> {
        let Some(first) = self.frames.first().cloned() else {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: "capture has no navigation frame".to_string(),
            });
        };
        if let Some(recorded) = first.url.as_deref() {
            let same_page = match Url::parse(recorded) {
                Ok(recorded) => &recorded == url,
                Err(_) => recorded == url.as_str(),
            };
            if !same_page {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    message: format!("capture was recorded from {recorded}"),
                });
            }
        }
        self.cursor = 1;
        self.extent = first.extent;
        self.navigated = true;
        self.deliver(first.exchanges);
        Ok(())
    }

    fn extent(&mut self) -> Result<u64, SessionError> {
        if !self.navigated {
            return Err(SessionError::Evaluate("no page loaded".to_string()));
        }
        Ok(self.extent)
    }

    fn extend(&mut self) -> Result<(), SessionError> {
        if !self.navigated {
            return Err(SessionError::Evaluate("no page loaded".to_string()));
        }
        let Some(frame) = self.frames.get(self.cursor).cloned() else {
            return Ok(());
        };
        self.cursor += 1;
        self.extent = frame.extent;
        self.pending.extend(frame.exchanges);
        self.pending_timed_out |= frame.quiescence_timed_out;
        Ok(())
    }

    fn wait_for_quiescence(&mut self, _timeout: Duration) -> Result<Quiescence, SessionError> {
        let pending: Vec<Exchange> = self.pending.drain(..).collect();
        self.deliver(pending);
        if std::mem::take(&mut self.pending_timed_out) {
            Ok(Quiescence::TimedOut)
        } else {
            Ok(Quiescence::Idle)
        }
    }
}
