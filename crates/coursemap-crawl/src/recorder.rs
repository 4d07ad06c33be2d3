//! Capture recording.
//!
//! [`RecordingSession`] wraps any [`RenderSession`] and writes down what it
//! observed in the frame layout [`ReplaySession`](crate::ReplaySession) reads
//! back: the navigation frame carries the page URL and everything seen while
//! loading, and every `extend` opens a new frame that collects the exchanges
//! of that growth cycle and the extent measured after it.

use crate::filter::Exchange;
use crate::replay::CaptureFrame;
use crate::session::{ExchangeHandler, Quiescence, RenderSession, SessionError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct RecordingSession<S> {
    inner: S,
    frames: Arc<Mutex<Vec<CaptureFrame>>>,
}

impl<S: RenderSession> RecordingSession<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Frames recorded so far.
    pub fn frames(&self) -> Vec<CaptureFrame> {
        self.frames.lock().clone()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RenderSession> RenderSession for RecordingSession<S> {
    fn on_exchange(&mut self, mut handler: ExchangeHandler) {
        let frames = Arc::clone(&self.frames);
        self.inner.on_exchange(Box::new(move |exchange: &Exchange| {
            if let Some(frame) = frames.lock().last_mut() {
                frame.exchanges.push(exchange.clone());
            }
            handler(exchange);
        }));
    }

    fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), SessionError> {
        {
            let mut frames = self.frames.lock();
            frames.clear();
            let mut frame = CaptureFrame::new(0, Vec::new());
            frame.url = Some(url.to_string());
            frames.push(frame);
        }
        self.inner.navigate(url, timeout)
    }

    fn extent(&mut self) -> Result<u64, SessionError> {
        let extent = self.inner.extent()?;
        if let Some(frame) = self.frames.lock().last_mut() {
            frame.extent = extent;
        }
        Ok(extent)
    }

    fn extend(&mut self) -> Result<(), SessionError> {
        {
            let mut frames = self.frames.lock();
            let carried = frames.last().map_or(0, |f| f.extent);
            frames.push(CaptureFrame::new(carried, Vec::new()));
        }
        self.inner.extend()
    }

    fn wait_for_quiescence(&mut self, timeout: Duration) -> Result<Quiescence, SessionError> {
        let outcome = self.inner.wait_for_quiescence(timeout)?;
        if outcome == Quiescence::TimedOut {
            if let Some(frame) = self.frames.lock().last_mut() {
                frame.quiescence_timed_out = true;
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlConfig, ScrollCrawler};
    use crate::replay::ReplaySession;
    use serde_json::json;

    fn page(ids: &[&str]) -> Exchange {
        let results: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        Exchange::json(
            "https://catalog.example/_next/data/list.json",
            json!({"pageProps": {"data": {"searchResult": {"results": results}}}}).to_string(),
        )
    }

    fn config() -> CrawlConfig {
        let mut c = CrawlConfig::new(Url::parse("https://catalog.example/list").unwrap());
        c.settle_interval = Duration::ZERO;
        c
    }

    #[test]
    fn recorded_capture_replays_to_the_same_crawl() {
        let mut slow = CaptureFrame::new(200, vec![page(&["c", "b"])]);
        slow.quiescence_timed_out = true;
        let source = ReplaySession::new(vec![
            CaptureFrame::new(100, vec![page(&["a", "b"])]),
            slow,
            CaptureFrame::new(300, vec![page(&["d"])]),
            CaptureFrame::new(300, vec![]),
        ]);

        let mut crawler = ScrollCrawler::new(RecordingSession::new(source), config());
        let first = crawler.run().unwrap();
        let frames = crawler.into_session().frames();

        assert_eq!(frames[0].url.as_deref(), Some("https://catalog.example/list"));
        assert_eq!(frames.len(), first.cycles + 1);
        assert!(frames[1].quiescence_timed_out);

        let second = ScrollCrawler::new(ReplaySession::new(frames), config())
            .run()
            .unwrap();
        assert_eq!(second.records, first.records);
        assert_eq!(second.cycles, first.cycles);
        assert_eq!(second.stop_reason, first.stop_reason);
        assert_eq!(second.timeouts, 1);
    }
}
