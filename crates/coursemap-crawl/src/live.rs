//! Headless Chrome rendering session.
//!
//! Chrome reports responses on its own event thread. They are queued and
//! handed to the registered handler from inside `navigate` and
//! `wait_for_quiescence`, so the crawler still sees every exchange
//! synchronously. Quiescence means no response has arrived for
//! [`LiveOptions::idle_window`].

use crate::filter::Exchange;
use crate::session::{ExchangeHandler, Quiescence, RenderSession, SessionError};
use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;
use headless_chrome::protocol::cdp::Network::GetResponseBodyReturnObject;
use headless_chrome::{Browser, LaunchOptions, Tab};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

const EXTENT_SCRIPT: &str = "document.body.scrollHeight";
const EXTEND_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub headless: bool,
    /// Quiet period that counts as network quiescence.
    pub idle_window: Duration,
    /// Chrome is shut down after this long without any CDP traffic; it must
    /// exceed the longest single wait of the crawl.
    pub browser_idle_timeout: Duration,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            headless: true,
            idle_window: Duration::from_millis(500),
            browser_idle_timeout: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Default)]
struct Inbox {
    queued: Vec<Exchange>,
    last_activity: Option<Instant>,
}

pub struct LiveSession {
    _browser: Browser,
    tab: Arc<Tab>,
    options: LiveOptions,
    inbox: Arc<Mutex<Inbox>>,
    handler: Option<ExchangeHandler>,
}

impl LiveSession {
    pub fn launch(options: LiveOptions) -> Result<Self, SessionError> {
        let launch = LaunchOptions::default_builder()
            .headless(options.headless)
            .idle_browser_timeout(options.browser_idle_timeout)
            .build()
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        let browser = Browser::new(launch).map_err(|e| SessionError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let inbox = Arc::new(Mutex::new(Inbox::default()));
        let sink = Arc::clone(&inbox);
        tab.register_response_handling(
            "coursemap",
            Box::new(
                move |event: ResponseReceivedEventParams,
                      fetch_body: &dyn Fn() -> anyhow::Result<GetResponseBodyReturnObject>| {
                    let exchange = capture_exchange(&event, fetch_body);
                    let mut inbox = sink.lock();
                    inbox.queued.push(exchange);
                    inbox.last_activity = Some(Instant::now());
                },
            ),
        )
        .map_err(|e| SessionError::Launch(e.to_string()))?;

        tracing::debug!(headless = options.headless, "chrome session started");
        Ok(Self {
            _browser: browser,
            tab,
            options,
            inbox,
            handler: None,
        })
    }

    fn deliver_queued(&mut self) {
        let queued = std::mem::take(&mut self.inbox.lock().queued);
        let Some(handler) = self.handler.as_mut() else {
            return;
        };
        for exchange in &queued {
            handler(exchange);
        }
    }

    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>, SessionError> {
        self.tab
            .evaluate(script, false)
            .map(|object| object.value)
            .map_err(|e| SessionError::Evaluate(e.to_string()))
    }
}

/// Bodies are only pulled for successful JSON responses; everything else is
/// rejected by the filter on status or content type anyway.
fn capture_exchange(
    event: &ResponseReceivedEventParams,
    fetch_body: &dyn Fn() -> anyhow::Result<GetResponseBodyReturnObject>,
) -> Exchange {
    let response = &event.response;
    let status = u16::try_from(response.status).unwrap_or(0);
    let wants_body = (200..300).contains(&status) && response.mime_type.contains("json");

    let body = if wants_body {
        match fetch_body() {
            Ok(body) if !body.base_64_encoded => body.body,
            Ok(_) => {
                tracing::debug!(url = %response.url, "skipping base64-encoded body");
                String::new()
            }
            Err(e) => {
                tracing::debug!(url = %response.url, error = %e, "response body unavailable");
                String::new()
            }
        }
    } else {
        String::new()
    };

    Exchange {
        url: response.url.clone(),
        status,
        content_type: Some(response.mime_type.clone()),
        body,
    }
}

impl RenderSession for LiveSession {
    fn on_exchange(&mut self, handler: ExchangeHandler) {
        self.handler = Some(handler);
    }

    fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), SessionError> {
        let started = Instant::now();
        self.tab.set_default_timeout(timeout);
        let loaded = self
            .tab
            .navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated());
        if let Err(e) = loaded {
            if started.elapsed() >= timeout {
                return Err(SessionError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                });
            }
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            });
        }
        self.deliver_queued();
        Ok(())
    }

    fn extent(&mut self) -> Result<u64, SessionError> {
        self.evaluate(EXTENT_SCRIPT)?
            .and_then(|v| v.as_f64())
            .filter(|h| h.is_finite() && *h >= 0.0)
            .map(|h| h as u64)
            .ok_or_else(|| SessionError::Evaluate(format!("`{EXTENT_SCRIPT}` returned no number")))
    }

    fn extend(&mut self) -> Result<(), SessionError> {
        self.inbox.lock().last_activity = Some(Instant::now());
        self.evaluate(EXTEND_SCRIPT)?;
        Ok(())
    }

    fn wait_for_quiescence(&mut self, timeout: Duration) -> Result<Quiescence, SessionError> {
        let started = Instant::now();
        let outcome = loop {
            let quiet_for = self
                .inbox
                .lock()
                .last_activity
                .map_or(Duration::MAX, |t| t.elapsed());
            if quiet_for >= self.options.idle_window {
                break Quiescence::Idle;
            }
            if started.elapsed() >= timeout {
                break Quiescence::TimedOut;
            }
            thread::sleep(POLL_INTERVAL);
        };
        self.deliver_queued();
        Ok(outcome)
    }
}
