// src/fetch/mock.rs

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{FetchFuture, Fetcher};
use crate::errors::FetchError;

type Scripted = Result<String, FetchError>;

#[derive(Debug, Clone, Default)]
struct MockPage {
    /// One-shot responses, consumed front to back.
    queued: VecDeque<Scripted>,
    /// Returned whenever the queue is empty.
    sticky: Option<Scripted>,
    delay: Duration,
    calls: usize,
}

/// Scripted in-memory fetcher.
///
/// Each locator has an optional queue of one-shot responses, a sticky
/// response used once the queue is drained, and an artificial delay applied
/// before the response is returned. Unknown locators fail with a transport
/// error.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<String, MockPage>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `locator` from now on (clears queued responses).
    pub fn set_page(&self, locator: &str, body: impl Into<String>) {
        self.with_page(locator, |page| {
            page.queued.clear();
            page.sticky = Some(Ok(body.into()));
        });
    }

    /// Fail every fetch of `locator` with `err` from now on.
    pub fn set_failure(&self, locator: &str, err: FetchError) {
        self.with_page(locator, |page| {
            page.queued.clear();
            page.sticky = Some(Err(err));
        });
    }

    /// Queue a single response for the next fetch of `locator`.
    pub fn push_response(&self, locator: &str, response: Scripted) {
        self.with_page(locator, |page| page.queued.push_back(response));
    }

    pub fn set_delay(&self, locator: &str, delay: Duration) {
        self.with_page(locator, |page| page.delay = delay);
    }

    /// Number of fetches started for `locator`.
    pub fn calls(&self, locator: &str) -> usize {
        self.lock().get(locator).map(|p| p.calls).unwrap_or(0)
    }

    fn with_page(&self, locator: &str, f: impl FnOnce(&mut MockPage)) {
        let mut pages = self.lock();
        f(pages.entry(locator.to_string()).or_default());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MockPage>> {
        self.pages.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn next_response(&self, locator: &str) -> (Duration, Scripted) {
        let mut pages = self.lock();
        let Some(page) = pages.get_mut(locator) else {
            return (
                Duration::ZERO,
                Err(FetchError::Transport {
                    locator: locator.to_string(),
                    message: "no mock response registered".to_string(),
                }),
            );
        };

        page.calls += 1;
        let response = match page.queued.pop_front() {
            Some(r) => r,
            None => page.sticky.clone().unwrap_or_else(|| {
                Err(FetchError::Transport {
                    locator: locator.to_string(),
                    message: "mock responses exhausted".to_string(),
                })
            }),
        };
        (page.delay, response)
    }
}

impl Fetcher for MockFetcher {
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let (delay, response) = self.next_response(locator);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            response
        })
    }
}
