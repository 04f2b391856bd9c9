// src/fetch/http.rs

use std::time::Duration;

use tracing::debug;

use super::{FetchFuture, Fetcher};
use crate::errors::{FetchError, Result};

/// Fetcher backed by a shared `reqwest::Client`.
///
/// Every request is a plain GET bounded by `timeout`. Any non-2xx status is a
/// failure; no status code gets special treatment.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Self::client_builder(timeout, user_agent)
            .build()
            .map_err(anyhow::Error::from)?;
        Ok(Self::from_client(client, timeout))
    }

    /// Client settings used by [`HttpFetcher::new`], for callers that need to
    /// tweak them (e.g. disable proxies) before building.
    pub fn client_builder(timeout: Duration, user_agent: &str) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
    }

    /// `timeout` is only used to label [`FetchError::Timeout`]; the client
    /// must enforce it itself.
    pub fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn get(&self, locator: &str) -> std::result::Result<String, FetchError> {
        debug!(%locator, "fetching");

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| self.classify(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                locator: locator.to_string(),
                status: status.as_u16(),
            });
        }

        // Decoded with the charset from Content-Type (UTF-8 if none).
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.timed_out(locator)
            } else {
                FetchError::Body {
                    locator: locator.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn classify(&self, locator: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            self.timed_out(locator)
        } else {
            FetchError::Transport {
                locator: locator.to_string(),
                message: err.to_string(),
            }
        }
    }

    fn timed_out(&self, locator: &str) -> FetchError {
        FetchError::Timeout {
            locator: locator.to_string(),
            after: self.timeout,
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a> {
        Box::pin(self.get(locator))
    }
}
