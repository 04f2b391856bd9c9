// src/fetch/mod.rs

//! Retrieval of the current representation of a tracked resource.
//!
//! - [`http`] provides [`HttpFetcher`], the reqwest-backed production fetcher.
//! - [`mock`] provides [`MockFetcher`], a scripted fetcher for tests.
//!
//! A fetcher makes at most one attempt per call and reports every failure as
//! a [`FetchError`] value; retrying is left to the next scheduled sweep.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::errors::FetchError;

pub mod http;
pub mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;

/// Future returned by [`Fetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;

/// Trait abstracting how a locator's content is retrieved.
///
/// Production code uses [`HttpFetcher`]; tests can provide their own
/// implementation that never touches the network.
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch the full body behind `locator`, exactly as received.
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a>;
}
