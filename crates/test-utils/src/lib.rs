//! Shared helpers for pagewatch's integration tests.

pub mod builders;
pub mod fake_dispatcher;
pub mod harness;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use pagewatch::logging::LOG_ENV;
use tracing_subscriber::EnvFilter;

/// Upper bound for any single test future.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a per-test log writer once per test binary.
///
/// Reads the same `PAGEWATCH_LOG` directives as the binary and defaults to
/// debug for pagewatch itself; output only shows for failing tests unless
/// run with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("warn,pagewatch=debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_of(TEST_TIMEOUT, f).await
}

pub async fn with_timeout_of<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(out) => out,
        Err(_) => panic!("test future did not finish within {limit:?}"),
    }
}
