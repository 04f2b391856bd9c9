// src/logging.rs

//! Log output for `pagewatch`.
//!
//! The filter is an [`EnvFilter`], so `PAGEWATCH_LOG` accepts full directive
//! lists such as `info,pagewatch::recorder=debug` to follow individual check
//! cycles without drowning in reqwest/hyper output. `--log-level` overrides
//! the variable and applies to pagewatch's own targets only.
//!
//! Everything goes to stderr; `list` and `history` print results on stdout.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "PAGEWATCH_LOG";

/// Our own targets at info, dependencies only when they warn.
const DEFAULT_DIRECTIVES: &str = "warn,pagewatch=info";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(format!("warn,pagewatch={}", directive(level))));
    }

    match env.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} directives {directives:?}")),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVES)),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
