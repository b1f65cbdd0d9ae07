//! Logging utilities
//!
//! Subscriber setup for applications embedding the client, plus helpers
//! that keep response bodies in logs short

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Longest body excerpt written to logs
pub const BODY_PREVIEW_LEN: usize = 200;

/// Install a global `tracing` subscriber.
///
/// Fails if the filter directive is invalid or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log filter: {}", config.level))?;

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.is_json() {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} chars truncated)", &s[..end], s.len() - end)
}

/// Printable excerpt of a response body
pub fn body_preview(body: &[u8]) -> String {
    if body.is_empty() {
        return "<empty body>".to_string();
    }
    truncate_content(&String::from_utf8_lossy(body), BODY_PREVIEW_LEN)
}
