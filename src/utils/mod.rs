//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use anyhow::{Context, Result};
use url::Url;

/// Extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let parsed = Url::parse(url).context("Invalid URL")?;

    parsed
        .host_str()
        .map(|s| s.to_string())
        .context("No host in URL")
}

/// Truncate text to a maximum length
///
/// Cuts on a character boundary so multi-byte response bodies are safe.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len.saturating_sub(3);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Round a measurement to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an elapsed duration as `H:MM:SS[.ffffff]`
///
/// Durations of a day or more get a `N day(s), ` prefix. Negative input
/// renders as zero.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let micros_total = elapsed.num_microseconds().unwrap_or(i64::MAX).max(0);

    let micros = micros_total % 1_000_000;
    let secs_total = micros_total / 1_000_000;
    let days = secs_total / 86_400;
    let hours = (secs_total % 86_400) / 3_600;
    let minutes = (secs_total % 3_600) / 60;
    let seconds = secs_total % 60;

    let mut out = String::new();
    if days > 0 {
        let unit = if days == 1 { "day" } else { "days" };
        out.push_str(&format!("{days} {unit}, "));
    }
    out.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}
