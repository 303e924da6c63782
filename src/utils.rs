//! Utility functions for text shaping, HTML text extraction and retry backoff.
//!
//! - Character-safe truncation for descriptions and log previews
//! - Whitespace-normalised text extraction from `scraper` elements
//! - Exponential backoff with jitter for the update polling loop

use rand::{Rng, rng};
use scraper::ElementRef;
use std::time::Duration;

/// Initial delay after the first consecutive failure.
const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Upper bound for the exponential part of the delay.
const BACKOFF_MAX: Duration = Duration::from_secs(30);
/// Upper bound for the random jitter added on top, in milliseconds.
const BACKOFF_JITTER_MS: u64 = 250;

/// Keep at most `max` characters (Unicode scalar values) of `s`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("Зенит", 3), "Зен");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number of
/// dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        kept
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Visible text of an element: text nodes trimmed, empty ones dropped, the rest
/// joined with single spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Delay before the next attempt after `attempt` consecutive failures (1-based).
///
/// ```text
/// delay = min(1s * 2^(attempt-1), 30s) + random_jitter(0..=250ms)
/// ```
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let delay = BACKOFF_BASE.saturating_mul(1 << exp).min(BACKOFF_MAX);
    let jitter_ms: u64 = rng().random_range(0..=BACKOFF_JITTER_MS);
    delay + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        let s = "Ф".repeat(500);
        let out = truncate_chars(&s, 400);
        assert_eq!(out.chars().count(), 400);
        assert_eq!(out.len(), 800);
    }

    #[test]
    fn test_truncate_chars_short_string_untouched() {
        assert_eq!(truncate_chars("гол", 400), "гол");
        assert_eq!(truncate_chars("", 400), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("матч", 2);
        assert_eq!(result, "ма…(+4 bytes)");
    }

    #[test]
    fn test_element_text_joins_with_spaces() {
        let html = Html::parse_fragment("<div>  Первый <b>тайм</b>\n\n<i> закончился </i></div>");
        let sel = Selector::parse("div").unwrap();
        let el = html.select(&sel).next().unwrap();
        assert_eq!(element_text(el), "Первый тайм закончился");
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let first = backoff_delay(1);
        assert!(first >= Duration::from_secs(1) && first <= Duration::from_millis(1250));

        let third = backoff_delay(3);
        assert!(third >= Duration::from_secs(4) && third <= Duration::from_millis(4250));

        let late = backoff_delay(40);
        assert!(late >= Duration::from_secs(30) && late <= Duration::from_millis(30250));
    }
}
