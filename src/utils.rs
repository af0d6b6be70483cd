//! Utility helpers: delivered-file-name sanitization and Telegram API
//! retries.
//!
//! Regex patterns use the `lazy-regex` crate, so they are validated at
//! compile time and initialized on first use.

// lazy_regex! uses once_cell internally; the pattern is validated at
// compile time.
#![allow(clippy::non_std_lazy_statics)]

use anyhow::Result;
use lazy_regex::lazy_regex;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Match every character that may not appear in a delivered file name:
/// anything outside word characters, whitespace, dot and hyphen.
static RE_UNSAFE_NAME_CHAR: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"[^\w\s.-]");

/// Replace characters unsafe for a delivered file name with `_`.
///
/// Word characters are Unicode-aware, so names with Cyrillic (or any
/// other script) survive untouched.
///
/// # Examples
///
/// ```
/// use xlsxify_bot::utils::sanitize_file_name;
/// assert_eq!(sanitize_file_name("weird name!@#.xlsx"), "weird name___.xlsx");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    RE_UNSAFE_NAME_CHAR.replace_all(name, "_").to_string()
}

/// Retry a Telegram API operation with exponential backoff.
///
/// Designed for transient network failures around file transfer
/// (`get_file` + `download_file`, `send_document`). The strategy uses
/// jitter to avoid thundering herd; bounds live as constants in
/// `config.rs`.
///
/// # Errors
///
/// Returns the last error if all attempts fail.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_punctuation() {
        assert_eq!(
            sanitize_file_name("weird name!@#.xlsx"),
            "weird name___.xlsx"
        );
        assert_eq!(sanitize_file_name("a/b\\c.xlsx"), "a_b_c.xlsx");
        assert_eq!(sanitize_file_name("q?*|<>.xlsx"), "q_____.xlsx");
    }

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_file_name("report-2024.v2.xlsx"), "report-2024.v2.xlsx");
        assert_eq!(sanitize_file_name("photo.xlsx"), "photo.xlsx");
    }

    #[test]
    fn test_sanitize_keeps_unicode_word_characters() {
        assert_eq!(sanitize_file_name("отчёт за май.xlsx"), "отчёт за май.xlsx");
    }

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let mut calls = 0u32;
        let result: Result<u32> = retry_telegram_operation(|| {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt < 2 {
                    Err(anyhow::anyhow!("transient"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.ok(), Some(2));
    }
}
