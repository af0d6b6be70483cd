//! Configuration and settings management
//!
//! Loads settings from environment variables and defines bot constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Tesseract language code used when recognizing image text
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the Telegram token
    /// is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Optional file sources, least to most specific
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Prefixed environment, e.g. APP_TELEGRAM_TOKEN
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain environment variables; UPPER_SNAKE_CASE maps to
            // snake_case and empty values count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

// Telegram file transfer configuration
/// Initial backoff for Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for a single retry backoff
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4_000;
/// Retry attempts for Telegram file operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Largest document accepted for conversion (the Bot API refuses to
/// serve larger files to bots)
pub const MAX_FILE_SIZE: u32 = 20 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Env-var scenarios share one test to avoid races between
    // parallel test threads.
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Token is picked up from the plain environment
        env::set_var("TELEGRAM_TOKEN", "dummy_token");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.ocr_language, "eng");

        // 2. OCR language override
        env::set_var("OCR_LANGUAGE", "eng+rus");

        let settings = Settings::new()?;
        assert_eq!(settings.ocr_language, "eng+rus");

        env::remove_var("OCR_LANGUAGE");

        // 3. Missing token is a hard error
        env::remove_var("TELEGRAM_TOKEN");
        assert!(Settings::new().is_err());

        Ok(())
    }
}
