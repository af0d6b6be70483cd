//! Telegram bot that turns user uploads into `.xlsx` spreadsheets.
//!
//! Accepts `.jpg`, `.jpeg`, `.xls`, `.docx` and `.bmp` files (and bare
//! photos), converts each to an Excel workbook and replies with the
//! result.

/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// File-to-`.xlsx` conversion engine
pub mod conversion;
pub mod utils;
