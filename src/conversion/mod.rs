//! File-to-spreadsheet conversion engine.
//!
//! Converts user-uploaded files into `.xlsx` workbooks:
//! - `.xls`: re-encoded cell by cell (first worksheet)
//! - `.jpg` / `.jpeg` / `.bmp`: recognized text, one-cell sheet
//! - `.docx`: extracted paragraph text, one-cell sheet

pub(crate) mod document;
pub(crate) mod image;
pub(crate) mod sheet;
pub(crate) mod spreadsheet;

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Input file is empty")]
    EmptyInput,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Legacy spreadsheet conversion failed: {0}")]
    Spreadsheet(String),

    #[error("Text recognition failed: {0}")]
    Ocr(String),

    #[error("Document package is corrupted: {0}")]
    CorruptedDocument(String),

    #[error("Document conversion failed: {0}")]
    Document(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ConversionResult<T> = Result<T, ConversionError>;

/// Source file formats accepted for conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpg,
    Jpeg,
    Bmp,
    Xls,
    Docx,
}

impl SourceFormat {
    /// Map a file extension (with or without the leading dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "jpg" => Some(SourceFormat::Jpg),
            "jpeg" => Some(SourceFormat::Jpeg),
            "bmp" => Some(SourceFormat::Bmp),
            "xls" => Some(SourceFormat::Xls),
            "docx" => Some(SourceFormat::Docx),
            _ => None,
        }
    }

    /// Canonical lowercase extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Jpg => "jpg",
            SourceFormat::Jpeg => "jpeg",
            SourceFormat::Bmp => "bmp",
            SourceFormat::Xls => "xls",
            SourceFormat::Docx => "docx",
        }
    }
}

/// Convert the file at `input` into an `.xlsx` workbook at `output`.
///
/// The extension decides the conversion branch. An empty input fails
/// before any branch runs, so a zero-length `.pdf` reports
/// [`ConversionError::EmptyInput`] rather than an unsupported format.
/// `ocr_language` is the Tesseract language code used for image inputs.
///
/// On success exactly one file is written at `output`; on failure no
/// partial file is left there.
///
/// # Errors
///
/// Returns a [`ConversionError`] classifying the failed stage.
pub fn convert_file(
    input: &Path,
    output: &Path,
    extension: &str,
    ocr_language: &str,
) -> ConversionResult<()> {
    if std::fs::metadata(input)?.len() == 0 {
        return Err(ConversionError::EmptyInput);
    }

    match SourceFormat::from_extension(extension) {
        Some(SourceFormat::Xls) => spreadsheet::reencode(input, output),
        Some(SourceFormat::Jpg | SourceFormat::Jpeg | SourceFormat::Bmp) => {
            image::to_text_sheet(input, output, ocr_language)
        }
        Some(SourceFormat::Docx) => document::to_text_sheet(input, output),
        // The dispatcher filters extensions before converting, so this
        // branch only fires on a caller bypassing that filter.
        None => Err(ConversionError::UnsupportedFormat(extension.to_string())),
    }
}

/// Generate a unique path in the system temp directory with the given
/// suffix (e.g. `".xlsx"`).
pub fn unique_temp_path(suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("xlsxify-{}{}", Uuid::new_v4().as_simple(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_extension_is_case_insensitive() {
        assert_eq!(SourceFormat::from_extension("jpg"), Some(SourceFormat::Jpg));
        assert_eq!(SourceFormat::from_extension("JPG"), Some(SourceFormat::Jpg));
        assert_eq!(
            SourceFormat::from_extension("DocX"),
            Some(SourceFormat::Docx)
        );
        assert_eq!(SourceFormat::from_extension("xls"), Some(SourceFormat::Xls));
    }

    #[test]
    fn from_extension_accepts_leading_dot() {
        assert_eq!(
            SourceFormat::from_extension(".jpeg"),
            Some(SourceFormat::Jpeg)
        );
        assert_eq!(SourceFormat::from_extension(".BMP"), Some(SourceFormat::Bmp));
    }

    #[test]
    fn from_extension_rejects_unknown() {
        assert_eq!(SourceFormat::from_extension("pdf"), None);
        assert_eq!(SourceFormat::from_extension("xlsx"), None);
        assert_eq!(SourceFormat::from_extension(""), None);
    }

    #[test]
    fn empty_input_wins_over_unsupported_format() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("empty.pdf");
        std::fs::File::create(&input)?;
        let output = dir.path().join("out.xlsx");

        let err = convert_file(&input, &output, "pdf", "eng")
            .expect_err("empty input must fail");
        assert!(matches!(err, ConversionError::EmptyInput));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn unsupported_extension_fails_for_non_empty_input() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("report.pdf");
        let mut f = std::fs::File::create(&input)?;
        f.write_all(b"%PDF-1.4")?;
        let output = dir.path().join("out.xlsx");

        let err = convert_file(&input, &output, "pdf", "eng")
            .expect_err("unsupported extension must fail");
        assert!(matches!(err, ConversionError::UnsupportedFormat(ref e) if e == "pdf"));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn unique_temp_paths_do_not_collide() {
        let a = unique_temp_path(".xlsx");
        let b = unique_temp_path(".xlsx");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with(".xlsx"));
    }
}
