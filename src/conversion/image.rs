//! Image to text-sheet conversion via Tesseract OCR.

use super::sheet;
use super::{ConversionError, ConversionResult};
use leptess::LepTess;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Recognize the text in the image at `input` and write it as a
/// one-cell `Text` sheet at `output`. `language` is a Tesseract
/// language code such as `"eng"`.
pub(crate) fn to_text_sheet(input: &Path, output: &Path, language: &str) -> ConversionResult<()> {
    let text = recognize_text(input, language)?;
    debug!(chars = text.len(), "Recognized image text");
    sheet::write_text_sheet(&text, output)
        .map_err(|e| ConversionError::Ocr(format!("failed to write workbook: {e}")))
}

/// Run OCR against an image file.
///
/// The image is decoded with the `image` crate and re-encoded to PNG in
/// memory before being handed to Tesseract, so every format the decoder
/// understands (including BMP) reaches the engine in a form it accepts.
fn recognize_text(input: &Path, language: &str) -> ConversionResult<String> {
    let img = image::open(input).map_err(|e| {
        ConversionError::Ocr(format!("failed to open image {}: {e}", input.display()))
    })?;

    let mut png_buf = Cursor::new(Vec::new());
    img.write_to(&mut png_buf, image::ImageFormat::Png)
        .map_err(|e| ConversionError::Ocr(format!("failed to encode image as PNG: {e}")))?;

    let mut engine = LepTess::new(None, language)
        .map_err(|e| ConversionError::Ocr(format!("failed to initialize Tesseract: {e}")))?;
    engine
        .set_image_from_mem(png_buf.get_ref())
        .map_err(|e| ConversionError::Ocr(format!("failed to load image into Tesseract: {e}")))?;

    let text = engine
        .get_utf8_text()
        .map_err(|e| ConversionError::Ocr(format!("recognition failed: {e}")))?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_image_is_classified_as_ocr_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("not-an-image.jpg");
        std::fs::write(&input, b"definitely not a jpeg").expect("write fixture");
        let output = dir.path().join("out.xlsx");

        let err = to_text_sheet(&input, &output, "eng").expect_err("garbage must not decode");
        assert!(matches!(err, ConversionError::Ocr(_)));
        assert!(!output.exists());
    }
}
