//! `.docx` to text-sheet conversion.
//!
//! A `.docx` file is a ZIP package whose main content lives in
//! `word/document.xml`. The package is opened with `zip` and the XML is
//! streamed with `quick-xml`; no writer-oriented docx crate is
//! involved. A file that fails to open as a ZIP package (or has no
//! `word/document.xml`) is the distinguished corrupted-package case.

use super::sheet;
use super::{ConversionError, ConversionResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// Extract all body paragraphs of the document at `input`, join them
/// with newlines and write the result as a one-cell `Text` sheet.
pub(crate) fn to_text_sheet(input: &Path, output: &Path) -> ConversionResult<()> {
    info!(path = %input.display(), "Opening .docx file");
    let paragraphs = extract_paragraphs(input)?;
    let text = paragraphs.join("\n");
    sheet::write_text_sheet(&text, output)
        .map_err(|e| ConversionError::Document(format!("failed to write workbook: {e}")))?;
    info!(path = %output.display(), "Document converted");
    Ok(())
}

/// Read `word/document.xml` out of the package and collect paragraph
/// texts. Top-level body paragraphs only; paragraphs inside tables and
/// drawing text boxes are skipped.
pub(crate) fn extract_paragraphs(input: &Path) -> ConversionResult<Vec<String>> {
    let file = File::open(input)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        ConversionError::CorruptedDocument(format!("failed to open as ZIP package: {e}"))
    })?;

    let xml = {
        let mut part = archive.by_name("word/document.xml").map_err(|e| {
            ConversionError::CorruptedDocument(format!("missing word/document.xml: {e}"))
        })?;
        let mut content = String::new();
        part.read_to_string(&mut content).map_err(|e| {
            ConversionError::Document(format!("failed to read word/document.xml: {e}"))
        })?;
        content
    };

    let paragraphs = parse_paragraphs(&xml)?;
    debug!(count = paragraphs.len(), "Extracted paragraphs");
    Ok(paragraphs)
}

/// Walk the document XML and build one string per body-level `w:p`.
/// Run text comes from `w:t` nodes; explicit breaks and tabs map to
/// `\n` and `\t` inside the paragraph.
fn parse_paragraphs(xml: &str) -> ConversionResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_body = false;
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut textbox_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:body" => in_body = true,
                b"w:tbl" => table_depth += 1,
                // Text boxes ride inside a run of the enclosing
                // paragraph; their nested w:p elements are not body
                // paragraphs.
                b"w:txbxContent" => textbox_depth += 1,
                b"w:p" if in_body && table_depth == 0 && textbox_depth == 0 => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" if in_paragraph && textbox_depth == 0 => in_text = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ConversionError::Document(format!("invalid text node: {e}")))?;
                current.push_str(&text);
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                // A self-closing w:p is an empty paragraph and still
                // counts toward the joined text.
                b"w:p" if in_body && table_depth == 0 && textbox_depth == 0 => {
                    paragraphs.push(String::new());
                }
                b"w:br" | b"w:cr" if in_paragraph && textbox_depth == 0 => current.push('\n'),
                b"w:tab" if in_paragraph && textbox_depth == 0 => current.push('\t'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:body" => in_body = false,
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:txbxContent" => textbox_depth = textbox_depth.saturating_sub(1),
                b"w:p" if in_paragraph && textbox_depth == 0 => {
                    paragraphs.push(std::mem::take(&mut current));
                    in_paragraph = false;
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConversionError::Document(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_body(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        )
    }

    #[test]
    fn collects_body_paragraphs_in_order() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>First</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>run</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&xml).expect("parse");
        assert_eq!(paragraphs, vec!["First", "Second run"]);
    }

    #[test]
    fn empty_paragraphs_are_kept_as_empty_strings() {
        let xml = wrap_body("<w:p/><w:p><w:r><w:t>after blank</w:t></w:r></w:p>");
        let paragraphs = parse_paragraphs(&xml).expect("parse");
        assert_eq!(paragraphs, vec!["", "after blank"]);
    }

    #[test]
    fn table_paragraphs_are_skipped() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>outside</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inside</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let paragraphs = parse_paragraphs(&xml).expect("parse");
        assert_eq!(paragraphs, vec!["outside"]);
    }

    #[test]
    fn textbox_paragraphs_are_excluded_and_surrounding_runs_kept() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>before</w:t></w:r>\
             <w:r><w:drawing \
             xmlns:wps=\"http://schemas.microsoft.com/office/word/2010/wordprocessingShape\">\
             <wps:txbx><w:txbxContent>\
             <w:p><w:r><w:t>box text</w:t></w:r></w:p>\
             </w:txbxContent></wps:txbx></w:drawing></w:r>\
             <w:r><w:t>after</w:t></w:r></w:p>\
             <w:p><w:r><w:t>next</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&xml).expect("parse");
        assert_eq!(paragraphs, vec!["beforeafter", "next"]);
    }

    #[test]
    fn breaks_and_tabs_become_whitespace() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>a</w:t><w:br/><w:t>b</w:t><w:tab/><w:t>c</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&xml).expect("parse");
        assert_eq!(paragraphs, vec!["a\nb\tc"]);
    }

    #[test]
    fn escaped_entities_are_unescaped() {
        let xml = wrap_body("<w:p><w:r><w:t>a &amp; b &lt; c</w:t></w:r></w:p>");
        let paragraphs = parse_paragraphs(&xml).expect("parse");
        assert_eq!(paragraphs, vec!["a & b < c"]);
    }

    #[test]
    fn non_zip_input_is_classified_as_corrupted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("broken.docx");
        std::fs::write(&input, b"this is not a zip archive").expect("write fixture");

        let err = extract_paragraphs(&input).expect_err("garbage must not open");
        assert!(matches!(err, ConversionError::CorruptedDocument(_)));
    }
}
