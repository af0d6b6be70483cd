//! Legacy `.xls` to `.xlsx` re-encoding.

use super::sheet;
use super::{ConversionError, ConversionResult};
use calamine::{open_workbook, Reader, Xls};
use std::path::Path;
use tracing::debug;

/// Re-encode the first worksheet of a legacy `.xls` workbook as
/// `.xlsx`, preserving every cell value and position. Worksheets past
/// the first are not carried over.
pub(crate) fn reencode(input: &Path, output: &Path) -> ConversionResult<()> {
    let mut workbook: Xls<_> = open_workbook(input).map_err(|e| {
        ConversionError::Spreadsheet(format!("failed to open {}: {e}", input.display()))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ConversionError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| {
            ConversionError::Spreadsheet(format!("failed to read first worksheet: {e}"))
        })?;

    debug!(
        rows = range.height(),
        cols = range.width(),
        "Decoded legacy worksheet"
    );

    sheet::copy_range(&range, output)
        .map_err(|e| ConversionError::Spreadsheet(format!("failed to write workbook: {e}")))
}
