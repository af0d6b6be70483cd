//! Workbook encoding shared by the conversion branches.
//!
//! All output goes through [`save_atomic`]: the workbook is saved to a
//! sibling scratch path and renamed into place, so a failed save never
//! leaves a partial file at the target.

use calamine::{Data, Range};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;
use uuid::Uuid;

/// Column header for sheets produced from recognized or extracted text.
pub(crate) const TEXT_HEADER: &str = "Text";

/// Write a workbook with a single `Text` column and one data row
/// holding `text`.
pub(crate) fn write_text_sheet(text: &str, output: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, TEXT_HEADER)?;
    worksheet.write_string(1, 0, text)?;
    save_atomic(&mut workbook, output)
}

/// Copy every cell of a decoded range into a fresh workbook, keeping
/// each cell's position within the used range and discarding nothing
/// but empty cells.
pub(crate) fn copy_range(range: &Range<Data>, output: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (row_idx, row) in range.rows().enumerate() {
        let row_num = row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                Data::Empty => {}
                Data::String(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Data::Float(f) => {
                    worksheet.write_number(row_num, col_num, *f)?;
                }
                Data::Int(i) => {
                    worksheet.write_number(row_num, col_num, *i as f64)?;
                }
                Data::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                Data::DateTime(dt) => {
                    worksheet.write_number(row_num, col_num, dt.as_f64())?;
                }
                Data::DateTimeIso(s) | Data::DurationIso(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Data::Error(e) => {
                    worksheet.write_string(row_num, col_num, &e.to_string())?;
                }
            }
        }
    }

    save_atomic(&mut workbook, output)
}

/// Save `workbook` at `output` through a scratch file in the same
/// directory. The rename is the publish step; on save failure the
/// scratch file is removed and `output` stays untouched.
pub(crate) fn save_atomic(workbook: &mut Workbook, output: &Path) -> Result<(), XlsxError> {
    let scratch = scratch_path(output);
    if let Err(e) = workbook.save(&scratch) {
        let _ = std::fs::remove_file(&scratch);
        return Err(e);
    }
    std::fs::rename(&scratch, output)?;
    Ok(())
}

fn scratch_path(output: &Path) -> std::path::PathBuf {
    let mut name = output
        .file_name()
        .map_or_else(|| "workbook.xlsx".into(), |n| n.to_os_string());
    name.push(format!(".{}.tmp", Uuid::new_v4().as_simple()));
    output.with_file_name(name)
}
