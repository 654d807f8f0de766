//! Spreadsheet text extraction.
//!
//! The workbook is opened from memory with calamine, which reads the cached
//! cell values written by the producing application; formulas are never
//! evaluated. Only the first sheet is read, row by row, left to right.
//!
//! Each value is rendered the way the sheet displays it. For xlsx packages
//! the cell's number format is looked up in the package styles, so `0.25`
//! shown as a percentage becomes `25%` and `1234` with grouping becomes
//! `1,234`. Other workbook formats, and cells without a format, use General.
//!
//! Cells whose display text cannot be produced (error cells such as
//! `#DIV/0!`, non-finite numbers, dates outside the calendar) are skipped and
//! never fail the load. Empty cells are skipped too. Commas inside a cell
//! value are not escaped, so such a cell yields several items downstream.

mod numfmt;
mod styles;

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader, Sheets};
use chrono::Timelike;

use crate::error::{LoadError, LoadResult};

pub use numfmt::{format_number, general};

use styles::CellFormats;

/// Extracts the non-empty formatted values of the first sheet, joined by `,`.
pub fn extract_text(bytes: &[u8]) -> LoadResult<String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(LoadError::invalid_content)?;
    let formats = match &workbook {
        Sheets::Xlsx(_) => styles::read_xlsx(bytes).unwrap_or_else(|e| {
            tracing::debug!("number formats unavailable, using General: {:#}", e);
            CellFormats::default()
        }),
        _ => CellFormats::default(),
    };
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::InvalidContent("workbook has no sheets".to_string()))?
        .map_err(LoadError::invalid_content)?;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut values = Vec::new();
    let mut skipped = 0usize;
    for (r, row) in range.rows().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let code = formats.code_at(first_row + r as u32, first_col + c as u32);
            match format_cell_with(cell, code, formats.date1904) {
                Some(v) if !v.is_empty() => values.push(v),
                Some(_) => {}
                None if matches!(cell, Data::Empty) => {}
                None => skipped += 1,
            }
        }
    }
    tracing::debug!(
        rows = range.height(),
        values = values.len(),
        styled = formats.len(),
        skipped,
        "extracted first sheet"
    );
    Ok(values.join(","))
}

/// Display text of a single cell shown with the General format, or `None`
/// when it has none.
pub fn format_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.is_finite() => Some(general(*f)),
        Data::Float(_) => None,
        Data::Bool(true) => Some("TRUE".to_string()),
        Data::Bool(false) => Some("FALSE".to_string()),
        Data::DateTime(dt) => format_datetime(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Display text of a cell under the number format `code`. Text, booleans
/// and errors ignore the format.
pub fn format_cell_with(cell: &Data, code: Option<&str>, date1904: bool) -> Option<String> {
    let Some(code) = code else {
        return format_cell(cell);
    };
    match cell {
        Data::Int(i) => format_number(*i as f64, code, date1904),
        Data::Float(f) => format_number(*f, code, date1904),
        Data::DateTime(dt) => format_number(dt.as_f64(), code, date1904),
        _ => format_cell(cell),
    }
}

fn format_datetime(dt: &ExcelDateTime) -> Option<String> {
    if dt.is_duration() {
        let secs = dt.as_duration()?.num_seconds();
        let sign = if secs < 0 { "-" } else { "" };
        let secs = secs.abs();
        return Some(format!(
            "{}{}:{:02}:{:02}",
            sign,
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ));
    }
    let dt = dt.as_datetime()?;
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        Some(dt.format("%Y-%m-%d").to_string())
    } else {
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
