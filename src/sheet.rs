use calamine::{Data, Reader, Xlsx, open_workbook};
use std::path::Path;

use crate::excel_validator::ValidatorError;

/// A single data row: display-string cells plus the 1-based position the
/// row occupied in the source sheet (the header is row 1, so the first
/// data row is row 2)
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(number: usize, cells: Vec<String>) -> Self {
        RawRow { number, cells }
    }

    /// Cell value at a column index, with short rows padded by empty string
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Header row plus ordered data rows, as read from the first worksheet
///
/// Headers are kept raw here; canonicalization is the pipeline's job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl SheetData {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads an `.xlsx` workbook into a [`SheetData`]
///
/// The first worksheet is the only one consulted; its first row is always
/// the header and never part of the data. All cells are coerced to their
/// display text - no type inference happens at this layer.
pub struct XlsxSource;

impl XlsxSource {
    pub fn load(path: &Path) -> Result<SheetData, ValidatorError> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e| ValidatorError::Read(format!("Error opening workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ValidatorError::Read("The workbook contains no sheets".to_string()))?
            .map_err(|e| ValidatorError::Read(format!("Error reading sheet: {}", e)))?;

        let mut sheet = SheetData::default();

        for (row_index, row) in range.rows().enumerate() {
            if row_index == 0 {
                sheet.headers = row.iter().map(|cell| cell_to_string(cell)).collect();
                continue;
            }

            let cells: Vec<String> = row.iter().map(|cell| cell_to_string(cell)).collect();
            sheet.rows.push(RawRow::new(row_index + 1, cells));
        }

        Ok(sheet)
    }
}

/// Coerce a spreadsheet cell to the display string handed to the rules
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_to_display(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_datetime_to_chrono(dt).to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        // Formula errors (#DIV/0! etc.) carry no usable value
        Data::Error(_) => String::new(),
    }
}

/// Whole-valued floats render without a fractional part, matching how the
/// spreadsheet displays them
fn float_to_display(f: f64) -> String {
    if f.is_nan() || f.is_infinite() {
        return String::new();
    }

    if f.fract().abs() < f64::EPSILON && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

fn excel_datetime_to_chrono(dt: &calamine::ExcelDateTime) -> chrono::NaiveDateTime {
    use chrono::{Duration, NaiveDate};
    let excel_base = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let value = dt.as_f64();
    let days = value as i64;
    let seconds = ((value - days as f64) * 86400.0).round() as i64;
    excel_base.and_hms_opt(0, 0, 0).unwrap() + Duration::days(days) + Duration::seconds(seconds)
}
