//! Workbook decoding.
//!
//! Reads the first sheet of a spreadsheet with calamine and turns each row
//! into an [`EnrollmentRecord`], keyed by the header row. Rows are never
//! rejected: absent or unusable cells become `None`.

use crate::error::{DeptmapError, DeptmapResult};
use crate::models::{
    EnrollmentRecord, DEPARTMENT_HEADER, FACULTY_HEADER, SECTION_HEADER, STUDENT_COUNT_HEADER,
};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::{debug, info, warn};

/// Records extracted from the first sheet of a workbook.
#[derive(Debug, Clone)]
pub struct SheetRecords {
    /// Name of the sheet that was read.
    pub sheet_name: String,
    /// One record per non-blank data row, in sheet order.
    pub records: Vec<EnrollmentRecord>,
    /// Required headers that were not found in the header row.
    pub missing_headers: Vec<&'static str>,
}

/// Column positions of the required headers.
#[derive(Debug, Default)]
struct HeaderMap {
    department: Option<usize>,
    section_name: Option<usize>,
    faculty: Option<usize>,
    student_count: Option<usize>,
}

impl HeaderMap {
    fn from_row(row: &[Data]) -> Self {
        let mut map = HeaderMap::default();

        for (col, cell) in row.iter().enumerate() {
            let Some(name) = cell_text(cell) else {
                continue;
            };
            // First occurrence wins when a header is repeated.
            let slot = match name.as_str() {
                DEPARTMENT_HEADER => &mut map.department,
                SECTION_HEADER => &mut map.section_name,
                FACULTY_HEADER => &mut map.faculty,
                STUDENT_COUNT_HEADER => &mut map.student_count,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(col);
            }
        }

        map
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            (self.department, DEPARTMENT_HEADER),
            (self.section_name, SECTION_HEADER),
            (self.faculty, FACULTY_HEADER),
            (self.student_count, STUDENT_COUNT_HEADER),
        ]
        .into_iter()
        .filter(|(col, _)| col.is_none())
        .map(|(_, name)| name)
        .collect()
    }
}

/// Decode a workbook and read the records of its first sheet.
///
/// `location` is only used to label errors.
pub fn read_first_sheet(bytes: &[u8], location: &str) -> DeptmapResult<SheetRecords> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DeptmapError::source_unavailable(location, format!("unreadable workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| DeptmapError::source_unavailable(location, "workbook has no sheets"))?;

    if sheet_names.len() > 1 {
        debug!(
            "Ignoring {} additional sheet(s) after '{}'",
            sheet_names.len() - 1,
            sheet_name
        );
    }

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        DeptmapError::source_unavailable(location, format!("cannot read sheet '{}': {}", sheet_name, e))
    })?;

    let (records, missing_headers) = records_from_range(&range);

    info!(
        "Read {} records from sheet '{}'",
        records.len(),
        sheet_name
    );

    Ok(SheetRecords {
        sheet_name,
        records,
        missing_headers,
    })
}

/// Convert a worksheet range into records, using its first row as headers.
fn records_from_range(range: &Range<Data>) -> (Vec<EnrollmentRecord>, Vec<&'static str>) {
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        warn!("First sheet is empty");
        return (Vec::new(), Vec::new());
    };

    let headers = HeaderMap::from_row(header_row);
    let missing_headers = headers.missing();
    for header in &missing_headers {
        warn!("Column '{}' not found in header row; treating it as blank", header);
    }

    // 1-based sheet row of the first data row, for log messages.
    let first_data_row = range.start().map(|(row, _)| row as usize + 2).unwrap_or(2);
    let mut records = Vec::new();

    for (offset, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }

        let text_at = |col: Option<usize>| col.and_then(|c| row.get(c)).and_then(cell_text);

        let count_cell = headers.student_count.and_then(|c| row.get(c));
        let student_count = count_cell.and_then(parse_student_count);
        if student_count.is_none() {
            if let Some(cell) = count_cell.filter(|c| !is_blank(c)) {
                warn!(
                    "Row {}: Student_Count '{}' is not a non-negative whole number",
                    first_data_row + offset,
                    cell
                );
            }
        }

        records.push(EnrollmentRecord {
            department: text_at(headers.department),
            section_name: text_at(headers.section_name),
            faculty: text_at(headers.faculty),
            student_count,
        });
    }

    (records, missing_headers)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Text value of a cell; numbers and dates use their display form.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse a student count. Numeric text is accepted; fractions and negatives are not.
fn parse_student_count(cell: &Data) -> Option<u64> {
    match cell {
        Data::Int(i) => u64::try_from(*i).ok(),
        Data::Float(f) => whole_number(*f),
        Data::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
}

/// `u64::MAX as f64` rounds up to 2^64, so the bound must be exclusive.
fn whole_number(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}
