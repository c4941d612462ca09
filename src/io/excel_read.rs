use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{MergeError, Result};
use crate::io::{TS_COLUMNS, USATF_COLUMNS, build_ts_row, build_usatf_row};
use crate::model::{TsImportRow, UsatfImportRow};

/// Reads a TeamSnap roster export from the first sheet of an XLSX workbook.
pub fn read_ts_rows(path: &Path) -> Result<Vec<TsImportRow>> {
    let range = first_sheet(path)?;
    let columns = header_index(&range, &TS_COLUMNS, path)?;

    let mut rows = Vec::new();
    for row in range.rows().skip(1) {
        let last = cell_to_string(row.get(columns[0]));
        let first = cell_to_string(row.get(columns[1]));
        if last.trim().is_empty() && first.trim().is_empty() {
            continue;
        }
        let birthdate = cell_to_string(row.get(columns[2]));
        let gender = cell_to_string(row.get(columns[3]));
        rows.push(build_ts_row(&last, &first, &birthdate, &gender)?);
    }
    Ok(rows)
}

/// Reads a USATF membership export from the first sheet of an XLSX workbook.
pub fn read_usatf_rows(path: &Path) -> Result<Vec<UsatfImportRow>> {
    let range = first_sheet(path)?;
    let columns = header_index(&range, &USATF_COLUMNS, path)?;

    let mut rows = Vec::new();
    for row in range.rows().skip(1) {
        let last = cell_to_string(row.get(columns[0]));
        let first = cell_to_string(row.get(columns[1]));
        if last.trim().is_empty() && first.trim().is_empty() {
            continue;
        }
        let birthdate = cell_to_string(row.get(columns[2]));
        let gender = cell_to_string(row.get(columns[3]));
        let status = cell_to_string(row.get(columns[4]));
        let membership_number = cell_to_string(row.get(columns[5]));
        let verification = cell_to_string(row.get(columns[6]));
        rows.push(build_usatf_row(
            &last,
            &first,
            &birthdate,
            &gender,
            &status,
            &membership_number,
            &verification,
        )?);
    }
    Ok(rows)
}

fn first_sheet(path: &Path) -> Result<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range_result = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MergeError::InvalidWorkbook("workbook has no sheets".to_string()))?;
    let range = range_result.map_err(MergeError::from)?;
    Ok(range)
}

fn header_index(range: &Range<DataType>, required: &[&str], path: &Path) -> Result<Vec<usize>> {
    let headers: Vec<String> = match range.rows().next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => Vec::new(),
    };

    required
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| header.trim() == *column)
                .ok_or_else(|| MergeError::MissingColumn {
                    column: (*column).to_string(),
                    file: path.to_path_buf(),
                })
        })
        .collect()
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        // Date cells come back as serial numbers; render them in the ISO
        // form the shared normalization expects.
        Some(cell @ DataType::DateTime(_)) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
