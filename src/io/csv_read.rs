use std::path::Path;

use serde::Deserialize;

use crate::error::{MergeError, Result};
use crate::io::{TS_COLUMNS, USATF_COLUMNS, build_ts_row, build_usatf_row};
use crate::model::{TsImportRow, UsatfImportRow};

/// Raw TeamSnap CSV row; values are normalized after deserialization.
#[derive(Debug, Deserialize)]
struct TsCsvRow {
    #[serde(rename = "Last")]
    last: String,
    #[serde(rename = "First")]
    first: String,
    #[serde(rename = "Birthdate")]
    birthdate: String,
    #[serde(rename = "Gender")]
    gender: String,
}

/// Raw USATF CSV row; values are normalized after deserialization.
#[derive(Debug, Deserialize)]
struct UsatfCsvRow {
    #[serde(rename = "Last Name")]
    last: String,
    #[serde(rename = "First Name")]
    first: String,
    #[serde(rename = "Date of Birth")]
    birthdate: String,
    #[serde(rename = "Sex")]
    gender: String,
    #[serde(rename = "Individual Membership Status")]
    status: String,
    #[serde(rename = "Individual Membership Memb No.")]
    membership_number: String,
    #[serde(rename = "Date of Birth Verification Status")]
    verification: String,
}

/// Reads a TeamSnap roster export in CSV form.
pub fn read_ts_rows(path: &Path) -> Result<Vec<TsImportRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    ensure_columns(reader.headers()?, &TS_COLUMNS, path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<TsCsvRow>() {
        let raw = record?;
        rows.push(build_ts_row(
            &raw.last,
            &raw.first,
            &raw.birthdate,
            &raw.gender,
        )?);
    }
    Ok(rows)
}

/// Reads a USATF membership export in CSV form.
pub fn read_usatf_rows(path: &Path) -> Result<Vec<UsatfImportRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    ensure_columns(reader.headers()?, &USATF_COLUMNS, path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<UsatfCsvRow>() {
        let raw = record?;
        rows.push(build_usatf_row(
            &raw.last,
            &raw.first,
            &raw.birthdate,
            &raw.gender,
            &raw.status,
            &raw.membership_number,
            &raw.verification,
        )?);
    }
    Ok(rows)
}

fn ensure_columns(headers: &csv::StringRecord, required: &[&str], path: &Path) -> Result<()> {
    for column in required {
        if !headers.iter().any(|header| header.trim() == *column) {
            return Err(MergeError::MissingColumn {
                column: (*column).to_string(),
                file: path.to_path_buf(),
            });
        }
    }
    Ok(())
}
