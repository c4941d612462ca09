//! Readers and writers for the roster export formats.
//!
//! TeamSnap and USATF both hand out tabular exports, either as CSV or as an
//! XLSX workbook. The readers here normalize both shapes into the import
//! rows defined in [`crate::model`]; the writer emits the final registration
//! workbook.

pub mod csv_read;
pub mod excel_read;
pub mod excel_write;

use std::path::Path;

use chrono::NaiveDate;

use crate::error::{MergeError, Result};
use crate::model::{TsImportRow, UsatfImportRow, UsatfId, placeholder_dob};

/// Column headers of a TeamSnap roster export.
pub const TS_COLUMNS: [&str; 4] = ["Last", "First", "Birthdate", "Gender"];

/// Column headers of a USATF membership export.
pub const USATF_COLUMNS: [&str; 7] = [
    "Last Name",
    "First Name",
    "Date of Birth",
    "Sex",
    "Individual Membership Status",
    "Individual Membership Memb No.",
    "Date of Birth Verification Status",
];

/// Reads a TeamSnap roster export, picking the reader from the extension.
pub fn read_ts_export(path: &Path) -> Result<Vec<TsImportRow>> {
    if is_workbook(path) {
        excel_read::read_ts_rows(path)
    } else {
        csv_read::read_ts_rows(path)
    }
}

/// Reads a USATF membership export, picking the reader from the extension.
pub fn read_usatf_export(path: &Path) -> Result<Vec<UsatfImportRow>> {
    if is_workbook(path) {
        excel_read::read_usatf_rows(path)
    } else {
        csv_read::read_usatf_rows(path)
    }
}

fn is_workbook(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("xlsx") | Some("xlsm")
    )
}

pub(crate) fn build_ts_row(
    last: &str,
    first: &str,
    birthdate: &str,
    gender: &str,
) -> Result<TsImportRow> {
    let dob = if birthdate.trim().is_empty() {
        placeholder_dob()
    } else {
        parse_date("Birthdate", birthdate)?
    };
    Ok(TsImportRow {
        last: normalize_name(last),
        first: normalize_name(first),
        dob,
        gender: normalize_name(gender),
    })
}

pub(crate) fn build_usatf_row(
    last: &str,
    first: &str,
    birthdate: &str,
    gender: &str,
    status: &str,
    membership_number: &str,
    verification: &str,
) -> Result<UsatfImportRow> {
    Ok(UsatfImportRow {
        usatf_id: parse_membership_number(membership_number)?,
        last: normalize_name(last),
        first: normalize_name(first),
        dob: parse_date("Date of Birth", birthdate)?,
        gender: normalize_name(gender),
        membership_current: status_is_current(status),
        age_verified: status_is_current(verification),
    })
}

/// Trims a name and title-cases it only when the export shipped it
/// all-lowercase or all-uppercase. Mixed-case names keep the owner's casing
/// (e.g. `McKay`, `van Dyke`).
pub(crate) fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let cased: Vec<char> = trimmed.chars().filter(|ch| ch.is_alphabetic()).collect();
    let uniform = !cased.is_empty()
        && (cased.iter().all(|ch| ch.is_lowercase()) || cased.iter().all(|ch| ch.is_uppercase()));
    if uniform {
        titlecase(trimmed)
    } else {
        trimmed.to_string()
    }
}

fn titlecase(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = true;
        }
    }
    out
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
    value
        .trim()
        .parse()
        .map_err(|_| MergeError::InvalidCell {
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn parse_membership_number(value: &str) -> Result<Option<UsatfId>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| MergeError::InvalidCell {
            column: "Individual Membership Memb No.".to_string(),
            value: value.to_string(),
        })
}

fn status_is_current(value: &str) -> bool {
    value.trim() == "Current"
}
