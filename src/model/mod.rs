use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Membership number assigned by USATF. It is the sole join key between the
/// roster and the membership records.
pub type UsatfId = u32;

/// Date recorded when a TeamSnap export omits an athlete's birthdate.
pub fn placeholder_dob() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// One athlete from the TeamSnap roster, together with the link and flags
/// accumulated across merge sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Normalized last name.
    pub last: String,
    /// Normalized first name.
    pub first: String,
    /// Birthdate as exported; the placeholder when the export left it blank.
    pub dob: NaiveDate,
    /// Normalized gender string as exported.
    pub gender: String,
    /// USATF membership number established by the merge command.
    pub usatf_id: Option<UsatfId>,
    /// Coaches are excluded from matching and from the exported report.
    pub is_coach: bool,
    /// Timestamp of the ingest session that last touched this entry.
    pub updated_at: DateTime<Utc>,
}

impl RosterEntry {
    /// Creates a fresh entry from an imported row. The USATF link and coach
    /// flag start unset; re-ingesting preserves them via the store.
    pub fn from_import(row: &TsImportRow, updated_at: DateTime<Utc>) -> Self {
        Self {
            last: row.last.clone(),
            first: row.first.clone(),
            dob: row.dob,
            gender: row.gender.clone(),
            usatf_id: None,
            is_coach: false,
            updated_at,
        }
    }
}

/// One row from the USATF membership and age-verification export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsatfRecord {
    /// Membership number; unique within the export.
    pub usatf_id: UsatfId,
    pub last: String,
    pub first: String,
    pub dob: NaiveDate,
    pub gender: String,
    /// True when the export's membership status is exactly `Current`.
    pub membership_current: bool,
    /// True when the birthdate verification status is exactly `Current`.
    pub age_verified: bool,
    /// Timestamp of the ingest session that last touched this record.
    pub updated_at: DateTime<Utc>,
}

impl UsatfRecord {
    /// Builds a record from an imported row that carries a membership number.
    pub fn from_import(row: &UsatfImportRow, usatf_id: UsatfId, updated_at: DateTime<Utc>) -> Self {
        Self {
            usatf_id,
            last: row.last.clone(),
            first: row.first.clone(),
            dob: row.dob,
            gender: row.gender.clone(),
            membership_current: row.membership_current,
            age_verified: row.age_verified,
            updated_at,
        }
    }
}

/// Normalized TeamSnap roster row prior to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TsImportRow {
    pub last: String,
    pub first: String,
    pub dob: NaiveDate,
    pub gender: String,
}

/// Normalized USATF export row prior to storage. Rows without a membership
/// number are dropped before they reach the database.
#[derive(Debug, Clone, PartialEq)]
pub struct UsatfImportRow {
    pub usatf_id: Option<UsatfId>,
    pub last: String,
    pub first: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub membership_current: bool,
    pub age_verified: bool,
}

/// Candidate USATF records found for one roster entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchSet {
    /// Records agreeing on last name, first name, birthdate, and gender.
    pub exact: Vec<UsatfRecord>,
    /// Records agreeing on at least one of last name, first name, or
    /// birthdate, excluding the exact matches.
    pub partial: Vec<UsatfRecord>,
}
