use std::collections::BTreeMap;

use chrono::Datelike;

use crate::model::{RosterEntry, UsatfId, UsatfRecord};

/// Header row of the registration sheet.
pub const REPORT_COLUMNS: [&str; 10] = [
    "Last",
    "First",
    "USATF Age",
    "USATF Status",
    "USATF Num",
    "Age Verified",
    "Last Mismatch",
    "First Mismatch",
    "DOB Mismatch",
    "Gender Mismatch",
];

/// One row of the registration report, ready to place in the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub last: String,
    pub first: String,
    /// Competition age for the report year, `year - dob.year`.
    pub age: i32,
    pub membership_current: bool,
    pub usatf_id: Option<UsatfId>,
    pub age_verified: bool,
    pub last_mismatch: bool,
    pub first_mismatch: bool,
    pub dob_mismatch: bool,
    pub gender_mismatch: bool,
}

/// Joins the roster against the USATF records and computes the per-field
/// mismatch flags. Unlinked athletes report every field as mismatched so the
/// formatting flags the whole row.
pub fn build_report(
    roster: &[RosterEntry],
    records: &BTreeMap<UsatfId, UsatfRecord>,
    year: i32,
) -> Vec<ReportRow> {
    roster
        .iter()
        .map(|entry| {
            let linked = entry.usatf_id.and_then(|id| records.get(&id));
            ReportRow {
                last: entry.last.clone(),
                first: entry.first.clone(),
                age: year - entry.dob.year(),
                membership_current: linked.is_some_and(|record| record.membership_current),
                usatf_id: entry.usatf_id,
                age_verified: linked.is_some_and(|record| record.age_verified),
                last_mismatch: linked.is_none_or(|record| record.last != entry.last),
                first_mismatch: linked.is_none_or(|record| record.first != entry.first),
                dob_mismatch: linked.is_none_or(|record| record.dob != entry.dob),
                gender_mismatch: linked.is_none_or(|record| record.gender != entry.gender),
            }
        })
        .collect()
}
