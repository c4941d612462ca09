use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use rostmerge::Result;
use rostmerge::console::Console;
use rostmerge::ops;
use rostmerge::store::{RosterDb, RosterFilter};
use tempfile::{TempDir, tempdir};

/// Console that replays a scripted conversation, answering `D` once the
/// script runs out.
struct ScriptedConsole {
    replies: VecDeque<String>,
}

impl ScriptedConsole {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|reply| (*reply).to_string()).collect(),
        }
    }
}

impl Console for ScriptedConsole {
    fn ask(&mut self, _message: &str) -> Result<String> {
        Ok(self
            .replies
            .pop_front()
            .unwrap_or_else(|| "D".to_string()))
    }
}

fn write_ts_csv(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("teamsnap.csv");
    fs::write(
        &path,
        "Last,First,Birthdate,Gender\n\
Doe,Jane,2011-03-09,F\n\
Roe,Rick,2009-07-21,M\n\
Coach,Carol,1980-01-01,F\n",
    )
    .expect("TeamSnap fixture written");
    path
}

fn write_usatf_csv(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("usatf.csv");
    fs::write(
        &path,
        "Last Name,First Name,Date of Birth,Sex,Individual Membership Status,\
Individual Membership Memb No.,Date of Birth Verification Status\n\
Doe,Jane,2011-03-09,F,Current,111,Current\n\
Roe,Rich,2009-07-21,M,Lapsed,222,Current\n\
Noe,Nancy,2010-05-05,F,Current,,Current\n",
    )
    .expect("USATF fixture written");
    path
}

fn read_registration(path: &Path) -> Range<DataType> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opened");
    workbook
        .worksheet_range("registration")
        .expect("registration sheet present")
        .expect("registration sheet read")
}

fn cell(range: &Range<DataType>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[test]
fn ingest_merge_export_roundtrip() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");

    ops::ingest(
        &database,
        Some(&write_ts_csv(&dir)),
        Some(&write_usatf_csv(&dir)),
        false,
    )
    .expect("ingest");

    // Jane links automatically on her unique exact match; Rick's partial
    // matches (same last name and birthdate) need the operator to pick one;
    // Carol has no candidates at all.
    let mut console = ScriptedConsole::new(&["1"]);
    ops::merge_usatf(&database, &mut console, false).expect("merge");

    let output = ops::export_roster(&database, &dir.path().join("registration"), Some(2026))
        .expect("export");
    assert_eq!(output.extension().and_then(|ext| ext.to_str()), Some("xlsx"));

    let range = read_registration(&output);
    assert_eq!(cell(&range, 0, 0), "Last");
    assert_eq!(cell(&range, 0, 9), "Gender Mismatch");

    // Rows are ordered by (last, first): Carol, Jane, Rick.
    assert_eq!(cell(&range, 1, 0), "Coach");
    assert_eq!(cell(&range, 1, 3), "Not Assoc");
    assert_eq!(cell(&range, 1, 4), "");
    assert_eq!(cell(&range, 1, 6), "True");

    assert_eq!(cell(&range, 2, 1), "Jane");
    assert_eq!(cell(&range, 2, 2), "15");
    assert_eq!(cell(&range, 2, 3), "Current");
    assert_eq!(cell(&range, 2, 4), "111");
    assert_eq!(cell(&range, 2, 5), "Current");
    for col in 6..=9 {
        assert_eq!(cell(&range, 2, col), "False");
    }

    assert_eq!(cell(&range, 3, 1), "Rick");
    assert_eq!(cell(&range, 3, 3), "Not Assoc");
    assert_eq!(cell(&range, 3, 4), "222");
    assert_eq!(cell(&range, 3, 5), "Current");
    assert_eq!(cell(&range, 3, 6), "False");
    assert_eq!(cell(&range, 3, 7), "True");
    assert_eq!(cell(&range, 3, 8), "False");
}

#[test]
fn usatf_rows_without_membership_number_are_dropped() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");

    ops::ingest(&database, None, Some(&write_usatf_csv(&dir)), false).expect("ingest");

    let db = RosterDb::open(&database).expect("database opened");
    let records = db.usatf_records().expect("records listed");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| record.last != "Noe"));
}

#[test]
fn coaches_are_excluded_from_matching_and_export() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");
    ops::ingest(
        &database,
        Some(&write_ts_csv(&dir)),
        Some(&write_usatf_csv(&dir)),
        false,
    )
    .expect("ingest");

    // Roster order is Carol, Jane, Rick; mark Carol, leave the others.
    let mut console = ScriptedConsole::new(&["Y", "N", "S"]);
    ops::assign_coaches(&database, &mut console, false).expect("coaches assigned");

    let mut console = ScriptedConsole::new(&["1"]);
    ops::merge_usatf(&database, &mut console, false).expect("merge");

    let output = ops::export_roster(&database, &dir.path().join("registration"), Some(2026))
        .expect("export");
    let range = read_registration(&output);
    assert_eq!(range.height(), 3);
    assert_eq!(cell(&range, 1, 0), "Doe");
    assert_eq!(cell(&range, 2, 0), "Roe");
}

#[test]
fn done_stops_the_merge_session() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");
    ops::ingest(
        &database,
        Some(&write_ts_csv(&dir)),
        Some(&write_usatf_csv(&dir)),
        false,
    )
    .expect("ingest");

    let mut console = ScriptedConsole::new(&["D"]);
    ops::merge_usatf(&database, &mut console, false).expect("merge");

    let db = RosterDb::open(&database).expect("database opened");
    let unmatched = db
        .roster(RosterFilter {
            exclude_coaches: false,
            exclude_matched: true,
        })
        .expect("roster listed");
    // Jane was linked automatically before the prompt; Rick stays unmatched.
    assert!(unmatched.iter().any(|entry| entry.first == "Rick"));
    assert!(unmatched.iter().all(|entry| entry.first != "Jane"));
}

#[test]
fn invalid_selections_are_reprompted() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");
    ops::ingest(
        &database,
        Some(&write_ts_csv(&dir)),
        Some(&write_usatf_csv(&dir)),
        false,
    )
    .expect("ingest");

    let mut console = ScriptedConsole::new(&["x", "9", "1"]);
    ops::merge_usatf(&database, &mut console, false).expect("merge");

    let db = RosterDb::open(&database).expect("database opened");
    let roster = db.roster(RosterFilter::default()).expect("roster listed");
    let rick = roster
        .iter()
        .find(|entry| entry.first == "Rick")
        .expect("Rick present");
    assert_eq!(rick.usatf_id, Some(222));
}

#[test]
fn clear_ingest_drops_entries_missing_from_the_new_roster() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");
    ops::ingest(&database, Some(&write_ts_csv(&dir)), None, false).expect("ingest");

    let trimmed = dir.path().join("trimmed.csv");
    fs::write(
        &trimmed,
        "Last,First,Birthdate,Gender\nDoe,Jane,2011-03-09,F\n",
    )
    .expect("trimmed fixture written");
    ops::ingest(&database, Some(&trimmed), None, true).expect("clear ingest");

    let db = RosterDb::open(&database).expect("database opened");
    let roster = db.roster(RosterFilter::default()).expect("roster listed");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].last, "Doe");
}

#[test]
fn merge_clear_unlinks_everything() {
    let dir = tempdir().expect("temporary directory");
    let database = dir.path().join("roster.db");
    ops::ingest(
        &database,
        Some(&write_ts_csv(&dir)),
        Some(&write_usatf_csv(&dir)),
        false,
    )
    .expect("ingest");

    let mut console = ScriptedConsole::new(&["1"]);
    ops::merge_usatf(&database, &mut console, false).expect("merge");

    let mut console = ScriptedConsole::new(&[]);
    ops::merge_usatf(&database, &mut console, true).expect("clear");

    let db = RosterDb::open(&database).expect("database opened");
    let unmatched = db
        .roster(RosterFilter {
            exclude_coaches: false,
            exclude_matched: true,
        })
        .expect("roster listed");
    assert_eq!(unmatched.len(), 3);
}
