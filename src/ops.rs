//! Command orchestration: each public function backs one CLI subcommand.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use tracing::{debug, info, instrument, warn};

use crate::console::Console;
use crate::error::{MergeError, Result};
use crate::io;
use crate::io::excel_write;
use crate::matching;
use crate::model::{RosterEntry, TsImportRow, UsatfRecord};
use crate::report;
use crate::store::{RosterDb, RosterFilter};

/// Ingests a TeamSnap roster and/or a USATF membership export into the
/// database under a single session timestamp.
#[instrument(level = "info", skip_all, fields(database = %database.display()))]
pub fn ingest(
    database: &Path,
    ts: Option<&Path>,
    usatf: Option<&Path>,
    clear: bool,
) -> Result<()> {
    let session = Utc::now();
    let db = RosterDb::open(database)?;

    if let Some(path) = ts {
        if !path.exists() {
            return Err(MergeError::MissingInput(path.to_path_buf()));
        }
        println!("Ingesting TeamSnap roster from {}", path.display());
        let rows = io::read_ts_export(path)?;
        warn_duplicates(&rows);
        info!(row_count = rows.len(), "parsed TeamSnap roster rows");
        db.upsert_roster(&rows, session)?;
        if clear {
            let removed = db.retain_roster(&rows)?;
            for (last, first) in &removed {
                println!("Removed entry missing from the new roster: {last}, {first}");
            }
            info!(removed = removed.len(), "cleared stale roster entries");
        }
    }

    if let Some(path) = usatf {
        if !path.exists() {
            return Err(MergeError::MissingInput(path.to_path_buf()));
        }
        println!("Ingesting USATF membership data from {}", path.display());
        let rows = io::read_usatf_export(path)?;
        let total = rows.len();
        let records: Vec<UsatfRecord> = rows
            .iter()
            .filter_map(|row| {
                row.usatf_id
                    .map(|usatf_id| UsatfRecord::from_import(row, usatf_id, session))
            })
            .collect();
        let skipped = total - records.len();
        if skipped > 0 {
            warn!(skipped, "skipped USATF rows without a membership number");
        }
        db.upsert_usatf(&records)?;
        info!(record_count = records.len(), "stored USATF membership records");
    }

    Ok(())
}

/// Walks the roster asking the operator which entries are coaches. With
/// `clear`, resets every flag instead.
#[instrument(level = "info", skip_all, fields(database = %database.display()))]
pub fn assign_coaches(database: &Path, console: &mut dyn Console, clear: bool) -> Result<()> {
    let db = RosterDb::open(database)?;
    if clear {
        let cleared = db.clear_coaches()?;
        println!("Cleared {cleared} coach designations");
        return Ok(());
    }

    for entry in db.roster(RosterFilter::default())? {
        let message = format!(
            "Is {} {} a coach (current: {})? (Y)es, (N)o, (S)kip, (D)one",
            entry.first, entry.last, entry.is_coach
        );
        loop {
            match parse_coach_choice(&console.ask(&message)?) {
                Some(CoachChoice::Yes) => {
                    db.set_coach(&entry.last, &entry.first, true)?;
                    break;
                }
                Some(CoachChoice::No) => {
                    db.set_coach(&entry.last, &entry.first, false)?;
                    break;
                }
                Some(CoachChoice::Skip) => break,
                Some(CoachChoice::Done) => return Ok(()),
                None => {}
            }
        }
    }
    Ok(())
}

/// Matches unmatched non-coach roster entries against the USATF records,
/// linking automatically on a unique exact match and deferring to the
/// operator otherwise. With `clear`, unlinks every match instead.
#[instrument(level = "info", skip_all, fields(database = %database.display()))]
pub fn merge_usatf(database: &Path, console: &mut dyn Console, clear: bool) -> Result<()> {
    let db = RosterDb::open(database)?;
    if clear {
        let cleared = db.clear_matches()?;
        println!("Cleared {cleared} USATF matches");
        return Ok(());
    }

    let pool = db.usatf_records()?;
    let roster = db.roster(RosterFilter {
        exclude_coaches: true,
        exclude_matched: true,
    })?;
    println!("Found {} unmatched runners...", roster.len());
    debug!(pool_size = pool.len(), "loaded USATF candidate pool");

    for runner in roster {
        let matches = matching::find_matches(&runner, &pool);
        if matches.exact.len() == 1 {
            let record = &matches.exact[0];
            println!(
                "Found exact match for {} {} ({}): USATF #{}",
                runner.first, runner.last, runner.dob, record.usatf_id
            );
            db.set_usatf_id(&runner.last, &runner.first, record.usatf_id)?;
        } else if !matches.exact.is_empty() {
            println!(
                "Found multiple exact matches for {} {} ({}):",
                runner.first, runner.last, runner.dob
            );
            if !select_candidate(&db, console, &runner, &matches.exact)? {
                return Ok(());
            }
        } else if !matches.partial.is_empty() {
            println!(
                "Found partial match(es) for {} {} ({}):",
                runner.first, runner.last, runner.dob
            );
            if !select_candidate(&db, console, &runner, &matches.partial)? {
                return Ok(());
            }
        } else {
            println!(
                "No USATF candidates for {} {} ({}), skipping",
                runner.first, runner.last, runner.dob
            );
        }
    }
    Ok(())
}

/// Presents a numbered pick list and links the chosen record. Returns false
/// when the operator is done with the whole merge session.
fn select_candidate(
    db: &RosterDb,
    console: &mut dyn Console,
    runner: &RosterEntry,
    candidates: &[UsatfRecord],
) -> Result<bool> {
    for (index, record) in candidates.iter().enumerate() {
        println!(
            "{}) {}, {}, {}, {}, {}",
            index + 1,
            record.last,
            record.first,
            record.dob,
            record.gender,
            record.usatf_id
        );
    }
    loop {
        match parse_pick_choice(&console.ask("#, (S)kip, (D)one")?, candidates.len()) {
            Some(PickChoice::Pick(index)) => {
                let record = &candidates[index];
                println!("{}", record.usatf_id);
                db.set_usatf_id(&runner.last, &runner.first, record.usatf_id)?;
                return Ok(true);
            }
            Some(PickChoice::Skip) => return Ok(true),
            Some(PickChoice::Done) => return Ok(false),
            None => {}
        }
    }
}

/// Exports the registration workbook, returning the path actually written
/// (an `.xlsx` suffix is added when missing).
#[instrument(level = "info", skip_all, fields(database = %database.display(), output = %output.display()))]
pub fn export_roster(database: &Path, output: &Path, year: Option<i32>) -> Result<PathBuf> {
    let year = year.unwrap_or_else(|| Utc::now().year());
    let output = ensure_xlsx_extension(output);

    let db = RosterDb::open(database)?;
    let roster = db.roster(RosterFilter {
        exclude_coaches: true,
        exclude_matched: false,
    })?;
    let records: BTreeMap<_, _> = db.usatf_by_id()?;
    let rows = report::build_report(&roster, &records, year);
    info!(row_count = rows.len(), year, "registration report built");

    excel_write::write_registration(&output, &rows)?;
    println!("Wrote {}", output.display());
    Ok(output)
}

fn ensure_xlsx_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(OsStr::to_str) {
        Some("xlsx") => path.to_path_buf(),
        _ => {
            let mut raw = path.as_os_str().to_os_string();
            raw.push(".xlsx");
            PathBuf::from(raw)
        }
    }
}

fn warn_duplicates(rows: &[TsImportRow]) {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for row in rows {
        *counts
            .entry((row.last.as_str(), row.first.as_str()))
            .or_insert(0) += 1;
    }
    for ((last, first), count) in counts {
        if count > 1 {
            warn!(last, first, count, "duplicate roster rows; the last occurrence wins");
        }
    }
}

enum CoachChoice {
    Yes,
    No,
    Skip,
    Done,
}

fn parse_coach_choice(reply: &str) -> Option<CoachChoice> {
    match reply.trim().chars().next()?.to_ascii_uppercase() {
        'Y' => Some(CoachChoice::Yes),
        'N' => Some(CoachChoice::No),
        'S' => Some(CoachChoice::Skip),
        'D' => Some(CoachChoice::Done),
        _ => None,
    }
}

enum PickChoice {
    /// Zero-based index into the candidate list.
    Pick(usize),
    Skip,
    Done,
}

fn parse_pick_choice(reply: &str, count: usize) -> Option<PickChoice> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }
    if reply.chars().all(|ch| ch.is_ascii_digit()) {
        let number: usize = reply.parse().ok()?;
        if (1..=count).contains(&number) {
            return Some(PickChoice::Pick(number - 1));
        }
        return None;
    }
    match reply.chars().next()?.to_ascii_uppercase() {
        'S' => Some(PickChoice::Skip),
        'D' => Some(PickChoice::Done),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coach_choices_accept_any_case_prefix() {
        assert!(matches!(parse_coach_choice("y"), Some(CoachChoice::Yes)));
        assert!(matches!(parse_coach_choice("No"), Some(CoachChoice::No)));
        assert!(matches!(parse_coach_choice("skip"), Some(CoachChoice::Skip)));
        assert!(matches!(parse_coach_choice("D"), Some(CoachChoice::Done)));
        assert!(parse_coach_choice("").is_none());
        assert!(parse_coach_choice("x").is_none());
    }

    #[test]
    fn pick_choices_are_one_based_and_bounded() {
        assert!(matches!(parse_pick_choice("1", 3), Some(PickChoice::Pick(0))));
        assert!(matches!(parse_pick_choice("12", 15), Some(PickChoice::Pick(11))));
        assert!(parse_pick_choice("0", 3).is_none());
        assert!(parse_pick_choice("4", 3).is_none());
        assert!(matches!(parse_pick_choice("s", 3), Some(PickChoice::Skip)));
        assert!(matches!(parse_pick_choice("done", 3), Some(PickChoice::Done)));
    }

    #[test]
    fn xlsx_extension_is_appended_when_missing() {
        assert_eq!(
            ensure_xlsx_extension(Path::new("roster")),
            PathBuf::from("roster.xlsx")
        );
        assert_eq!(
            ensure_xlsx_extension(Path::new("roster.xls")),
            PathBuf::from("roster.xls.xlsx")
        );
        assert_eq!(
            ensure_xlsx_extension(Path::new("roster.xlsx")),
            PathBuf::from("roster.xlsx")
        );
    }
}
