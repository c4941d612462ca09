//! Persistent roster database.
//!
//! A single-file embedded [`redb`] database holds the TeamSnap roster and the
//! USATF membership records across invocations. Records are postcard-encoded;
//! roster entries are keyed by the normalized `(last, first)` name pair and
//! USATF records by membership number.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::Result;
use crate::model::{RosterEntry, TsImportRow, UsatfId, UsatfRecord};

const ROSTER: TableDefinition<&str, &[u8]> = TableDefinition::new("roster");
const USATF: TableDefinition<u32, &[u8]> = TableDefinition::new("usatf");

/// Separator joining last and first name into a roster key. The unit
/// separator never appears in exported names.
const KEY_SEP: char = '\u{1f}';

fn name_key(last: &str, first: &str) -> String {
    format!("{last}{KEY_SEP}{first}")
}

/// Listing options for [`RosterDb::roster`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterFilter {
    pub exclude_coaches: bool,
    pub exclude_matched: bool,
}

/// Handle to the on-disk roster database.
pub struct RosterDb {
    db: Database,
}

impl RosterDb {
    /// Opens the database at `path`, creating the file and tables when
    /// missing.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;
        let write = db.begin_write()?;
        {
            write.open_table(ROSTER)?;
            write.open_table(USATF)?;
        }
        write.commit()?;
        Ok(Self { db })
    }

    /// Inserts imported roster rows. Existing entries keep their USATF link
    /// and coach flag; only the birthdate, gender, and session timestamp are
    /// refreshed.
    pub fn upsert_roster(&self, rows: &[TsImportRow], timestamp: DateTime<Utc>) -> Result<()> {
        let write = self.db.begin_write()?;
        {
            let mut table = write.open_table(ROSTER)?;
            for row in rows {
                let key = name_key(&row.last, &row.first);
                let entry = match table.get(key.as_str())? {
                    Some(existing) => {
                        let mut entry: RosterEntry = postcard::from_bytes(existing.value())?;
                        entry.dob = row.dob;
                        entry.gender = row.gender.clone();
                        entry.updated_at = timestamp;
                        entry
                    }
                    None => RosterEntry::from_import(row, timestamp),
                };
                let encoded = postcard::to_allocvec(&entry)?;
                table.insert(key.as_str(), encoded.as_slice())?;
            }
        }
        write.commit()?;
        Ok(())
    }

    /// Deletes roster entries absent from the given import, returning the
    /// removed `(last, first)` pairs.
    pub fn retain_roster(&self, rows: &[TsImportRow]) -> Result<Vec<(String, String)>> {
        let keep: HashSet<String> = rows
            .iter()
            .map(|row| name_key(&row.last, &row.first))
            .collect();

        let write = self.db.begin_write()?;
        let removed = {
            let mut table = write.open_table(ROSTER)?;
            let mut stale = Vec::new();
            for item in table.iter()? {
                let (key, value) = item?;
                if !keep.contains(key.value()) {
                    let entry: RosterEntry = postcard::from_bytes(value.value())?;
                    stale.push((key.value().to_string(), entry));
                }
            }
            for (key, _) in &stale {
                table.remove(key.as_str())?;
            }
            stale
                .into_iter()
                .map(|(_, entry)| (entry.last, entry.first))
                .collect()
        };
        write.commit()?;
        Ok(removed)
    }

    /// Lists roster entries ordered by `(last, first)`.
    pub fn roster(&self, filter: RosterFilter) -> Result<Vec<RosterEntry>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(ROSTER)?;
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let entry: RosterEntry = postcard::from_bytes(value.value())?;
            if filter.exclude_coaches && entry.is_coach {
                continue;
            }
            if filter.exclude_matched && entry.usatf_id.is_some() {
                continue;
            }
            entries.push(entry);
        }
        entries.sort_by(|lhs, rhs| lhs.last.cmp(&rhs.last).then_with(|| lhs.first.cmp(&rhs.first)));
        Ok(entries)
    }

    /// Sets or clears the coach flag for one entry. Returns false when no
    /// entry matches the name pair.
    pub fn set_coach(&self, last: &str, first: &str, is_coach: bool) -> Result<bool> {
        self.update_entry(last, first, |entry| entry.is_coach = is_coach)
    }

    /// Links one entry to a USATF membership number. Returns false when no
    /// entry matches the name pair.
    pub fn set_usatf_id(&self, last: &str, first: &str, usatf_id: UsatfId) -> Result<bool> {
        self.update_entry(last, first, |entry| entry.usatf_id = Some(usatf_id))
    }

    /// Clears every coach flag, returning the number of entries changed.
    pub fn clear_coaches(&self) -> Result<usize> {
        self.rewrite_roster(|entry| {
            if entry.is_coach {
                entry.is_coach = false;
                true
            } else {
                false
            }
        })
    }

    /// Unlinks every USATF match, returning the number of entries changed.
    pub fn clear_matches(&self) -> Result<usize> {
        self.rewrite_roster(|entry| {
            if entry.usatf_id.is_some() {
                entry.usatf_id = None;
                true
            } else {
                false
            }
        })
    }

    /// Inserts or replaces USATF records keyed by membership number.
    pub fn upsert_usatf(&self, records: &[UsatfRecord]) -> Result<()> {
        let write = self.db.begin_write()?;
        {
            let mut table = write.open_table(USATF)?;
            for record in records {
                let encoded = postcard::to_allocvec(record)?;
                table.insert(record.usatf_id, encoded.as_slice())?;
            }
        }
        write.commit()?;
        Ok(())
    }

    /// Lists every USATF record ordered by `(last, first, usatf_id)` — the
    /// candidate pool for matching.
    pub fn usatf_records(&self) -> Result<Vec<UsatfRecord>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(USATF)?;
        let mut records = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            records.push(postcard::from_bytes::<UsatfRecord>(value.value())?);
        }
        records.sort_by(|lhs, rhs| {
            lhs.last
                .cmp(&rhs.last)
                .then_with(|| lhs.first.cmp(&rhs.first))
                .then_with(|| lhs.usatf_id.cmp(&rhs.usatf_id))
        });
        Ok(records)
    }

    /// Maps membership numbers to their records, for the export join.
    pub fn usatf_by_id(&self) -> Result<BTreeMap<UsatfId, UsatfRecord>> {
        let read = self.db.begin_read()?;
        let table = read.open_table(USATF)?;
        let mut records = BTreeMap::new();
        for item in table.iter()? {
            let (key, value) = item?;
            records.insert(key.value(), postcard::from_bytes::<UsatfRecord>(value.value())?);
        }
        Ok(records)
    }

    fn update_entry(
        &self,
        last: &str,
        first: &str,
        apply: impl FnOnce(&mut RosterEntry),
    ) -> Result<bool> {
        let write = self.db.begin_write()?;
        let found = {
            let mut table = write.open_table(ROSTER)?;
            let key = name_key(last, first);
            let current = match table.get(key.as_str())? {
                Some(value) => Some(postcard::from_bytes::<RosterEntry>(value.value())?),
                None => None,
            };
            match current {
                Some(mut entry) => {
                    apply(&mut entry);
                    let encoded = postcard::to_allocvec(&entry)?;
                    table.insert(key.as_str(), encoded.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write.commit()?;
        Ok(found)
    }

    fn rewrite_roster(&self, mut apply: impl FnMut(&mut RosterEntry) -> bool) -> Result<usize> {
        let write = self.db.begin_write()?;
        let changed = {
            let mut table = write.open_table(ROSTER)?;
            let mut updates = Vec::new();
            for item in table.iter()? {
                let (key, value) = item?;
                let mut entry: RosterEntry = postcard::from_bytes(value.value())?;
                if apply(&mut entry) {
                    updates.push((key.value().to_string(), postcard::to_allocvec(&entry)?));
                }
            }
            for (key, encoded) in &updates {
                table.insert(key.as_str(), encoded.as_slice())?;
            }
            updates.len()
        };
        write.commit()?;
        Ok(changed)
    }
}
