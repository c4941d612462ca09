//! Identity reconciliation between roster entries and USATF records.

use crate::model::{MatchSet, RosterEntry, UsatfRecord};

/// Searches the USATF candidate pool for records matching a roster entry.
///
/// An exact match agrees on last name, first name, birthdate, and gender. A
/// partial match agrees on at least one of last name, first name, or
/// birthdate; gender alone is too coarse to suggest a candidate. The pool is
/// keyed by membership number upstream, so no candidate appears twice.
pub fn find_matches(runner: &RosterEntry, pool: &[UsatfRecord]) -> MatchSet {
    let mut matches = MatchSet::default();
    for record in pool {
        let last = record.last == runner.last;
        let first = record.first == runner.first;
        let dob = record.dob == runner.dob;
        if last && first && dob && record.gender == runner.gender {
            matches.exact.push(record.clone());
        } else if last || first || dob {
            matches.partial.push(record.clone());
        }
    }
    matches
}
