use super::{ymd, ActivityRecord, DateRange};
use std::collections::HashMap;

/// Builds one record per day of `range`, ascending, taking the count and
/// level of the first record in `sparse` with the same date string and
/// defaulting to zero activity otherwise.
///
/// The matched record's `level` is copied as-is rather than recomputed from
/// its `count`.  Records outside of `range` are ignored.
pub(crate) fn merge(range: DateRange, sparse: &[ActivityRecord]) -> Vec<ActivityRecord> {
    let mut by_date = HashMap::with_capacity(sparse.len());
    for rec in sparse {
        by_date.entry(rec.date.as_str()).or_insert(rec);
    }
    let mut series = Vec::with_capacity(range.len());
    for day in range.days() {
        let date = ymd(day);
        let found = by_date.get(date.as_str()).copied();
        series.push(match found {
            Some(rec) => ActivityRecord {
                date,
                count: rec.count,
                level: rec.level,
            },
            None => ActivityRecord::empty(date),
        });
    }
    series
}
