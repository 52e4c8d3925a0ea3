mod merge;
mod range;
pub(crate) use self::merge::merge;
pub(crate) use self::range::DateRange;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date};
use tracing::debug;

pub(crate) static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Highest activity level; counts above this share its color
pub(crate) const MAX_LEVEL: u8 = 4;

/// One day's worth of submissions
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ActivityRecord {
    /// Calendar date in `YYYY-MM-DD` form
    pub(crate) date: String,
    pub(crate) count: u64,
    /// Quantized count in `0..=MAX_LEVEL`
    pub(crate) level: u8,
}

impl ActivityRecord {
    pub(crate) fn new<S: Into<String>>(date: S, count: u64) -> ActivityRecord {
        ActivityRecord {
            date: date.into(),
            count,
            level: level_for(count),
        }
    }

    pub(crate) fn empty<S: Into<String>>(date: S) -> ActivityRecord {
        ActivityRecord::new(date, 0)
    }

    pub(crate) fn parse_date(&self) -> Option<Date> {
        Date::parse(&self.date, &YMD_FMT).ok()
    }
}

pub(crate) fn level_for(count: u64) -> u8 {
    u8::try_from(count.min(u64::from(MAX_LEVEL))).unwrap_or(MAX_LEVEL)
}

/// Formats a date as `YYYY-MM-DD`
pub(crate) fn ymd(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum GraphMode {
    /// Show the fetched days as-is
    #[default]
    Default,
    /// Show exactly one year, with missing days filled in
    Yearly,
}

impl GraphMode {
    pub(crate) fn title(self) -> &'static str {
        match self {
            GraphMode::Default => "LeetCode Submissions",
            GraphMode::Yearly => "Last Year's LeetCode Submissions",
        }
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphMode::Default => write!(f, "default"),
            GraphMode::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for GraphMode {
    type Err = ParseGraphModeError;

    fn from_str(s: &str) -> Result<GraphMode, ParseGraphModeError> {
        match s {
            "default" => Ok(GraphMode::Default),
            "yearly" => Ok(GraphMode::Yearly),
            _ => Err(ParseGraphModeError),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error(r#"invalid graph mode; expected "default" or "yearly""#)]
pub(crate) struct ParseGraphModeError;

/// Produces the series that gets drawn for one render pass.
///
/// In yearly mode the fetched records are laid over a gap-free year starting
/// at `start_date` (or one year before `today`); otherwise they are returned
/// untouched, in fetch order.
pub(crate) fn derive_series(
    graph: GraphMode,
    records: &[ActivityRecord],
    start_date: Option<&str>,
    today: Date,
) -> Vec<ActivityRecord> {
    match graph {
        GraphMode::Default => records.to_vec(),
        GraphMode::Yearly => {
            let range = DateRange::normalize(start_date, today);
            debug!(
                start = %ymd(range.start()),
                end = %ymd(range.end()),
                fetched = records.len(),
                "laying fetched days over yearly range"
            );
            merge(range, records)
        }
    }
}

pub(crate) fn total_count(series: &[ActivityRecord]) -> u64 {
    series
        .iter()
        .fold(0u64, |total, rec| total.saturating_add(rec.count))
}
