use super::YMD_FMT;
use std::iter::successors;
use time::{Date, Duration};
use tracing::warn;

/// An inclusive span of calendar days covering exactly one year
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Computes the one-year range starting at `start_date`, or at one year
    /// before `today` if `start_date` is absent or not a valid `YYYY-MM-DD`
    /// date.
    pub(crate) fn normalize(start_date: Option<&str>, today: Date) -> DateRange {
        let start = start_date
            .and_then(|s| match Date::parse(s, &YMD_FMT) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!(
                        start_date = s,
                        error = %e,
                        "invalid start date, expected YYYY-MM-DD; falling back to one year before today"
                    );
                    None
                }
            })
            .unwrap_or_else(|| shift_years(today, -1).unwrap_or(today));
        DateRange::starting_at(start)
    }

    pub(crate) fn starting_at(start: Date) -> DateRange {
        // Add a year, then step back a day, so that a range starting on Feb 29
        // ends on Feb 28 rather than spilling into March.
        let end = shift_years(start, 1)
            .and_then(Date::previous_day)
            .unwrap_or(start);
        DateRange { start, end }
    }

    pub(crate) fn start(&self) -> Date {
        self.start
    }

    pub(crate) fn end(&self) -> Date {
        self.end
    }

    /// Iterates over every day in the range in ascending order
    pub(crate) fn days(&self) -> impl Iterator<Item = Date> {
        let end = self.end;
        successors(Some(self.start), |&d| d.next_day()).take_while(move |&d| d <= end)
    }

    pub(crate) fn len(&self) -> usize {
        let days = (self.end - self.start).whole_days().saturating_add(1);
        usize::try_from(days).unwrap_or_default()
    }
}

// Moves a date by whole calendar years, keeping the month and day.  A Feb 29
// that lands on a non-leap year becomes Mar 1.
fn shift_years(date: Date, years: i32) -> Option<Date> {
    let year = date.year().checked_add(years)?;
    match Date::from_calendar_date(year, date.month(), date.day()) {
        Ok(d) => Some(d),
        Err(_) => {
            let overflow = i64::from(date.day().saturating_sub(28));
            Date::from_calendar_date(year, date.month(), 28)
                .ok()?
                .checked_add(Duration::days(overflow))
        }
    }
}
