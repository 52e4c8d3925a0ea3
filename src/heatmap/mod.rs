mod widget;
pub(crate) use self::widget::Heatmap;
use crate::activity::ActivityRecord;
use std::slice::Chunks;

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// Splits a series into consecutive runs of seven days.  The last run is
/// shorter if the series length is not a multiple of seven.  No attempt is
/// made to line the runs up with any particular weekday.
pub(crate) fn weeks(series: &[ActivityRecord]) -> Chunks<'_, ActivityRecord> {
    series.chunks(DAYS_IN_WEEK)
}

/// Cursor position and horizontal scroll offset of a `Heatmap`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct HeatmapState {
    // Index into the series; values past the end mean "the last day"
    cursor: usize,
    first_week: usize,
}

impl Default for HeatmapState {
    fn default() -> HeatmapState {
        HeatmapState::new()
    }
}

impl HeatmapState {
    pub(crate) fn new() -> HeatmapState {
        HeatmapState {
            cursor: usize::MAX,
            first_week: 0,
        }
    }

    pub(crate) fn previous_day(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn next_day(&mut self) {
        self.cursor = self.cursor.saturating_add(1);
    }

    pub(crate) fn previous_week(&mut self) {
        self.cursor = self.cursor.saturating_sub(DAYS_IN_WEEK);
    }

    pub(crate) fn next_week(&mut self) {
        self.cursor = self.cursor.saturating_add(DAYS_IN_WEEK);
    }

    pub(crate) fn first_day(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn last_day(&mut self) {
        self.cursor = usize::MAX;
    }

    pub(crate) fn first_week(&self) -> usize {
        self.first_week
    }

    /// Clamps the cursor to a series of `days` days and scrolls so that the
    /// cursor's week is among the `capacity` weeks shown.  Returns the
    /// cursor's index, or `None` if the series is empty.
    pub(crate) fn fit(&mut self, days: usize, capacity: usize) -> Option<usize> {
        if days == 0 {
            self.first_week = 0;
            return None;
        }
        self.cursor = self.cursor.min(days - 1);
        let capacity = capacity.max(1);
        let week = self.cursor / DAYS_IN_WEEK;
        if week < self.first_week {
            self.first_week = week;
        } else if week >= self.first_week + capacity {
            self.first_week = week + 1 - capacity;
        }
        let total_weeks = days.div_ceil(DAYS_IN_WEEK);
        self.first_week = self.first_week.min(total_weeks.saturating_sub(capacity));
        Some(self.cursor)
    }
}
