use super::{weeks, HeatmapState, DAYS_IN_WEEK};
use crate::activity::{total_count, ActivityRecord};
use crate::labels::LabelSet;
use crate::size::CellMetrics;
use crate::theme::{bold, fg, with_bg, Palette};
use ratatui::{
    buffer::Buffer,
    layout::{Margin, Rect},
    style::Style,
    text::{Span, Text},
    widgets::{Paragraph, StatefulWidget, Widget},
};

pub(crate) static NO_DATA: &str = "No data available for the given username.";

const SQUARE: char = '█';

/// Number of activity levels shown in the legend
const LEGEND_LEVELS: u8 = 5;

/// Draws a series of days as a grid of colored squares, one column per week,
/// followed by the total count, a legend, and the details of the day under
/// the cursor
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Heatmap<'a> {
    series: &'a [ActivityRecord],
    palette: &'a Palette,
    labels: &'a LabelSet,
    metrics: CellMetrics,
    title: Option<&'a str>,
}

impl<'a> Heatmap<'a> {
    pub(crate) fn new(
        series: &'a [ActivityRecord],
        palette: &'a Palette,
        labels: &'a LabelSet,
        metrics: CellMetrics,
    ) -> Heatmap<'a> {
        Heatmap {
            series,
            palette,
            labels,
            metrics,
            title: None,
        }
    }

    pub(crate) fn title(mut self, title: &'a str) -> Heatmap<'a> {
        self.title = Some(title);
        self
    }

    fn weekday_labels(&self) -> Vec<String> {
        self.labels
            .weekdays
            .iter()
            .take(DAYS_IN_WEEK)
            .map(|s| s.chars().take(self.metrics.weekday_chars).collect())
            .collect()
    }
}

impl StatefulWidget for Heatmap<'_> {
    type State = HeatmapState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let m = self.metrics;
        buf.set_style(area, self.palette.base_style());
        let inner = area.inner(Margin::new(m.padding_x, m.padding_y));
        let mut canvas = BufferCanvas::new(inner, buf);
        let mut y = 0;
        if let Some(title) = self.title {
            canvas.print_centered(y, title, bold(fg(&self.palette.title)));
            y = y.saturating_add(m.title_lines);
        }
        if self.series.is_empty() {
            canvas.mvprint(y, 0, NO_DATA, fg(&self.palette.no_data));
            return;
        }

        let weekday_labels = self.weekday_labels();
        let label_width = weekday_labels
            .iter()
            .map(|s| text_width(s))
            .max()
            .unwrap_or(0);
        let grid_x = if label_width == 0 {
            0
        } else {
            label_width.saturating_add(1)
        };
        let pitch = m.square_width.saturating_add(m.column_gap).max(1);
        let capacity = usize::from(
            inner
                .width
                .saturating_sub(grid_x)
                .saturating_add(m.column_gap)
                / pitch,
        )
        .max(1);
        let cursor = state.fit(self.series.len(), capacity);
        let first_week = state.first_week();
        let week_x = |wi: usize| grid_x.saturating_add(to_u16(wi - first_week).saturating_mul(pitch));

        // Month names go above the first shown week of each month.
        let months_style = fg(&self.palette.months);
        let mut prev_month = None;
        let mut next_free = 0;
        for (wi, week) in weeks(self.series)
            .enumerate()
            .skip(first_week)
            .take(capacity)
        {
            let Some(month) = week
                .first()
                .and_then(ActivityRecord::parse_date)
                .map(|d| d.month())
            else {
                continue;
            };
            if prev_month == Some(month) {
                continue;
            }
            prev_month = Some(month);
            let x = week_x(wi);
            if x < next_free {
                continue;
            }
            if let Some(label) = self.labels.month(u8::from(month)) {
                canvas.mvprint(y, x, label, months_style);
                next_free = x.saturating_add(text_width(label)).saturating_add(1);
            }
        }
        let grid_y = y.saturating_add(1);

        let row_pitch = m.square_height.saturating_add(m.row_gap);
        let weekdays_style = fg(&self.palette.weekdays);
        for (di, label) in std::iter::zip(0u16.., &weekday_labels) {
            canvas.mvprint(
                grid_y.saturating_add(di.saturating_mul(row_pitch)),
                0,
                label,
                weekdays_style,
            );
        }

        let grid_height = row_pitch
            .saturating_mul(to_u16(DAYS_IN_WEEK))
            .saturating_sub(m.row_gap);
        let shown_weeks = capacity.min(weeks(self.series).len().saturating_sub(first_week));
        let grid_width = pitch
            .saturating_mul(to_u16(shown_weeks))
            .saturating_sub(m.column_gap);
        let calendar_style = with_bg(Style::new(), &self.palette.calendar_background);
        canvas.set_style(grid_y, grid_x, grid_width, grid_height, calendar_style);
        for (wi, week) in weeks(self.series)
            .enumerate()
            .skip(first_week)
            .take(capacity)
        {
            let x = week_x(wi);
            for (di, rec) in week.iter().enumerate() {
                let color = if cursor == Some(wi * DAYS_IN_WEEK + di) {
                    self.palette.hover.as_str()
                } else {
                    self.palette.level_color(rec.level)
                };
                canvas.fill(
                    grid_y.saturating_add(to_u16(di).saturating_mul(row_pitch)),
                    x,
                    m.square_width,
                    m.square_height,
                    SQUARE,
                    fg(color),
                );
            }
        }
        y = grid_y.saturating_add(grid_height).saturating_add(1);

        let total = self.labels.total_count_text(total_count(self.series));
        canvas.mvprint(y, 0, &total, bold(fg(&self.palette.total_count)));
        let legend_width = [
            text_width(&self.labels.legend_less),
            m.legend_gap,
            m.square_width
                .saturating_mul(u16::from(LEGEND_LEVELS))
                .saturating_add(m.column_gap.saturating_mul(u16::from(LEGEND_LEVELS - 1))),
            m.legend_gap,
            text_width(&self.labels.legend_more),
        ]
        .into_iter()
        .fold(0u16, u16::saturating_add);
        let beside = text_width(&total)
            .saturating_add(2)
            .saturating_add(legend_width);
        let (legend_y, mut x) = if beside <= inner.width {
            (y, inner.width - legend_width)
        } else {
            (y.saturating_add(1), 0)
        };
        let legend_style = fg(&self.palette.legend);
        canvas.mvprint(legend_y, x, &self.labels.legend_less, legend_style);
        x = x
            .saturating_add(text_width(&self.labels.legend_less))
            .saturating_add(m.legend_gap);
        for level in 0..LEGEND_LEVELS {
            if level > 0 {
                x = x.saturating_add(m.column_gap);
            }
            canvas.fill(
                legend_y,
                x,
                m.square_width,
                1,
                SQUARE,
                fg(self.palette.level_color(level)),
            );
            x = x.saturating_add(m.square_width);
        }
        x = x.saturating_add(m.legend_gap);
        canvas.mvprint(legend_y, x, &self.labels.legend_more, legend_style);
        y = legend_y.saturating_add(2);

        if let Some(rec) = cursor.and_then(|i| self.series.get(i)) {
            canvas.mvprint(
                y,
                0,
                format!("{}: {} submissions", rec.date, rec.count),
                fg(&self.palette.hover),
            );
        }
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn text_width(s: &str) -> u16 {
    to_u16(Span::raw(s).width())
}

/// Drawing helpers with coordinates relative to (and clipped to) an area of a
/// buffer
#[derive(Debug, Eq, PartialEq)]
pub(super) struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    pub(super) fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn mvaddch(&mut self, y: u16, x: u16, ch: char, style: Style) {
        if y < self.area.height && x < self.area.width {
            if let Some(cell) = self.buf.cell_mut((x + self.area.x, y + self.area.y)) {
                cell.set_char(ch).set_style(style);
            }
        }
    }

    pub(super) fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Style) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style);
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // A Paragraph truncates text that extends beyond the area, as long
            // as the Rect it is given lies entirely within the buffer.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    pub(super) fn print_centered<S: AsRef<str>>(&mut self, y: u16, s: S, style: Style) {
        let x = self.area.width.saturating_sub(text_width(s.as_ref())) / 2;
        self.mvprint(y, x, s, style);
    }

    fn fill(&mut self, y: u16, x: u16, width: u16, height: u16, ch: char, style: Style) {
        for dy in 0..height {
            for dx in 0..width {
                self.mvaddch(y.saturating_add(dy), x.saturating_add(dx), ch, style);
            }
        }
    }

    fn set_style(&mut self, y: u16, x: u16, width: u16, height: u16, style: Style) {
        if y < self.area.height && x < self.area.width {
            let rect = Rect {
                x: x + self.area.x,
                y: y + self.area.y,
                width: width.min(self.area.width - x),
                height: height.min(self.area.height - y),
            };
            self.buf.set_style(rect, style);
        }
    }
}
