use crate::activity::derive_series;
use crate::config::WidgetOptions;
use crate::fetch::{FetchCache, QueryKey, QueryState, SubmissionSource};
use crate::heatmap::{Heatmap, HeatmapState};
use crate::help::Help;
use crate::labels::LabelSet;
use crate::size::CellMetrics;
use crate::theme::{fg, Palette, ThemeName};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Margin, Rect},
    style::Style,
    widgets::{Paragraph, StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tracing::{debug, warn};

/// How long to wait for input before checking on a running fetch
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub(crate) struct App<S> {
    options: WidgetOptions,
    palette: Palette,
    labels: LabelSet,
    metrics: CellMetrics,
    cache: FetchCache<S>,
    key: QueryKey,
    // Consulted on every draw so that the yearly range follows the date
    today: fn() -> Date,
    heatmap: HeatmapState,
    state: AppState,
}

impl<S: SubmissionSource> App<S> {
    pub(crate) fn new(
        options: WidgetOptions,
        cache: FetchCache<S>,
        today: fn() -> Date,
    ) -> App<S> {
        if ThemeName::from_token(&options.ui).is_none() {
            warn!(ui = %options.ui, "unknown theme; using the default theme");
        }
        let palette = Palette::resolve(&options.ui, &options.colors);
        let labels = LabelSet::resolve(&options.labels);
        let metrics = CellMetrics::from(options.size.resolve());
        let key = QueryKey::new(options.username.clone(), options.graph);
        App {
            options,
            palette,
            labels,
            metrics,
            cache,
            key,
            today,
            heatmap: HeatmapState::new(),
            state: AppState::Viewing,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        self.cache.mount(&self.key);
        while !self.quitting() {
            self.draw(&mut terminal)?;
            self.wait()?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    // Blocks until there is something new to draw
    fn wait(&mut self) -> io::Result<()> {
        loop {
            if event::poll(POLL_INTERVAL)? {
                let ev = event::read()?;
                self.handle_event(&ev)?;
                return Ok(());
            }
            if self.cache.is_pending() && self.cache.poll() {
                return Ok(());
            }
        }
    }

    fn handle_event(&mut self, ev: &Event) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = *ev
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize and anything else
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Viewing => {
                match key {
                    KeyCode::Char('h') | KeyCode::Left => self.heatmap.previous_week(),
                    KeyCode::Char('l') | KeyCode::Right => self.heatmap.next_week(),
                    KeyCode::Char('k') | KeyCode::Up => self.heatmap.previous_day(),
                    KeyCode::Char('j') | KeyCode::Down => self.heatmap.next_day(),
                    KeyCode::Char('0') | KeyCode::Home => self.heatmap.first_day(),
                    KeyCode::Char('$') | KeyCode::End => self.heatmap.last_day(),
                    KeyCode::Char('r') => {
                        debug!(username = %self.key.username, "refetch requested");
                        self.cache.refetch(&self.key);
                    }
                    KeyCode::Char('?') => self.state = AppState::Helping,
                    KeyCode::Char('q') | KeyCode::Esc => self.state = AppState::Quitting,
                    _ => return false,
                }
                true
            }
            AppState::Helping => {
                self.state = AppState::Viewing;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn message(&self, area: Rect, buf: &mut Buffer, text: String, style: Style) {
        let inner = area.inner(Margin::new(self.metrics.padding_x, self.metrics.padding_y));
        Paragraph::new(text).style(style).render(inner, buf);
    }
}

impl<S: SubmissionSource> Widget for &mut App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.palette.base_style());
        match self.cache.state(&self.key) {
            None | Some(QueryState::Loading) => self.message(
                area,
                buf,
                String::from("Loading..."),
                fg(&self.palette.loading),
            ),
            Some(QueryState::Failed(msg)) => {
                self.message(area, buf, format!("Error: {msg}"), fg(&self.palette.error));
            }
            Some(QueryState::Ready(records)) => {
                let series = derive_series(
                    self.options.graph,
                    records,
                    self.options.start_date.as_deref(),
                    (self.today)(),
                );
                let mut heatmap = Heatmap::new(&series, &self.palette, &self.labels, self.metrics);
                if self.options.show_title {
                    heatmap = heatmap.title(self.options.graph.title());
                }
                heatmap.render(area, buf, &mut self.heatmap);
            }
        }
        if self.state == AppState::Helping {
            Help {
                style: self.palette.base_style(),
                border_style: fg(&self.palette.border),
            }
            .render(area, buf);
        }
    }
}

/// The current UTC calendar date
pub(crate) fn utc_today() -> Date {
    OffsetDateTime::now_utc().date()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Viewing,
    Helping,
    Quitting,
}
