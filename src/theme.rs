use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use std::str::FromStr;

/// A complete built-in color palette
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Theme {
    pub(crate) no_activity: &'static str,
    /// Colors for activity levels 1 and up, in increasing order of intensity
    pub(crate) activity: &'static [&'static str],
    pub(crate) text: &'static str,
    pub(crate) title: &'static str,
    pub(crate) months: &'static str,
    pub(crate) weekdays: &'static str,
    pub(crate) total_count: &'static str,
    pub(crate) legend: &'static str,
    pub(crate) background: &'static str,
    pub(crate) calendar_background: &'static str,
    pub(crate) border: &'static str,
    pub(crate) hover: &'static str,
    pub(crate) loading: &'static str,
    pub(crate) error: &'static str,
    pub(crate) no_data: &'static str,
}

pub(crate) const DEFAULT: Theme = Theme {
    no_activity: "#161B22",
    activity: &["#0E4429", "#006D32", "#26A641", "#39D353"],
    text: "#ffffff",
    title: "#ffffff",
    months: "#ffffff",
    weekdays: "#ffffff",
    total_count: "#ffffff",
    legend: "#ffffff",
    background: "#101828",
    calendar_background: "#101828",
    border: "transparent",
    hover: "#ffffff",
    loading: "#ffffff",
    error: "#ff6b6b",
    no_data: "#ffffff",
};

pub(crate) const PURPLE_CYAN: Theme = Theme {
    no_activity: "#2d1b69",
    activity: &["#8b5cf6", "#a855f7", "#c084fc", "#f87171"],
    text: "#00d4ff",
    title: "#00d4ff",
    months: "#00d4ff",
    weekdays: "#00d4ff",
    total_count: "#00d4ff",
    legend: "#00d4ff",
    background: "#1a1a2e",
    calendar_background: "#16213e",
    border: "#0f3460",
    hover: "#e94560",
    loading: "#00d4ff",
    error: "#ff6b6b",
    no_data: "#00d4ff",
};

pub(crate) const RAINBOW: Theme = Theme {
    no_activity: "#2d1b69",
    activity: &["#ff6b6b", "#ffa726", "#66bb6a", "#42a5f5"],
    text: "#f7f1e3",
    title: "#ffd93d",
    months: "#4caf50",
    weekdays: "#2196f3",
    total_count: "#f44336",
    legend: "#ff9800",
    background: "#1a1a2e",
    calendar_background: "#16213e",
    border: "#0f3460",
    hover: "#e94560",
    loading: "#ff6b6b",
    error: "#ff4757",
    no_data: "#ffa502",
};

pub(crate) const OCEAN: Theme = Theme {
    no_activity: "#0f1419",
    activity: &["#006994", "#0099cc", "#00bfff", "#87ceeb"],
    text: "#e0f6ff",
    title: "#00bfff",
    months: "#87ceeb",
    weekdays: "#00bfff",
    total_count: "#e0f6ff",
    legend: "#87ceeb",
    background: "#0a0f14",
    calendar_background: "#0f1419",
    border: "#006994",
    hover: "#00bfff",
    loading: "#00bfff",
    error: "#ff6b6b",
    no_data: "#87ceeb",
};

pub(crate) const SUNSET: Theme = Theme {
    no_activity: "#2c1810",
    activity: &["#ff6b35", "#f7931e", "#ffd23f", "#ff6b9d"],
    text: "#fff5e6",
    title: "#ff6b35",
    months: "#f7931e",
    weekdays: "#ffd23f",
    total_count: "#ff6b9d",
    legend: "#ff6b35",
    background: "#1a0f0a",
    calendar_background: "#2c1810",
    border: "#ff6b35",
    hover: "#f7931e",
    loading: "#ff6b35",
    error: "#ff4757",
    no_data: "#ffd23f",
};

pub(crate) const FOREST: Theme = Theme {
    no_activity: "#1a2f1a",
    activity: &["#2d5016", "#4a7c59", "#6b8e23", "#9acd32"],
    text: "#e8f5e8",
    title: "#9acd32",
    months: "#6b8e23",
    weekdays: "#4a7c59",
    total_count: "#2d5016",
    legend: "#9acd32",
    background: "#0f1a0f",
    calendar_background: "#1a2f1a",
    border: "#2d5016",
    hover: "#6b8e23",
    loading: "#9acd32",
    error: "#ff6b6b",
    no_data: "#6b8e23",
};

pub(crate) const MIDNIGHT: Theme = Theme {
    no_activity: "#0a0a0a",
    activity: &["#1a1a2e", "#16213e", "#0f3460", "#533483"],
    text: "#e0e0e0",
    title: "#533483",
    months: "#0f3460",
    weekdays: "#16213e",
    total_count: "#1a1a2e",
    legend: "#533483",
    background: "#000000",
    calendar_background: "#0a0a0a",
    border: "#1a1a2e",
    hover: "#533483",
    loading: "#533483",
    error: "#ff6b6b",
    no_data: "#0f3460",
};

pub(crate) const CANDY: Theme = Theme {
    no_activity: "#2d1b3d",
    activity: &["#ff69b4", "#ff1493", "#ff69b4", "#ff1493"],
    text: "#ffe6f2",
    title: "#ff69b4",
    months: "#ff1493",
    weekdays: "#ff69b4",
    total_count: "#ff1493",
    legend: "#ff69b4",
    background: "#1a0f1a",
    calendar_background: "#2d1b3d",
    border: "#ff69b4",
    hover: "#ff1493",
    loading: "#ff69b4",
    error: "#ff6b6b",
    no_data: "#ff1493",
};

pub(crate) const MATRIX: Theme = Theme {
    no_activity: "#0a0a0a",
    activity: &["#00ff00", "#00cc00", "#009900", "#006600"],
    text: "#00ff00",
    title: "#00ff00",
    months: "#00ff00",
    weekdays: "#00ff00",
    total_count: "#00ff00",
    legend: "#00ff00",
    background: "#000000",
    calendar_background: "#0a0a0a",
    border: "#00ff00",
    hover: "#00cc00",
    loading: "#00ff00",
    error: "#ff0000",
    no_data: "#00ff00",
};

// Quartz, slate, steel, iron, ink & coal
pub(crate) const MASCULINE: Theme = Theme {
    no_activity: "#E9DFD3",
    activity: &["#ABBAAF", "#667F91", "#D8DCDB", "#14293C", "#000000"],
    text: "#14293C",
    title: "#000000",
    months: "#14293C",
    weekdays: "#667F91",
    total_count: "#000000",
    legend: "#667F91",
    background: "#E9DFD3",
    calendar_background: "#F5F1EB",
    border: "#ABBAAF",
    hover: "#14293C",
    loading: "#667F91",
    error: "#8B0000",
    no_data: "#667F91",
};

pub(crate) const DEEP_FOREST: Theme = Theme {
    no_activity: "#BDD1BD",
    activity: &["#85B093", "#568F7C", "#326D6C", "#173C4C", "#07142B"],
    text: "#07142B",
    title: "#000009",
    months: "#07142B",
    weekdays: "#173C4C",
    total_count: "#000009",
    legend: "#173C4C",
    background: "#BDD1BD",
    calendar_background: "#E8F0E8",
    border: "#85B093",
    hover: "#07142B",
    loading: "#173C4C",
    error: "#8B0000",
    no_data: "#173C4C",
};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum ThemeName {
    #[default]
    Default,
    PurpleCyan,
    Rainbow,
    Ocean,
    Sunset,
    Forest,
    Midnight,
    Candy,
    Matrix,
    Masculine,
    DeepForest,
}

impl ThemeName {
    pub(crate) const ALL: [ThemeName; 11] = [
        ThemeName::Default,
        ThemeName::PurpleCyan,
        ThemeName::Rainbow,
        ThemeName::Ocean,
        ThemeName::Sunset,
        ThemeName::Forest,
        ThemeName::Midnight,
        ThemeName::Candy,
        ThemeName::Matrix,
        ThemeName::Masculine,
        ThemeName::DeepForest,
    ];

    pub(crate) fn token(self) -> &'static str {
        match self {
            ThemeName::Default => "default",
            ThemeName::PurpleCyan => "purple-cyan",
            ThemeName::Rainbow => "rainbow",
            ThemeName::Ocean => "ocean",
            ThemeName::Sunset => "sunset",
            ThemeName::Forest => "forest",
            ThemeName::Midnight => "midnight",
            ThemeName::Candy => "candy",
            ThemeName::Matrix => "matrix",
            ThemeName::Masculine => "masculine",
            ThemeName::DeepForest => "deep-forest",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<ThemeName> {
        ThemeName::ALL.into_iter().find(|name| name.token() == token)
    }

    pub(crate) fn theme(self) -> &'static Theme {
        match self {
            ThemeName::Default => &DEFAULT,
            ThemeName::PurpleCyan => &PURPLE_CYAN,
            ThemeName::Rainbow => &RAINBOW,
            ThemeName::Ocean => &OCEAN,
            ThemeName::Sunset => &SUNSET,
            ThemeName::Forest => &FOREST,
            ThemeName::Midnight => &MIDNIGHT,
            ThemeName::Candy => &CANDY,
            ThemeName::Matrix => &MATRIX,
            ThemeName::Masculine => &MASCULINE,
            ThemeName::DeepForest => &DEEP_FOREST,
        }
    }
}

/// Caller-supplied colors that take precedence over the selected theme.
/// Empty values count as absent.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct ColorOverrides {
    pub(crate) no_activity: Option<String>,
    pub(crate) activity: Option<Vec<String>>,
    pub(crate) text: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) months: Option<String>,
    pub(crate) weekdays: Option<String>,
    pub(crate) total_count: Option<String>,
    pub(crate) legend: Option<String>,
    pub(crate) background: Option<String>,
    pub(crate) calendar_background: Option<String>,
    pub(crate) border: Option<String>,
    pub(crate) hover: Option<String>,
    pub(crate) loading: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) no_data: Option<String>,
}

/// The colors actually used for drawing
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Palette {
    pub(crate) no_activity: String,
    pub(crate) activity: Vec<String>,
    pub(crate) text: String,
    pub(crate) title: String,
    pub(crate) months: String,
    pub(crate) weekdays: String,
    pub(crate) total_count: String,
    pub(crate) legend: String,
    pub(crate) background: String,
    pub(crate) calendar_background: String,
    pub(crate) border: String,
    pub(crate) hover: String,
    pub(crate) loading: String,
    pub(crate) error: String,
    pub(crate) no_data: String,
}

impl Palette {
    /// Resolves the palette for the theme named `token` (falling back to the
    /// default theme for unknown names) with `overrides` layered on top
    pub(crate) fn resolve(token: &str, overrides: &ColorOverrides) -> Palette {
        let theme = ThemeName::from_token(token).unwrap_or_default().theme();
        let pick = |over: &Option<String>, base: &str| match over.as_deref() {
            Some(s) if !s.is_empty() => s.to_owned(),
            _ => base.to_owned(),
        };
        let activity = match overrides.activity.as_deref() {
            Some(colors) if !colors.is_empty() => colors.to_vec(),
            _ => theme.activity.iter().map(|&s| s.to_owned()).collect(),
        };
        Palette {
            no_activity: pick(&overrides.no_activity, theme.no_activity),
            activity,
            text: pick(&overrides.text, theme.text),
            title: pick(&overrides.title, theme.title),
            months: pick(&overrides.months, theme.months),
            weekdays: pick(&overrides.weekdays, theme.weekdays),
            total_count: pick(&overrides.total_count, theme.total_count),
            legend: pick(&overrides.legend, theme.legend),
            background: pick(&overrides.background, theme.background),
            calendar_background: pick(&overrides.calendar_background, theme.calendar_background),
            border: pick(&overrides.border, theme.border),
            hover: pick(&overrides.hover, theme.hover),
            loading: pick(&overrides.loading, theme.loading),
            error: pick(&overrides.error, theme.error),
            no_data: pick(&overrides.no_data, theme.no_data),
        }
    }

    /// Returns the color for an activity level.  Levels past the end of the
    /// activity list use its last color.
    pub(crate) fn level_color(&self, level: u8) -> &str {
        match usize::from(level).checked_sub(1) {
            None => self.no_activity.as_str(),
            Some(i) => self
                .activity
                .get(i.min(self.activity.len().saturating_sub(1)))
                .map_or(self.no_activity.as_str(), String::as_str),
        }
    }

    /// Style for ordinary text drawn over the widget background
    pub(crate) fn base_style(&self) -> Style {
        with_bg(fg(&self.text), &self.background)
    }
}

/// Converts a palette value to a terminal color.  "transparent" and
/// unrecognized values yield `None`.
pub(crate) fn parse_color(s: &str) -> Option<Color> {
    if s.eq_ignore_ascii_case("transparent") {
        None
    } else {
        Color::from_str(s.trim()).ok()
    }
}

pub(crate) fn fg(color: &str) -> Style {
    match parse_color(color) {
        Some(c) => Style::new().fg(c),
        None => Style::new(),
    }
}

pub(crate) fn with_bg(style: Style, color: &str) -> Style {
    match parse_color(color) {
        Some(c) => style.bg(c),
        None => style,
    }
}

pub(crate) fn bold(style: Style) -> Style {
    style.add_modifier(Modifier::BOLD)
}
