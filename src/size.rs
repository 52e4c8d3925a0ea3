use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pixel dimensions for one render of the heat-map
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct SizeConfig {
    pub(crate) square_size: u16,
    pub(crate) font_size: u16,
    pub(crate) padding: u16,
    pub(crate) gap: u16,
    pub(crate) title_size: u16,
    pub(crate) legend_gap: u16,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum SizePreset {
    Small,
    #[default]
    Medium,
    Large,
    Xl,
}

impl SizePreset {
    fn config(self) -> SizeConfig {
        let (square_size, font_size, padding, gap, title_size, legend_gap) = match self {
            SizePreset::Small => (12, 10, 12, 2, 14, 6),
            SizePreset::Medium => (16, 12, 16, 3, 16, 8),
            SizePreset::Large => (20, 14, 20, 4, 18, 10),
            SizePreset::Xl => (24, 16, 24, 5, 20, 12),
        };
        SizeConfig {
            square_size,
            font_size,
            padding,
            gap,
            title_size,
            legend_gap,
        }
    }

    fn token(self) -> &'static str {
        match self {
            SizePreset::Small => "small",
            SizePreset::Medium => "medium",
            SizePreset::Large => "large",
            SizePreset::Xl => "xl",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(try_from = "RawSize")]
pub(crate) enum Size {
    Preset(SizePreset),
    Explicit { width: u32, height: u32 },
}

impl Default for Size {
    fn default() -> Size {
        Size::Preset(SizePreset::default())
    }
}

impl Size {
    pub(crate) fn resolve(self) -> SizeConfig {
        match self {
            Size::Preset(preset) => preset.config(),
            Size::Explicit { width, height } => {
                // scale = min(width, height) / 50
                let base = u64::from(width.min(height));
                SizeConfig {
                    square_size: scaled(base, 16, 8, 32),
                    font_size: scaled(base, 12, 8, 18),
                    padding: scaled(base, 16, 8, 32),
                    gap: scaled(base, 3, 1, 6),
                    title_size: scaled(base, 16, 10, 24),
                    legend_gap: scaled(base, 8, 4, 16),
                }
            }
        }
    }
}

/// Computes `round(base / 50 * factor)`, rounding halves up, and clamps the
/// result to `min..=max`
fn scaled(base: u64, factor: u64, min: u16, max: u16) -> u16 {
    let value = base.saturating_mul(factor).saturating_add(25) / 50;
    u16::try_from(value).unwrap_or(max).clamp(min, max)
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Preset(preset) => write!(f, "{}", preset.token()),
            Size::Explicit { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

impl FromStr for Size {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Size, ParseSizeError> {
        match s {
            "small" => Ok(Size::Preset(SizePreset::Small)),
            "medium" => Ok(Size::Preset(SizePreset::Medium)),
            "large" => Ok(Size::Preset(SizePreset::Large)),
            "xl" => Ok(Size::Preset(SizePreset::Xl)),
            _ => {
                let (width, height) = s.split_once(['x', 'X']).ok_or(ParseSizeError)?;
                Ok(Size::Explicit {
                    width: width.trim().parse().map_err(|_| ParseSizeError)?,
                    height: height.trim().parse().map_err(|_| ParseSizeError)?,
                })
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error(r#"invalid size; expected "small", "medium", "large", "xl", or WIDTHxHEIGHT"#)]
pub(crate) struct ParseSizeError;

// Either a preset token or an explicit `{ width, height }` table
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
enum RawSize {
    Token(String),
    Explicit { width: u32, height: u32 },
}

impl TryFrom<RawSize> for Size {
    type Error = ParseSizeError;

    fn try_from(raw: RawSize) -> Result<Size, ParseSizeError> {
        match raw {
            RawSize::Token(s) => s.parse(),
            RawSize::Explicit { width, height } => Ok(Size::Explicit { width, height }),
        }
    }
}

/// A `SizeConfig` projected onto terminal cells
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct CellMetrics {
    /// Columns per square
    pub(crate) square_width: u16,
    /// Lines per square
    pub(crate) square_height: u16,
    /// Columns between adjacent weeks
    pub(crate) column_gap: u16,
    /// Lines between adjacent days
    pub(crate) row_gap: u16,
    pub(crate) padding_x: u16,
    pub(crate) padding_y: u16,
    /// Columns on either side of the legend squares
    pub(crate) legend_gap: u16,
    /// Maximum number of characters shown per weekday label
    pub(crate) weekday_chars: usize,
    /// Lines taken up by the title and the space beneath it
    pub(crate) title_lines: u16,
}

impl From<SizeConfig> for CellMetrics {
    // A terminal cell is roughly 8 pixels wide and 16 pixels tall.
    fn from(size: SizeConfig) -> CellMetrics {
        let square_width = size.square_size.div_ceil(8).max(1);
        CellMetrics {
            square_width,
            square_height: (square_width / 2).max(1),
            column_gap: size.gap / 3,
            row_gap: size.gap / 5,
            padding_x: size.padding / 8,
            padding_y: size.padding / 16,
            legend_gap: size.legend_gap / 4,
            weekday_chars: usize::from(size.font_size / 4).max(1),
            title_lines: (size.title_size / 10).max(1) + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(
            Size::Preset(SizePreset::Small).resolve(),
            SizeConfig {
                square_size: 12,
                font_size: 10,
                padding: 12,
                gap: 2,
                title_size: 14,
                legend_gap: 6,
            }
        );
        assert_eq!(
            Size::default().resolve(),
            SizeConfig {
                square_size: 16,
                font_size: 12,
                padding: 16,
                gap: 3,
                title_size: 16,
                legend_gap: 8,
            }
        );
        assert_eq!(Size::Preset(SizePreset::Large).resolve().legend_gap, 10);
        assert_eq!(Size::Preset(SizePreset::Xl).resolve().square_size, 24);
    }

    #[test]
    fn test_unit_scale() {
        let size = Size::Explicit {
            width: 50,
            height: 50,
        };
        assert_eq!(
            size.resolve(),
            SizeConfig {
                square_size: 16,
                font_size: 12,
                padding: 16,
                gap: 3,
                title_size: 16,
                legend_gap: 8,
            }
        );
    }

    #[test]
    fn test_uses_smaller_side() {
        let wide = Size::Explicit {
            width: 1000,
            height: 75,
        };
        let tall = Size::Explicit {
            width: 75,
            height: 1000,
        };
        assert_eq!(wide.resolve(), tall.resolve());
        // scale = 1.5
        assert_eq!(
            wide.resolve(),
            SizeConfig {
                square_size: 24,
                font_size: 18,
                padding: 24,
                gap: 5,
                title_size: 24,
                legend_gap: 12,
            }
        );
    }

    #[test]
    fn test_rounds_half_up() {
        // scale = 0.5; 3 * 0.5 = 1.5 -> 2
        let size = Size::Explicit {
            width: 25,
            height: 400,
        };
        assert_eq!(size.resolve().gap, 2);
    }

    #[test]
    fn test_clamps() {
        let tiny = Size::Explicit {
            width: 0,
            height: 0,
        };
        assert_eq!(
            tiny.resolve(),
            SizeConfig {
                square_size: 8,
                font_size: 8,
                padding: 8,
                gap: 1,
                title_size: 10,
                legend_gap: 4,
            }
        );
        let huge = Size::Explicit {
            width: u32::MAX,
            height: u32::MAX,
        };
        assert_eq!(
            huge.resolve(),
            SizeConfig {
                square_size: 32,
                font_size: 18,
                padding: 32,
                gap: 6,
                title_size: 24,
                legend_gap: 16,
            }
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("xl".parse::<Size>(), Ok(Size::Preset(SizePreset::Xl)));
        assert_eq!(
            "400x120".parse::<Size>(),
            Ok(Size::Explicit {
                width: 400,
                height: 120
            })
        );
        assert_eq!("huge".parse::<Size>(), Err(ParseSizeError));
        assert_eq!("400x".parse::<Size>(), Err(ParseSizeError));
        assert_eq!("-4x10".parse::<Size>(), Err(ParseSizeError));
        assert_eq!(Size::Preset(SizePreset::Large).to_string(), "large");
    }

    #[test]
    fn test_cell_metrics() {
        let small = CellMetrics::from(Size::Preset(SizePreset::Small).resolve());
        assert_eq!(
            small,
            CellMetrics {
                square_width: 2,
                square_height: 1,
                column_gap: 0,
                row_gap: 0,
                padding_x: 1,
                padding_y: 0,
                legend_gap: 1,
                weekday_chars: 2,
                title_lines: 2,
            }
        );
        let xl = CellMetrics::from(Size::Preset(SizePreset::Xl).resolve());
        assert_eq!(xl.square_width, 3);
        assert_eq!(xl.column_gap, 1);
        assert_eq!(xl.row_gap, 1);
        assert_eq!(xl.title_lines, 3);
    }
}
