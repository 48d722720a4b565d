//! Colours and glyphs for vidshare's terminal output.

use colored::{Color, control::ShouldColorize};
use once_cell::sync::Lazy;

/// Kind of status line printed by [`crate::output::OutputManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Done,
    Failed,
    Caution,
    Note,
    /// `--verbose` detail
    Trace,
    Working,
}

impl Tone {
    pub const fn color(self) -> Color {
        match self {
            Tone::Done => Color::Green,
            Tone::Failed => Color::Red,
            Tone::Caution => Color::Yellow,
            Tone::Note => Color::Blue,
            Tone::Trace => Color::BrightBlack,
            Tone::Working => Color::Cyan,
        }
    }

    pub const fn glyph(self) -> &'static str {
        match self {
            Tone::Done => "✓",
            Tone::Failed => "✗",
            Tone::Caution => "⚠",
            Tone::Note => "ℹ",
            Tone::Trace => "→",
            Tone::Working => "⟳",
        }
    }
}

/// Colours for headings, `key: value` lines and bullets.
pub struct Palette {
    pub heading: Color,
    pub label: Color,
    pub value: Color,
    pub bullet: Color,
}

pub const PALETTE: Palette = Palette {
    heading: Color::BrightBlue,
    label: Color::BrightCyan,
    value: Color::White,
    bullet: Color::BrightBlack,
};

pub const BULLET: &str = "•";

/// Colour support as reported by the environment (`NO_COLOR`, `CLICOLOR`, tty).
pub static COLOR_ENABLED: Lazy<bool> = Lazy::new(|| ShouldColorize::from_env().should_colorize());
