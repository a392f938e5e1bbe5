//! Terminal styling and color utilities.
//!
//! ANSI escape code definitions and color detection for the candidate panel
//! and turn-by-turn output.

/// ANSI escape codes for text styling and colors.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bold reverse green for the step the user is on.
    pub const TAG_CURRENT: &str = "\x1b[1;7;32m";
    /// Bright bold white for place names and route titles.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for secondary elements (ranks, step counters).
    pub const GRAY: &str = "\x1b[90m";
    /// Cyan for distances.
    pub const CYAN: &str = "\x1b[36m";
    /// Green for durations.
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow for bookmark stars.
    pub const YELLOW: &str = "\x1b[33m";
    /// Red for rejections and failures.
    pub const RED: &str = "\x1b[31m";
}

/// Resolved color codes, either ANSI sequences or empty strings when color is disabled.
#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub tag_current: &'static str,
    pub white_bold: &'static str,
    pub gray: &'static str,
    pub cyan: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub red: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            tag_current: colors::TAG_CURRENT,
            white_bold: colors::WHITE_BOLD,
            gray: colors::GRAY,
            cyan: colors::CYAN,
            green: colors::GREEN,
            yellow: colors::YELLOW,
            red: colors::RED,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            tag_current: "",
            white_bold: "",
            gray: "",
            cyan: "",
            green: "",
            yellow: "",
            red: "",
        }
    }

    /// `colored()` if the terminal supports ANSI colors, otherwise `plain()`.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Check if the terminal supports ANSI color codes.
///
/// Respects the `NO_COLOR` environment variable (https://no-color.org/) and
/// the `TERM=dumb` convention.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}
