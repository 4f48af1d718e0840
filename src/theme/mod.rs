//! Theming system for discursiva

mod tokyo_night;

pub use tokyo_night::{TOKYO_NIGHT, TOKYO_NIGHT_DAY};

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::practice::DIFFICULTY_THRESHOLD;

/// Scores below this are shown as failing rather than merely difficult
const FAILING_SCORE: u32 = 50;

/// A color theme for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,

    // Background colors
    pub bg_primary: Color,
    pub bg_secondary: Color,

    // Foreground colors
    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub fg_muted: Color,

    // Accent colors
    pub accent_primary: Color,
    pub accent_secondary: Color,

    // Semantic colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // UI elements
    pub border: Color,
    pub border_focused: Color,
    pub cursor: Color,
}

impl Theme {
    /// Built-in theme by its display name, case-insensitive
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "tokyo night" | "tokyo-night" => Some(Self::tokyo_night()),
            "tokyo night day" | "tokyo-night-day" => Some(Self::tokyo_night_day()),
            _ => None,
        }
    }

    /// Color for a meaning score: muted when unscored, then by band
    pub fn score_color(&self, score: Option<u32>) -> Color {
        match score {
            None => self.fg_muted,
            Some(s) if s < FAILING_SCORE => self.error,
            Some(s) if s < DIFFICULTY_THRESHOLD => self.warning,
            Some(_) => self.success,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::tokyo_night()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_tokyo_night() {
        let theme = Theme::default();
        assert_eq!(theme.name, "Tokyo Night");
    }

    #[test]
    fn themes_by_name() {
        let day = Theme::by_name("tokyo night day").map(|t| t.name);
        assert_eq!(day.as_deref(), Some("Tokyo Night Day"));
        assert!(Theme::by_name("Solarized").is_none());
    }

    #[test]
    fn score_bands() {
        let theme = Theme::tokyo_night();
        assert_eq!(theme.score_color(None), theme.fg_muted);
        assert_eq!(theme.score_color(Some(10)), theme.error);
        assert_eq!(theme.score_color(Some(79)), theme.warning);
        assert_eq!(theme.score_color(Some(80)), theme.success);
    }
}
