//! Color themes for the dashboard.
//!
//! `ThemeVariant` picks a palette; `ColorPalette` maps each visual role of
//! the dashboard to a ratatui `Style`.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    // -- Feed --
    pub section_title: Style,
    pub card_title: Style,
    pub card_selected: Style,
    pub card_age: Style,
    pub card_channel: Style,
    pub empty_marker: Style,

    // -- Manager --
    pub category_name: Style,
    pub channel_tag: Style,
    pub row_selected: Style,

    // -- Chrome --
    pub header: Style,
    pub status_bar: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub overlay_border: Style,
    pub input_field: Style,
    pub hint: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            section_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            card_title: Style::default(),
            card_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            card_age: Style::default().fg(Color::Yellow),
            card_channel: Style::default().fg(Color::DarkGray),
            empty_marker: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            category_name: Style::default().add_modifier(Modifier::BOLD),
            channel_tag: Style::default().fg(Color::Cyan),
            row_selected: Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            header: Style::default().add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default(),
            overlay_border: Style::default().fg(Color::Cyan),
            input_field: Style::default().fg(Color::White).bg(Color::Black),
            hint: Style::default().fg(Color::DarkGray),
        }
    }

    fn light() -> Self {
        Self {
            section_title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            card_title: Style::default().fg(Color::Black),
            card_selected: Style::default().bg(Color::Blue).fg(Color::White),
            card_age: Style::default().fg(Color::Magenta),
            card_channel: Style::default().fg(Color::DarkGray),
            empty_marker: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            category_name: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            channel_tag: Style::default().fg(Color::Blue),
            row_selected: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            header: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            overlay_border: Style::default().fg(Color::Blue),
            input_field: Style::default().fg(Color::Black).bg(Color::White),
            hint: Style::default().fg(Color::DarkGray),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name(" Light "), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn cycle_returns_to_start() {
        let v = ThemeVariant::default();
        assert_eq!(v.next().next(), v);
        assert_ne!(v.next(), v);
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.card_selected, light.card_selected);
        assert_ne!(dark.status_bar, light.status_bar);
    }

    #[test]
    fn errors_stand_out_in_both_palettes() {
        for variant in [ThemeVariant::Dark, ThemeVariant::Light] {
            let p = variant.palette();
            assert_ne!(p.status_error, p.status_bar);
        }
    }
}
