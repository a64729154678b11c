use ratatui::style::Color;

use crate::model::config::{ThemeMode, UiConfig};

/// Parsed color theme for the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub selection_bg: Color,
    pub selection_border: Color,
    /// Background of the center cell
    pub center_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            cyan: Color::Rgb(0x44, 0xDD, 0xFF),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            selection_border: Color::Rgb(0xFB, 0x41, 0x96),
            center_bg: Color::Rgb(0x1E, 0x0A, 0x38),
        }
    }

    pub fn light() -> Self {
        Theme {
            background: Color::Rgb(0xFA, 0xF8, 0xF5),
            text: Color::Rgb(0x33, 0x2E, 0x4A),
            text_bright: Color::Rgb(0x00, 0x00, 0x00),
            highlight: Color::Rgb(0xC2, 0x18, 0x5B),
            dim: Color::Rgb(0x8A, 0x85, 0x9E),
            red: Color::Rgb(0xC6, 0x28, 0x28),
            yellow: Color::Rgb(0xB2, 0x80, 0x00),
            green: Color::Rgb(0x2E, 0x7D, 0x32),
            cyan: Color::Rgb(0x00, 0x83, 0x8F),
            selection_bg: Color::Rgb(0xF8, 0xDC, 0xE8),
            selection_border: Color::Rgb(0xC2, 0x18, 0x5B),
            center_bg: Color::Rgb(0xEC, 0xE6, 0xF5),
        }
    }

    /// Palette for `mode` with the `[ui.colors]` overrides applied
    pub fn from_config(ui: &UiConfig, mode: ThemeMode) -> Self {
        let mut theme = match mode {
            ThemeMode::Dark => Theme::dark(),
            ThemeMode::Light => Theme::light(),
        };

        for (key, value) in &ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "highlight" => theme.highlight = color,
                    "dim" => theme.dim = color,
                    "red" => theme.red = color,
                    "yellow" => theme.yellow = color,
                    "green" => theme.green = color,
                    "cyan" => theme.cyan = color,
                    "selection_bg" => theme.selection_bg = color,
                    "selection_border" => theme.selection_border = color,
                    "center_bg" => theme.center_bg = color,
                    _ => {}
                }
            }
        }
        theme
    }

    /// Color of a progress figure
    pub fn progress_color(&self, progress: u8) -> Color {
        match progress {
            100 => self.green,
            0 => self.dim,
            p if p >= 50 => self.cyan,
            _ => self.yellow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("#FF4444"),
            Some(Color::Rgb(0xFF, 0x44, 0x44))
        );
        assert_eq!(parse_hex_color("FF4444"), None); // missing #
        assert_eq!(parse_hex_color("#FF44"), None); // too short
        assert_eq!(parse_hex_color("#ZZZZZZ"), None); // invalid hex
    }

    #[test]
    fn test_mode_selects_palette() {
        let ui = UiConfig::default();
        assert_eq!(Theme::from_config(&ui, ThemeMode::Dark), Theme::dark());
        assert_eq!(Theme::from_config(&ui, ThemeMode::Light), Theme::light());
        assert_ne!(Theme::dark().background, Theme::light().background);
    }

    #[test]
    fn test_overrides_apply_to_both_modes() {
        let mut ui = UiConfig::default();
        ui.colors.insert("highlight".into(), "#112233".into());
        ui.colors.insert("bogus".into(), "#445566".into());
        ui.colors.insert("text".into(), "not a color".into());

        for mode in [ThemeMode::Dark, ThemeMode::Light] {
            let theme = Theme::from_config(&ui, mode);
            assert_eq!(theme.highlight, Color::Rgb(0x11, 0x22, 0x33));
        }
        // Invalid values keep the default
        assert_eq!(Theme::from_config(&ui, ThemeMode::Dark).text, Theme::dark().text);
    }

    #[test]
    fn test_progress_color() {
        let theme = Theme::dark();
        assert_eq!(theme.progress_color(0), theme.dim);
        assert_eq!(theme.progress_color(25), theme.yellow);
        assert_eq!(theme.progress_color(50), theme.cyan);
        assert_eq!(theme.progress_color(100), theme.green);
    }
}
