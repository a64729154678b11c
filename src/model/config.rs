use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from mandala/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MandalaConfig {
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub assist: AssistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart file used by import/export, relative to mandala/
    #[serde(default = "default_chart_file")]
    pub file: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            file: default_chart_file(),
        }
    }
}

fn default_chart_file() -> String {
    "chart.json".to_string()
}

/// Light or dark color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> ThemeMode {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// Cell text size. In the terminal this controls how many lines of text a
/// grid cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// small → medium → large → small
    pub fn next(self) -> FontSize {
        match self {
            FontSize::Small => FontSize::Medium,
            FontSize::Medium => FontSize::Large,
            FontSize::Large => FontSize::Small,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Color overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            theme: ThemeMode::default(),
            font_size: FontSize::default(),
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

/// External assistant used for suggestions, chat and images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Program and arguments. Empty disables the assistant.
    #[serde(default)]
    pub command: Vec<String>,
    /// Chat messages passed as suggestion context
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Transcript length that stands in for an empty goal
    #[serde(default = "default_min_context_chars")]
    pub min_context_chars: usize,
    /// Language the assistant should answer in
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for AssistConfig {
    fn default() -> Self {
        AssistConfig {
            command: Vec::new(),
            history_window: default_history_window(),
            min_context_chars: default_min_context_chars(),
            language: default_language(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_history_window() -> usize {
    10
}

fn default_min_context_chars() -> usize {
    50
}

fn default_language() -> String {
    "English".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: MandalaConfig = toml::from_str("").unwrap();
        assert_eq!(config.chart.file, "chart.json");
        assert_eq!(config.ui.theme, ThemeMode::Dark);
        assert_eq!(config.ui.font_size, FontSize::Medium);
        assert!(config.ui.show_key_hints);
        assert!(config.assist.command.is_empty());
        assert_eq!(config.assist.history_window, 10);
        assert_eq!(config.assist.min_context_chars, 50);
    }

    #[test]
    fn parses_all_sections() {
        let config: MandalaConfig = toml::from_str(
            r##"
[chart]
file = "plans/2026.json"

[ui]
theme = "light"
font_size = "large"

[ui.colors]
highlight = "#FF0000"

[assist]
command = ["mandala-assist", "--model", "fast"]
language = "Traditional Chinese"
"##,
        )
        .unwrap();
        assert_eq!(config.chart.file, "plans/2026.json");
        assert_eq!(config.ui.theme, ThemeMode::Light);
        assert_eq!(config.ui.font_size, FontSize::Large);
        assert_eq!(config.ui.colors["highlight"], "#FF0000");
        assert_eq!(config.assist.command.len(), 3);
        assert_eq!(config.assist.language, "Traditional Chinese");
    }

    #[test]
    fn font_size_cycles() {
        assert_eq!(FontSize::Small.next(), FontSize::Medium);
        assert_eq!(FontSize::Large.next(), FontSize::Small);
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
    }
}
