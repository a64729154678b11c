use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::workspace_io::{self, CONFIG_FILE, MANDALA_DIR};
use crate::model::cell::CellPatch;
use crate::model::chart::{CellRef, Chart};
use crate::ops::chart_ops;

const CONFIG_TEMPLATE: &str = r##"# mandala workspace settings
# Change values here or with: mandala config set <key> <value>

[chart]
# Chart file, relative to this directory
file = "chart.json"

[ui]
theme = "dark"                # "dark" or "light"
font_size = "medium"          # "small", "medium" or "large"
# show_key_hints = false
#
# [ui.colors]
# background = "#0C001B"
# text = "#A09BFE"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#5A5580"
# green = "#44FF88"
# red = "#FF4444"

[assist]
# External assistant program. It receives one JSON request on stdin and
# answers on stdout. Leave empty to disable suggestions, chat and images.
command = []
# history_window = 10
# min_context_chars = 50
# language = "English"
"##;

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    let config_path = root.join(MANDALA_DIR).join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    let chart = match args.goal.as_deref().map(str::trim) {
        Some(goal) if !goal.is_empty() => Some(chart_ops::update_ref(
            &Chart::empty(),
            CellRef::Main,
            &CellPatch::text(goal),
        )),
        _ => None,
    };

    let mandala_dir = workspace_io::init_workspace(&root, CONFIG_TEMPLATE, chart.as_ref())?;
    println!("Initialized mandala workspace in {}", mandala_dir.display());
    if let Some(chart) = &chart {
        println!("  main goal: {}", chart.main_goal.text);
    }
    println!("  config:    {}/{}", MANDALA_DIR, CONFIG_FILE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{MandalaConfig, ThemeMode};

    #[test]
    fn template_parses_to_defaults() {
        let config: MandalaConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        let defaults = MandalaConfig::default();
        assert_eq!(config.chart.file, defaults.chart.file);
        assert_eq!(config.ui.theme, ThemeMode::Dark);
        assert_eq!(config.ui.font_size, defaults.ui.font_size);
        assert!(config.assist.command.is_empty());
        assert_eq!(config.assist.history_window, defaults.assist.history_window);
    }
}
