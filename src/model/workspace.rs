use std::path::PathBuf;

use super::chart::Chart;
use super::config::MandalaConfig;

/// A loaded mandala workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of `mandala/`)
    pub root: PathBuf,
    /// Path to the `mandala/` directory
    pub mandala_dir: PathBuf,
    /// Parsed config.toml
    pub config: MandalaConfig,
    /// Chart imported from the chart file (empty if the file does not exist yet)
    pub chart: Chart,
}

impl Workspace {
    /// Absolute path of the chart file
    pub fn chart_path(&self) -> PathBuf {
        self.mandala_dir.join(&self.config.chart.file)
    }
}
