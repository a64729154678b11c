use std::fs;
use std::path::{Path, PathBuf};

use crate::io::lock::{self, FileLock, LockError};
use crate::io::recovery::{self, RecoveryCategory};
use crate::model::chart::Chart;
use crate::model::config::MandalaConfig;
use crate::model::workspace::Workspace;
use crate::ops::export::export_json;
use crate::ops::validate::{self, ValidationError};

/// Name of the workspace directory
pub const MANDALA_DIR: &str = "mandala";
pub const CONFIG_FILE: &str = "config.toml";

/// Error type for workspace I/O
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a mandala workspace: no mandala/config.toml found (run `mandala init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEdit(#[from] toml_edit::TomlError),
    #[error("invalid chart file {path}: {source}")]
    InvalidChart {
        path: PathBuf,
        source: ValidationError,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Walk up from `start` looking for `mandala/config.toml`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(MANDALA_DIR).join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Load config and chart. A missing chart file gives an empty chart.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let mandala_dir = root.join(MANDALA_DIR);
    let config_path = mandala_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            WorkspaceError::NotAWorkspace
        } else {
            WorkspaceError::Read {
                path: config_path.clone(),
                source,
            }
        }
    })?;
    let config: MandalaConfig = toml::from_str(&config_text)?;

    let chart_path = mandala_dir.join(&config.chart.file);
    let chart = if chart_path.exists() {
        read_chart(&chart_path)?
    } else {
        Chart::empty()
    };

    Ok(Workspace {
        root: root.to_path_buf(),
        mandala_dir,
        config,
        chart,
    })
}

/// Read and validate a chart file.
pub fn read_chart(path: &Path) -> Result<Chart, WorkspaceError> {
    let text = fs::read_to_string(path).map_err(|source| WorkspaceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    validate::validate(&text).map_err(|source| WorkspaceError::InvalidChart {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the workspace chart to its chart file under the workspace lock.
///
/// If the write fails the chart is journaled in the recovery log before the
/// error is returned.
pub fn save_chart(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let _lock = FileLock::acquire(&workspace.mandala_dir, lock::DEFAULT_TIMEOUT)?;
    write_chart(workspace)
}

/// Like [`save_chart`], for callers that already hold the workspace lock.
pub fn write_chart(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let path = workspace.chart_path();
    let content = export_json(&workspace.chart);
    let result = match path.parent() {
        Some(dir) => fs::create_dir_all(dir),
        None => Ok(()),
    }
    .and_then(|()| recovery::atomic_write(&path, content.as_bytes()));

    if let Err(source) = result {
        recovery::log_discarded_chart(
            &workspace.mandala_dir,
            RecoveryCategory::Write,
            "chart write failed",
            vec![
                ("Target".to_string(), workspace.config.chart.file.clone()),
                ("Error".to_string(), source.to_string()),
            ],
            &workspace.chart,
        );
        return Err(WorkspaceError::Write { path, source });
    }
    Ok(())
}

/// Create `mandala/` with a config file and, if given, a chart file.
/// Returns the mandala directory.
pub fn init_workspace(
    root: &Path,
    config_text: &str,
    chart: Option<&Chart>,
) -> Result<PathBuf, WorkspaceError> {
    let mandala_dir = root.join(MANDALA_DIR);
    fs::create_dir_all(&mandala_dir).map_err(|source| WorkspaceError::Write {
        path: mandala_dir.clone(),
        source,
    })?;

    let config_path = mandala_dir.join(CONFIG_FILE);
    fs::write(&config_path, config_text).map_err(|source| WorkspaceError::Write {
        path: config_path.clone(),
        source,
    })?;

    if let Some(chart) = chart {
        let config: MandalaConfig = toml::from_str(config_text)?;
        let chart_path = mandala_dir.join(&config.chart.file);
        recovery::atomic_write(&chart_path, export_json(chart).as_bytes()).map_err(|source| {
            WorkspaceError::Write {
                path: chart_path.clone(),
                source,
            }
        })?;
    }
    Ok(mandala_dir)
}
