use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::io::lock::try_lock;
use crate::model::chart::Chart;
use crate::ops::export::export_json;

/// Entries older than this are removed by `mandala recovery prune`.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- mandala recovery log: charts discarded by clear/import and charts that
     could not be written. Each entry holds the full chart JSON, importable
     with `mandala import`.
     View with: mandala recovery
     Prune old entries: mandala recovery prune -->

---
";

/// Why a chart ended up in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Overwritten by a confirmed clear
    Clear,
    /// Overwritten by a confirmed import
    Import,
    /// A chart file write failed
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecoveryCategory::Clear => "clear",
            RecoveryCategory::Import => "import",
            RecoveryCategory::Write => "write",
        })
    }
}

impl RecoveryCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "clear" => Some(RecoveryCategory::Clear),
            "import" => Some(RecoveryCategory::Import),
            "write" => Some(RecoveryCategory::Write),
            _ => None,
        }
    }
}

/// One journaled event
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

pub fn recovery_log_path(mandala_dir: &Path) -> PathBuf {
    mandala_dir.join(".recovery.log")
}

/// Write `content` to `path` through a temp file in the same directory and
/// a rename, so readers never see a half-written file.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} [{}] {}\n\n",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```json\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }

    /// The entry as it appears in the log file
    pub fn to_display_markdown(&self) -> String {
        self.to_markdown()
    }
}

/// Append an entry. Failures are reported on stderr and otherwise ignored.
pub fn log_recovery(mandala_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(mandala_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(mandala_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(mandala_dir);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Journal a chart that is about to be lost. Blank charts are skipped.
pub fn log_discarded_chart(
    mandala_dir: &Path,
    category: RecoveryCategory,
    description: &str,
    fields: Vec<(String, String)>,
    chart: &Chart,
) {
    if chart.is_blank() && category != RecoveryCategory::Write {
        return;
    }
    log_recovery(
        mandala_dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.to_string(),
            fields,
            body: export_json(chart),
        },
    );
}

/// Entries, most recent first. `limit` keeps only the newest `n`.
pub fn read_recovery_entries(mandala_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(mandala_dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RecoveryEntry> = None;
    let mut in_body = false;

    for line in content.lines() {
        if in_body {
            if line == "```" {
                in_body = false;
            } else if let Some(entry) = current.as_mut() {
                entry.body.push_str(line);
                entry.body.push('\n');
            }
            continue;
        }
        if let Some(header) = line.strip_prefix("## ") {
            entries.extend(current.take());
            current = parse_header(header).map(|(timestamp, category, description)| RecoveryEntry {
                timestamp,
                category,
                description,
                fields: Vec::new(),
                body: String::new(),
            });
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        if line.starts_with("```") {
            in_body = true;
        } else if line == "---" {
            entries.extend(current.take());
        } else if let Some((key, value)) = line.split_once(": ") {
            entry.fields.push((key.to_string(), value.to_string()));
        }
    }
    entries.extend(current);
    entries
}

/// `<rfc3339> [<category>] <description>`
fn parse_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    let rest = rest.strip_prefix('[')?;
    let (category, description) = rest.split_once("] ")?;
    Some((timestamp, RecoveryCategory::parse(category)?, description.to_string()))
}

/// Remove entries older than `before` (default: [`PRUNE_AGE_DAYS`]), or all
/// of them. Returns the number removed.
pub fn prune_recovery(
    mandala_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(mandala_dir);
    if !path.exists() {
        return Ok(0);
    }

    let file = OpenOptions::new().read(true).write(true).open(&path)?;
    let mut locked = false;
    for _ in 0..10 {
        if try_lock(&file).is_ok() {
            locked = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    if !locked {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "recovery log is in use, try again later",
        ));
    }

    let entries = parse_entries(&std::fs::read_to_string(&path)?);
    let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
    let (kept, removed): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| !all && e.timestamp >= cutoff);

    let mut content = FILE_HEADER.to_string();
    for entry in &kept {
        content.push_str(&entry.to_markdown());
    }
    atomic_write(&path, content.as_bytes())?;
    Ok(removed.len())
}
