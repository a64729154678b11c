use std::fs;
use std::path::Path;

use toml_edit::{DocumentMut, Item, Table, Value};

use crate::io::recovery::atomic_write;
use crate::io::workspace_io::{CONFIG_FILE, WorkspaceError};
use crate::model::config::MandalaConfig;

/// Read the config, returning both the parsed config and the toml_edit
/// document for format-preserving edits.
pub fn read_config(mandala_dir: &Path) -> Result<(MandalaConfig, DocumentMut), WorkspaceError> {
    let path = mandala_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|source| WorkspaceError::Read {
        path: path.clone(),
        source,
    })?;
    let config: MandalaConfig = toml::from_str(&text)?;
    let doc: DocumentMut = text.parse()?;
    Ok((config, doc))
}

pub fn write_config(mandala_dir: &Path, doc: &DocumentMut) -> Result<(), WorkspaceError> {
    let path = mandala_dir.join(CONFIG_FILE);
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|source| WorkspaceError::Write { path, source })
}

/// Look up a dotted key such as `ui.theme`. Missing keys fall back to the
/// default config so every known key has a value.
pub fn get_value(doc: &DocumentMut, key: &str) -> Option<String> {
    let mut item = doc.as_item();
    for part in key.split('.') {
        item = match item.get(part) {
            Some(next) => next,
            None => return default_value(key),
        };
    }
    Some(render_item(item))
}

fn default_value(key: &str) -> Option<String> {
    let defaults = toml::Value::try_from(MandalaConfig::default()).ok()?;
    let mut value = &defaults;
    for part in key.split('.') {
        value = value.get(part)?;
    }
    Some(match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn render_item(item: &Item) -> String {
    match item {
        Item::Value(Value::String(s)) => s.value().clone(),
        Item::Value(v) => v.to_string().trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Set a dotted key. `raw` is read as a TOML value when it parses as one
/// (`true`, `12`, `["a", "b"]`), otherwise as a plain string. The edited
/// document must still be a valid config.
pub fn set_value(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<(), String> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(format!("invalid key \"{}\"", key));
    }
    let Some((last, tables)) = parts.split_last() else {
        return Err(format!("invalid key \"{}\"", key));
    };

    let mut table: &mut Table = doc.as_table_mut();
    for part in tables {
        let entry = table
            .entry(part)
            .or_insert_with(|| Item::Table(Table::new()));
        table = entry
            .as_table_mut()
            .ok_or_else(|| format!("{} is not a table", part))?;
    }
    table[*last] = toml_edit::value(parse_raw(raw));

    toml::from_str::<MandalaConfig>(&doc.to_string())
        .map(|_| ())
        .map_err(|e| format!("invalid value for {}: {}", key, e.message()))
}

fn parse_raw(raw: &str) -> Value {
    match raw.parse::<Value>() {
        Ok(value) if !matches!(value, Value::InlineTable(_)) => value.decorated("", ""),
        _ => Value::from(raw),
    }
}
