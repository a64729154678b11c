use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How often a task recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[default]
    OneTime,
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::OneTime => "one-time",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    pub fn parse(s: &str) -> Option<Frequency> {
        match s {
            "one-time" | "once" => Some(Frequency::OneTime),
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            _ => None,
        }
    }

    /// one-time → daily → weekly → one-time
    pub fn next(self) -> Frequency {
        match self {
            Frequency::OneTime => Frequency::Daily,
            Frequency::Daily => Frequency::Weekly,
            Frequency::Weekly => Frequency::OneTime,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The atomic content unit of a chart.
///
/// Field names follow the chart JSON format (camelCase). Fields this version
/// does not know about are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default, alias = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
    /// Only meaningful on task cells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    /// Only meaningful on sub-goal cells (0..=100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Cell {
    /// A blank cell with the given id
    pub fn blank(id: impl Into<String>) -> Self {
        Cell {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn completed(&self) -> bool {
        self.is_completed.unwrap_or(false)
    }

    pub fn progress_or_zero(&self) -> u8 {
        self.progress.unwrap_or(0)
    }
}

/// A partial update to a cell. `None` leaves a field untouched; for optional
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellPatch {
    pub text: Option<String>,
    pub notes: Option<Option<String>>,
    pub image_ref: Option<Option<String>>,
    pub video_ref: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub progress: Option<u8>,
    pub frequency: Option<Frequency>,
}

impl CellPatch {
    pub fn text(text: impl Into<String>) -> Self {
        CellPatch {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn completed(done: bool) -> Self {
        CellPatch {
            is_completed: Some(done),
            ..Default::default()
        }
    }

    pub fn notes(notes: Option<String>) -> Self {
        CellPatch {
            notes: Some(notes),
            ..Default::default()
        }
    }

    pub fn image(image_ref: Option<String>) -> Self {
        CellPatch {
            image_ref: Some(image_ref),
            ..Default::default()
        }
    }

    pub fn frequency(frequency: Frequency) -> Self {
        CellPatch {
            frequency: Some(frequency),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CellPatch::default()
    }

    pub fn apply(&self, cell: &mut Cell) {
        if let Some(text) = &self.text {
            cell.text = text.clone();
        }
        if let Some(notes) = &self.notes {
            cell.notes = notes.clone();
        }
        if let Some(image_ref) = &self.image_ref {
            cell.image_ref = image_ref.clone();
        }
        if let Some(video_ref) = &self.video_ref {
            cell.video_ref = video_ref.clone();
        }
        if let Some(done) = self.is_completed {
            cell.is_completed = Some(done);
        }
        if let Some(progress) = self.progress {
            cell.progress = Some(progress.min(100));
        }
        if let Some(frequency) = self.frequency {
            cell.frequency = Some(frequency);
        }
    }
}
