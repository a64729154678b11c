use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::cell::Cell;
use crate::model::chart::{CellRef, Chart};
use crate::model::grid::GridPosition;
use crate::model::view::{ViewMode, ViewState};
use crate::ops::progress::ProgressSummary;
use crate::util::unicode::{display_width, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct GridJson {
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<usize>,
    pub cells: Vec<GridCellJson>,
}

#[derive(Serialize)]
pub struct GridCellJson {
    pub position: u8,
    #[serde(flatten)]
    pub cell: Cell,
}

#[derive(Serialize)]
pub struct ValidationJson {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_cells: Option<usize>,
}

#[derive(Serialize)]
pub struct AnalysisJson {
    pub cell: String,
    pub prompt: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct SuggestJson {
    pub mode: &'static str,
    pub filled: usize,
    pub ideas: Vec<String>,
}

pub fn grid_to_json(chart: &Chart, view: &ViewState) -> GridJson {
    let cells = GridPosition::all()
        .filter_map(|pos| {
            let cell = chart.cell(view.resolve(pos)?)?;
            Some(GridCellJson {
                position: pos.get(),
                cell: cell.clone(),
            })
        })
        .collect();
    GridJson {
        mode: mode_name(view.mode),
        focus: view.mode.focus(),
        cells,
    }
}

pub fn mode_name(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Main => "main",
        ViewMode::Sub(_) => "sub",
    }
}

/// Number of cells with text, main goal included
pub fn filled_cells(chart: &Chart) -> usize {
    std::iter::once(&chart.main_goal)
        .chain(chart.sub_goals.iter())
        .chain(chart.tasks.iter().flatten())
        .filter(|c| c.has_text())
        .count()
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Render the 3×3 grid of a view as a box of fixed-width columns.
///
/// Each cell shows a header line (id plus progress or a done mark) and its
/// text truncated to the column width.
pub fn format_grid(chart: &Chart, view: &ViewState, col_width: usize) -> String {
    let col_width = col_width.max(8);
    let rule = {
        let seg = "-".repeat(col_width + 2);
        format!("+{}+{}+{}+", seg, seg, seg)
    };

    let mut lines = vec![rule.clone()];
    for row in 0..3u8 {
        let cells: Vec<Option<(CellRef, &Cell)>> = (0..3u8)
            .map(|col| {
                let pos = GridPosition::from_row_col(row, col)?;
                let cell_ref = view.resolve(pos)?;
                Some((cell_ref, chart.cell(cell_ref)?))
            })
            .collect();

        let headers: Vec<String> = cells
            .iter()
            .map(|c| c.map(|(r, cell)| cell_header(r, cell)).unwrap_or_default())
            .collect();
        let texts: Vec<String> = cells
            .iter()
            .map(|c| c.map(|(_, cell)| cell.text.clone()).unwrap_or_default())
            .collect();

        lines.push(format_row(&headers, col_width));
        lines.push(format_row(&texts, col_width));
        lines.push(rule.clone());
    }
    lines.join("\n")
}

fn cell_header(cell_ref: CellRef, cell: &Cell) -> String {
    match cell_ref {
        CellRef::Main => "main".to_string(),
        CellRef::SubGoal(_) => format!("{} {}%", cell_ref, cell.progress_or_zero()),
        CellRef::Task(..) if cell.completed() => format!("{} [x]", cell_ref),
        CellRef::Task(..) => format!("{} [ ]", cell_ref),
    }
}

fn format_row(values: &[String], col_width: usize) -> String {
    let mut out = String::from("|");
    for value in values {
        let shown = truncate_to_width(value, col_width);
        let pad = col_width.saturating_sub(display_width(&shown));
        out.push(' ');
        out.push_str(&shown);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out
}

/// View title shown above the grid
pub fn format_view_title(chart: &Chart, view: &ViewState) -> String {
    match view.mode {
        ViewMode::Main => format!("Main goal: {}", or_placeholder(&chart.main_goal.text)),
        ViewMode::Sub(f) => {
            let text = chart.sub_goals.get(f).map(|c| c.text.as_str()).unwrap_or("");
            format!("Sub-goal {}: {}", f, or_placeholder(text))
        }
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.is_empty() { "(empty)" } else { text }
}

/// Multi-line detail of one cell
pub fn format_cell_detail(cell_ref: CellRef, cell: &Cell) -> String {
    let mut out = format!("{}  {}", cell_ref, or_placeholder(&cell.text));
    match cell_ref {
        CellRef::Task(..) => {
            let status = if cell.completed() { "done" } else { "open" };
            out.push_str(&format!("\n  status: {}", status));
            out.push_str(&format!(
                "\n  frequency: {}",
                cell.frequency.unwrap_or_default()
            ));
        }
        CellRef::SubGoal(_) => {
            out.push_str(&format!("\n  progress: {}%", cell.progress_or_zero()));
        }
        CellRef::Main => {}
    }
    if let Some(notes) = cell.notes.as_deref().filter(|n| !n.is_empty()) {
        out.push_str("\n  notes:");
        for line in notes.lines() {
            out.push_str(&format!("\n    {}", line));
        }
    }
    if let Some(image) = &cell.image_ref {
        out.push_str(&format!("\n  image: {}", shorten_ref(image)));
    }
    if let Some(video) = &cell.video_ref {
        out.push_str(&format!("\n  video: {}", shorten_ref(video)));
    }
    out
}

/// Inline data URIs can be megabytes long; show only the media type.
pub fn shorten_ref(reference: &str) -> String {
    if let Some(rest) = reference.strip_prefix("data:") {
        let media_type = rest.split([';', ',']).next().unwrap_or("");
        return format!("<inline {} data, {} bytes>", media_type, reference.len());
    }
    reference.to_string()
}

pub fn format_progress(summary: &ProgressSummary) -> String {
    let name_width = summary
        .sub_goals
        .iter()
        .map(|g| display_width(or_placeholder(&g.text)).min(30))
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!("Overall: {}%", summary.overall)];
    for goal in &summary.sub_goals {
        let name = truncate_to_width(or_placeholder(&goal.text), 30);
        let pad = name_width.saturating_sub(display_width(&name));
        let mark = if goal.is_complete() { " *" } else { "" };
        lines.push(format!(
            "  [{}] {}{}  {}/{}  {:>3}%{}",
            goal.index,
            name,
            " ".repeat(pad),
            goal.tasks_done,
            goal.tasks_filled,
            goal.progress,
            mark
        ));
    }
    lines.join("\n")
}

pub fn format_recovery_entries(entries: &[RecoveryEntry]) -> String {
    entries
        .iter()
        .map(RecoveryEntry::to_display_markdown)
        .collect::<Vec<_>>()
        .join("\n")
}
