pub mod grid_view;
pub mod help_overlay;
pub mod panels;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::ops::progress::overall_progress;

use super::app::{App, Mode};

/// Width of the side panel when one is open
const PANEL_WIDTH: u16 = 40;

/// Main render function, dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: title (1 row) | grid + panel | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_title(frame, app, chunks[0]);

    match app.session.open_panel() {
        Some(panel) if chunks[1].width > PANEL_WIDTH * 2 => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(1), Constraint::Length(PANEL_WIDTH)])
                .split(chunks[1]);
            grid_view::render_grid(frame, app, body[0]);
            panels::render_panel(frame, app, panel, body[1]);
        }
        Some(panel) => panels::render_panel(frame, app, panel, chunks[1]),
        None => grid_view::render_grid(frame, app, chunks[1]),
    }

    if app.mode == Mode::Help {
        help_overlay::render_help_overlay(frame, app, area);
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// Title row: view name on the left, overall progress on the right
fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let chart = app.session.chart();
    let view = app.session.mode();

    let mut title = match view.focus() {
        Some(sub) => format!(" Sub-goal {}", sub),
        None => " Overview".to_string(),
    };
    if let Some(sub) = view.focus() {
        let text = &chart.sub_goals[sub].text;
        if !text.is_empty() {
            title.push_str(": ");
            title.push_str(text);
        }
    } else if chart.main_goal.has_text() {
        title.push_str(": ");
        title.push_str(&chart.main_goal.text);
    }

    let overall = overall_progress(chart);
    let right = format!("{}% ", overall);
    let dirty = if app.has_unsaved_changes() { " [+]" } else { "" };

    let left_width = crate::util::unicode::display_width(&title) + dirty.len();
    let pad = (area.width as usize).saturating_sub(left_width + right.len());

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(dirty, Style::default().fg(app.theme.yellow).bg(bg)),
        Span::styled(" ".repeat(pad), Style::default().bg(bg)),
        Span::styled(
            right,
            Style::default().fg(app.theme.progress_color(overall)).bg(bg),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
