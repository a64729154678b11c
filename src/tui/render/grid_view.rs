use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::model::cell::{Cell, Frequency};
use crate::model::chart::CellRef;
use crate::model::config::FontSize;
use crate::model::grid::GridPosition;
use crate::tui::app::App;
use crate::tui::wrap::wrap_clamped;

/// Most text lines a cell shows at each font size
fn max_lines(size: FontSize) -> usize {
    match size {
        FontSize::Small => 8,
        FontSize::Medium => 4,
        FontSize::Large => 2,
    }
}

/// Render the 3x3 grid of the current view
pub fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let thirds = [
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ];
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(thirds)
        .split(area);

    for (row, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(thirds)
            .split(*row_area);
        for (col, cell_area) in cols.iter().enumerate() {
            if let Some(pos) = GridPosition::from_row_col(row as u8, col as u8) {
                render_cell(frame, app, pos, *cell_area);
            }
        }
    }
}

fn render_cell(frame: &mut Frame, app: &App, pos: GridPosition, area: Rect) {
    let theme = &app.theme;
    let Some(cell_ref) = app.session.view().resolve(pos) else {
        return;
    };
    let cell = app.session.cell_at(pos);
    let selected = app.session.selection() == Some(cell_ref) && app.cursor == pos;

    let bg = if selected {
        theme.selection_bg
    } else if pos.is_center() {
        theme.center_bg
    } else {
        theme.background
    };
    let border = if selected {
        theme.selection_border
    } else {
        theme.dim
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if pos.is_center() {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(Style::default().fg(border).bg(bg))
        .style(Style::default().bg(bg))
        .title(cell_header(app, cell_ref, &cell, bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let font_size = app.session.font_size();
    let limit = max_lines(font_size).min(inner.height as usize);
    let lines: Vec<Line> = if cell.has_text() {
        let mut style = Style::default().fg(text_color(app, cell_ref, &cell)).bg(bg);
        if font_size == FontSize::Large {
            style = style.add_modifier(Modifier::BOLD);
        }
        if cell_ref.is_task() && cell.completed() {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        wrap_clamped(&cell.text, inner.width as usize, limit)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, style)))
            .collect()
    } else {
        vec![Line::from(Span::styled(
            placeholder(cell_ref),
            Style::default().fg(theme.dim).bg(bg),
        ))]
    };

    frame.render_widget(Paragraph::new(lines), inner);
}

fn text_color(app: &App, cell_ref: CellRef, cell: &Cell) -> Color {
    match cell_ref {
        CellRef::Main => app.theme.text_bright,
        CellRef::Task(..) if cell.completed() => app.theme.dim,
        _ => app.theme.text,
    }
}

fn placeholder(cell_ref: CellRef) -> &'static str {
    match cell_ref {
        CellRef::Main => "main goal",
        CellRef::SubGoal(_) => "sub-goal",
        CellRef::Task(..) => "task",
    }
}

/// Border title: id, progress or checkbox, then markers for notes and media
fn cell_header<'a>(app: &App, cell_ref: CellRef, cell: &Cell, bg: Color) -> Line<'a> {
    let theme = &app.theme;
    let dim = Style::default().fg(theme.dim).bg(bg);
    let mut spans = vec![Span::styled(format!(" {}", cell_ref), dim)];

    match cell_ref {
        CellRef::Main => {}
        CellRef::SubGoal(_) => {
            let progress = cell.progress_or_zero();
            spans.push(Span::styled(
                format!(" {}%", progress),
                Style::default().fg(theme.progress_color(progress)).bg(bg),
            ));
        }
        CellRef::Task(..) => {
            let (mark, color) = if cell.completed() {
                ("[x]", theme.green)
            } else {
                ("[ ]", theme.text)
            };
            spans.push(Span::styled(
                format!(" {}", mark),
                Style::default().fg(color).bg(bg),
            ));
            if let Some(freq) = cell.frequency.filter(|f| *f != Frequency::OneTime) {
                spans.push(Span::styled(format!(" {}", freq.as_str()), dim));
            }
        }
    }

    if cell.notes.is_some() {
        spans.push(Span::styled(" \u{270E}", Style::default().fg(theme.cyan).bg(bg)));
    }
    if cell.image_ref.is_some() || cell.video_ref.is_some() {
        spans.push(Span::styled(" \u{25A3}", Style::default().fg(theme.highlight).bg(bg)));
    }
    spans.push(Span::styled(" ", dim));
    Line::from(spans)
}
