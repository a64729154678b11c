use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = centered_rect(60, 90, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Grid", header_style)));
    add_binding(&mut lines, " \u{2190}\u{2191}\u{2193}\u{2192}/hjkl", "Move between cells", key_style, desc_style);
    add_binding(&mut lines, " Enter", "Open sub-goal / back / edit", key_style, desc_style);
    add_binding(&mut lines, " Esc", "Back to overview", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Cells", header_style)));
    add_binding(&mut lines, " e", "Edit text", key_style, desc_style);
    add_binding(&mut lines, " n", "Edit notes", key_style, desc_style);
    add_binding(&mut lines, " Space", "Toggle task done", key_style, desc_style);
    add_binding(&mut lines, " f", "Cycle task frequency", key_style, desc_style);
    add_binding(&mut lines, " d", "Remove image", key_style, desc_style);
    add_binding(&mut lines, " x", "Clear current view", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Assistant", header_style)));
    add_binding(&mut lines, " s", "Suggest empty cells", key_style, desc_style);
    add_binding(&mut lines, " a", "Ask in chat", key_style, desc_style);
    add_binding(&mut lines, " g", "Generate image", key_style, desc_style);
    add_binding(&mut lines, " i", "Describe image", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Panels & display", header_style)));
    add_binding(&mut lines, " c/m/p", "Chat / media / progress", key_style, desc_style);
    add_binding(&mut lines, " t", "Light / dark theme", key_style, desc_style);
    add_binding(&mut lines, " +", "Font size", key_style, desc_style);
    add_binding(&mut lines, " w", "Write chart", key_style, desc_style);
    add_binding(&mut lines, " q", "Quit", key_style, desc_style);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let padded_key = format!("{:<16}", key);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
