use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::cli::output::shorten_ref;
use crate::ops::assist::ChatRole;
use crate::ops::panels::Panel;
use crate::ops::progress::summarize;
use crate::tui::app::App;
use crate::tui::wrap::wrap_text;

/// Render the open side panel inside a bordered block
pub fn render_panel(frame: &mut Frame, app: &App, panel: Panel, area: Rect) {
    let bg = app.theme.background;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg))
        .title(Span::styled(
            format!(" {} ", panel.title()),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let width = inner.width as usize;
    if width == 0 {
        return;
    }

    let lines = match panel {
        Panel::Chat => chat_lines(app, width, inner.height as usize),
        Panel::Media => media_lines(app, width),
        Panel::Progress => progress_lines(app, width),
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Chat log, wrapped and scrolled so the newest message is visible
fn chat_lines<'a>(app: &App, width: usize, height: usize) -> Vec<Line<'a>> {
    let bg = app.theme.background;
    let mut lines = Vec::new();
    for message in app.session.chat() {
        let (prefix, color) = match message.role {
            ChatRole::User => ("you", app.theme.highlight),
            ChatRole::Model => ("assistant", app.theme.cyan),
        };
        lines.push(Line::from(Span::styled(
            prefix,
            Style::default()
                .fg(color)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )));
        for l in wrap_text(&message.text, width) {
            lines.push(Line::from(Span::styled(
                l,
                Style::default().fg(app.theme.text).bg(bg),
            )));
        }
        lines.push(Line::from(""));
    }
    if app.in_flight > 0 {
        lines.push(Line::from(Span::styled(
            "\u{2026}",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }
    let skip = lines.len().saturating_sub(height);
    lines.split_off(skip)
}

fn media_lines<'a>(app: &App, width: usize) -> Vec<Line<'a>> {
    let theme = &app.theme;
    let bg = theme.background;
    let label = Style::default().fg(theme.dim).bg(bg);
    let value = Style::default().fg(theme.text).bg(bg);

    let Some(cell_ref) = app.session.selection() else {
        return vec![Line::from(Span::styled("No cell selected", label))];
    };
    let cell = app.session.chart().cell(cell_ref).cloned().unwrap_or_default();

    let mut lines = vec![Line::from(vec![
        Span::styled("cell  ", label),
        Span::styled(cell_ref.id(), value),
    ])];
    for (name, reference) in [("image", &cell.image_ref), ("video", &cell.video_ref)] {
        lines.push(Line::from(Span::styled(name, label)));
        match reference {
            Some(r) => {
                for l in wrap_text(&shorten_ref(r), width) {
                    lines.push(Line::from(Span::styled(l, value)));
                }
            }
            None => lines.push(Line::from(Span::styled("(none)", label))),
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("g generate or edit image", label)));
    if cell.image_ref.is_some() {
        lines.push(Line::from(Span::styled("d remove image", label)));
        lines.push(Line::from(Span::styled("i describe image", label)));
    }
    if let Some((described, text)) = &app.analysis
        && *described == cell_ref
    {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("description", label)));
        for l in wrap_text(text, width) {
            lines.push(Line::from(Span::styled(l, value)));
        }
    }
    lines
}

fn progress_lines<'a>(app: &App, width: usize) -> Vec<Line<'a>> {
    let theme = &app.theme;
    let bg = theme.background;
    let chart = app.session.chart();
    let summary = summarize(chart);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Overall ", Style::default().fg(theme.text_bright).bg(bg)),
            Span::styled(
                format!("{}%", summary.overall),
                Style::default()
                    .fg(theme.progress_color(summary.overall))
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];

    for goal in summary.sub_goals.iter().filter(|g| !g.text.is_empty()) {
        let head = format!("{:>3}% ", goal.progress);
        let name_width = width.saturating_sub(head.len());
        lines.push(Line::from(vec![
            Span::styled(
                head,
                Style::default().fg(theme.progress_color(goal.progress)).bg(bg),
            ),
            Span::styled(
                crate::util::unicode::truncate_to_width(&goal.text, name_width),
                Style::default().fg(theme.text_bright).bg(bg),
            ),
        ]));
        for task in chart.tasks[goal.index].iter().filter(|t| t.has_text()) {
            let (mark, color) = if task.completed() {
                ("  [x] ", theme.green)
            } else {
                ("  [ ] ", theme.dim)
            };
            lines.push(Line::from(vec![
                Span::styled(mark, Style::default().fg(color).bg(bg)),
                Span::styled(
                    crate::util::unicode::truncate_to_width(
                        &task.text,
                        width.saturating_sub(mark.len()),
                    ),
                    Style::default().fg(theme.text).bg(bg),
                ),
            ]));
        }
    }
    if lines.len() == 2 {
        lines.push(Line::from(Span::styled(
            "No sub-goals yet",
            Style::default().fg(theme.dim).bg(bg),
        )));
    }
    lines
}
