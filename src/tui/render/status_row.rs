use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode::display_width;

const NAVIGATE_HINT: &str = "e edit  space done  s suggest  ? help";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let (mut spans, hint): (Vec<Span>, &str) = match app.mode {
        Mode::Edit => {
            let mut spans = Vec::new();
            if let Some(edit) = &app.edit {
                let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
                spans.push(Span::styled(format!("{}: ", edit.target.label()), dim));
                spans.push(Span::styled(edit.buffer[..edit.cursor].to_string(), text_style));
                spans.push(Span::styled(
                    "\u{258C}",
                    Style::default().fg(app.theme.highlight).bg(bg),
                ));
                spans.push(Span::styled(edit.buffer[edit.cursor..].to_string(), text_style));
            }
            (spans, "Enter save  Esc cancel")
        }
        Mode::Confirm => {
            let prompt = app
                .session
                .pending()
                .map(|p| p.prompt())
                .unwrap_or_default();
            (
                vec![Span::styled(
                    format!("{} (y/n)", prompt),
                    Style::default().fg(app.theme.yellow).bg(bg),
                )],
                "",
            )
        }
        Mode::Help => (Vec::new(), "any key to close"),
        Mode::Navigate => {
            let hint = if app.workspace.config.ui.show_key_hints {
                NAVIGATE_HINT
            } else {
                ""
            };
            if let Some(status) = &app.status {
                let color = if status.is_error {
                    app.theme.red
                } else {
                    app.theme.green
                };
                (
                    vec![Span::styled(
                        status.text.clone(),
                        Style::default().fg(color).bg(bg),
                    )],
                    hint,
                )
            } else if app.in_flight > 0 {
                (
                    vec![Span::styled(
                        "Thinking\u{2026}",
                        Style::default().fg(app.theme.cyan).bg(bg),
                    )],
                    hint,
                )
            } else {
                (Vec::new(), hint)
            }
        }
    };

    // Right-align the hint when it fits
    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(hint);
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, dim));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
