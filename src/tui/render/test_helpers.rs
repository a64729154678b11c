use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::model::chart::Chart;
use crate::model::config::MandalaConfig;
use crate::model::workspace::Workspace;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Key press without modifiers
pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// "Get fit" with one sub-goal, "Run", holding a done and an open task.
pub fn sample_chart() -> Chart {
    let mut chart = Chart::empty();
    chart.main_goal.text = "Get fit".into();
    chart.sub_goals[0].text = "Run".into();
    chart.sub_goals[0].progress = Some(50);
    chart.tasks[0][0].text = "5k".into();
    chart.tasks[0][0].is_completed = Some(true);
    chart.tasks[0][1].text = "10k".into();
    chart.tasks[0][1].is_completed = Some(false);
    chart
}

/// App over an in-memory workspace with default settings
pub fn app_with_chart(chart: Chart) -> App {
    let root = PathBuf::from("/tmp/mandala-test");
    App::new(Workspace {
        mandala_dir: root.join("mandala"),
        root,
        config: MandalaConfig::default(),
        chart,
    })
}
