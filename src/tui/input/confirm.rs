use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Char('y')) => app.confirm_pending(),
        // Cancel: n or Esc
        (KeyModifiers::NONE, KeyCode::Char('n')) | (_, KeyCode::Esc) => app.cancel_pending(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chart::Chart;
    use crate::tui::app::Mode;
    use crate::tui::render::test_helpers::{app_with_chart, key, sample_chart};
    use tempfile::TempDir;

    #[test]
    fn other_keys_keep_asking() {
        let mut app = app_with_chart(sample_chart());
        app.request_clear();
        handle_confirm(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.mode, Mode::Confirm);
        assert!(app.session.pending().is_some());
        handle_confirm(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.session.pending().is_none());
        assert_eq!(app.session.chart().main_goal.text, "Get fit");
    }

    #[test]
    fn y_clears_whole_chart() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_chart(sample_chart());
        app.workspace.mandala_dir = tmp.path().to_path_buf();
        app.request_clear();
        handle_confirm(&mut app, key(KeyCode::Char('y')));
        assert_eq!(*app.session.chart(), Chart::empty());
        assert_eq!(app.mode, Mode::Navigate);
    }
}
