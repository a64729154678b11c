use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::grid::Direction;
use crate::ops::panels::Panel;
use crate::tui::app::{App, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }
    app.status = None;

    match key.code {
        // Cursor
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(Direction::Down),
        KeyCode::Left | KeyCode::Char('h') => app.move_cursor(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => app.move_cursor(Direction::Right),
        KeyCode::Enter => app.activate(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Cell content
        KeyCode::Char('e') => app.begin_text_edit(),
        KeyCode::Char('n') => app.begin_notes_edit(),
        KeyCode::Char(' ') => app.toggle_task(),
        KeyCode::Char('f') => app.cycle_frequency(),
        KeyCode::Char('d') => app.remove_media(),
        KeyCode::Char('x') => app.request_clear(),

        // Assistant
        KeyCode::Char('s') => app.suggest(),
        KeyCode::Char('a') => app.begin_chat_input(),
        KeyCode::Char('g') => app.begin_image_prompt(),
        KeyCode::Char('i') => app.begin_analyze_prompt(),

        // Panels and display
        KeyCode::Char('c') => app.toggle_panel(Panel::Chat),
        KeyCode::Char('m') => app.toggle_panel(Panel::Media),
        KeyCode::Char('p') => app.toggle_panel(Panel::Progress),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('+') => app.cycle_font_size(),

        KeyCode::Char('w') => app.save(),
        KeyCode::Char('?') => app.mode = Mode::Help,
        KeyCode::Char('q') => app.request_quit(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chart::{CellRef, Chart};
    use crate::model::config::{FontSize, ThemeMode};
    use crate::model::view::ViewMode;
    use crate::tui::render::test_helpers::{app_with_chart, key, sample_chart};
    use crate::tui::theme::Theme;

    fn press(app: &mut App, keys: &str) {
        for c in keys.chars() {
            handle_navigate(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn vim_keys_move_cursor() {
        let mut app = app_with_chart(Chart::empty());
        press(&mut app, "kl");
        assert_eq!(app.session.selection(), Some(CellRef::SubGoal(2)));
        press(&mut app, "jjhh");
        assert_eq!(app.session.selection(), Some(CellRef::SubGoal(6)));
    }

    #[test]
    fn enter_and_esc_navigate_views() {
        let mut app = app_with_chart(sample_chart());
        press(&mut app, "h");
        handle_navigate(&mut app, key(KeyCode::Enter));
        assert_eq!(app.session.mode(), ViewMode::Sub(7));
        handle_navigate(&mut app, key(KeyCode::Esc));
        assert_eq!(app.session.mode(), ViewMode::Main);
        assert_eq!(app.session.selection(), Some(CellRef::SubGoal(7)));
    }

    #[test]
    fn space_toggles_task_and_progress() {
        let mut app = app_with_chart(sample_chart());
        press(&mut app, "kh");
        handle_navigate(&mut app, key(KeyCode::Enter));
        press(&mut app, "k");
        // task-0-1 "10k" is open; completing it finishes sub-goal 0
        press(&mut app, " ");
        assert!(app.session.chart().tasks[0][1].completed());
        assert_eq!(app.session.chart().sub_goals[0].progress, Some(100));
        press(&mut app, "f");
        assert_eq!(app.status.as_ref().unwrap().text, "task-0-1 repeats daily");
    }

    #[test]
    fn space_on_sub_goal_is_an_error() {
        let mut app = app_with_chart(sample_chart());
        press(&mut app, "k ");
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn panels_are_exclusive() {
        let mut app = app_with_chart(sample_chart());
        press(&mut app, "c");
        assert_eq!(app.session.open_panel(), Some(Panel::Chat));
        press(&mut app, "p");
        assert_eq!(app.session.open_panel(), Some(Panel::Progress));
        press(&mut app, "m");
        assert_eq!(app.session.open_panel(), Some(Panel::Media));
        press(&mut app, "m");
        assert_eq!(app.session.open_panel(), None);
    }

    #[test]
    fn display_toggles() {
        let mut app = app_with_chart(Chart::empty());
        press(&mut app, "t");
        assert_eq!(app.session.theme(), ThemeMode::Light);
        assert_eq!(app.theme, Theme::light());
        press(&mut app, "+");
        assert_eq!(app.session.font_size(), FontSize::Large);
    }

    #[test]
    fn help_and_edit_modes() {
        let mut app = app_with_chart(Chart::empty());
        press(&mut app, "?");
        assert_eq!(app.mode, Mode::Help);

        let mut app = app_with_chart(Chart::empty());
        press(&mut app, "e");
        assert_eq!(app.mode, Mode::Edit);
    }

    #[test]
    fn ctrl_c_quits_immediately() {
        let mut app = app_with_chart(Chart::empty());
        app.session
            .update_ref(CellRef::Main, &crate::model::cell::CellPatch::text("x"));
        handle_navigate(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
