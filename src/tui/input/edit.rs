use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, EditState};
use crate::util::unicode::{
    next_grapheme_boundary, prev_grapheme_boundary, word_boundary_left, word_boundary_right,
};

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Enter) => app.confirm_edit(),
        (_, KeyCode::Esc) => app.cancel_edit(),
        _ => {
            if let Some(edit) = app.edit.as_mut() {
                edit_line(edit, key);
            }
        }
    }
}

/// Apply a line-editing key to the buffer.
fn edit_line(edit: &mut EditState, key: KeyEvent) {
    let word = key.modifiers.contains(KeyModifiers::ALT)
        || key.modifiers.contains(KeyModifiers::CONTROL);
    let buf = &mut edit.buffer;
    match key.code {
        KeyCode::Left if word => edit.cursor = word_boundary_left(buf, edit.cursor),
        KeyCode::Right if word => edit.cursor = word_boundary_right(buf, edit.cursor),
        KeyCode::Left => {
            if let Some(prev) = prev_grapheme_boundary(buf, edit.cursor) {
                edit.cursor = prev;
            }
        }
        KeyCode::Right => {
            if let Some(next) = next_grapheme_boundary(buf, edit.cursor) {
                edit.cursor = next;
            }
        }
        KeyCode::Home => edit.cursor = 0,
        KeyCode::End => edit.cursor = buf.len(),
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => edit.cursor = 0,
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            edit.cursor = buf.len()
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            buf.replace_range(..edit.cursor, "");
            edit.cursor = 0;
        }
        KeyCode::Backspace if word => {
            let start = word_boundary_left(buf, edit.cursor);
            buf.replace_range(start..edit.cursor, "");
            edit.cursor = start;
        }
        KeyCode::Backspace => {
            if let Some(prev) = prev_grapheme_boundary(buf, edit.cursor) {
                buf.replace_range(prev..edit.cursor, "");
                edit.cursor = prev;
            }
        }
        KeyCode::Delete => {
            if let Some(next) = next_grapheme_boundary(buf, edit.cursor) {
                buf.replace_range(edit.cursor..next, "");
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buf.insert(edit.cursor, c);
            edit.cursor += c.len_utf8();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chart::{CellRef, Chart};
    use crate::tui::app::{EditTarget, Mode};
    use crate::tui::render::test_helpers::{app_with_chart, key};

    fn state(buffer: &str, cursor: usize) -> EditState {
        EditState {
            target: EditTarget::Text(CellRef::Main),
            buffer: buffer.to_string(),
            cursor,
        }
    }

    fn alt(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::ALT)
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut edit = state("Rn", 1);
        edit_line(&mut edit, key(KeyCode::Char('u')));
        assert_eq!(edit.buffer, "Run");
        assert_eq!(edit.cursor, 2);
        edit_line(&mut edit, key(KeyCode::End));
        edit_line(&mut edit, key(KeyCode::Char('é')));
        assert_eq!(edit.buffer, "Runé");
        assert_eq!(edit.cursor, "Runé".len());
    }

    #[test]
    fn backspace_removes_whole_graphemes() {
        let mut edit = state("ok 👍🏽", "ok 👍🏽".len());
        edit_line(&mut edit, key(KeyCode::Backspace));
        assert_eq!(edit.buffer, "ok ");
        edit_line(&mut edit, key(KeyCode::Home));
        edit_line(&mut edit, key(KeyCode::Backspace));
        assert_eq!(edit.buffer, "ok ");
        edit_line(&mut edit, key(KeyCode::Delete));
        assert_eq!(edit.buffer, "k ");
    }

    #[test]
    fn word_motions() {
        let mut edit = state("run every day", 13);
        edit_line(&mut edit, alt(KeyCode::Left));
        assert_eq!(edit.cursor, 10);
        edit_line(&mut edit, alt(KeyCode::Backspace));
        assert_eq!(edit.buffer, "run day");
        assert_eq!(edit.cursor, 4);
        edit_line(&mut edit, key(KeyCode::Home));
        edit_line(&mut edit, alt(KeyCode::Right));
        assert_eq!(edit.cursor, 4);
    }

    #[test]
    fn ctrl_u_clears_before_cursor() {
        let mut edit = state("old text", 4);
        edit_line(&mut edit, KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(edit.buffer, "text");
        assert_eq!(edit.cursor, 0);
    }

    #[test]
    fn enter_commits_and_esc_discards() {
        let mut app = app_with_chart(Chart::empty());
        app.begin_text_edit();
        for c in "Learn piano".chars() {
            handle_edit(&mut app, key(KeyCode::Char(c)));
        }
        handle_edit(&mut app, key(KeyCode::Enter));
        assert_eq!(app.session.chart().main_goal.text, "Learn piano");
        assert_eq!(app.mode, Mode::Navigate);

        app.begin_text_edit();
        handle_edit(&mut app, key(KeyCode::Char('!')));
        handle_edit(&mut app, key(KeyCode::Esc));
        assert_eq!(app.session.chart().main_goal.text, "Learn piano");
        assert!(app.edit.is_none());
    }
}
