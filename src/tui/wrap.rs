use unicode_segmentation::UnicodeSegmentation;

use crate::util::unicode::{display_width, truncate_to_width};

/// Word-wrap `text` into lines of at most `width` cells.
///
/// Breaks at whitespace; a word wider than a whole line is split between
/// graphemes. Explicit newlines always start a new line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for logical in text.split('\n') {
        let mut current = String::new();
        let mut col = 0;
        for word in logical.split_whitespace() {
            let word_width = display_width(word);
            let sep = usize::from(!current.is_empty());
            if col + sep + word_width <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                col += sep + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                col = 0;
            }
            if word_width <= width {
                current.push_str(word);
                col = word_width;
                continue;
            }
            for grapheme in word.graphemes(true) {
                let gw = display_width(grapheme);
                if col + gw > width && col > 0 {
                    lines.push(std::mem::take(&mut current));
                    col = 0;
                }
                current.push_str(grapheme);
                col += gw;
            }
        }
        lines.push(current);
    }
    lines
}

/// [`wrap_text`] limited to `max_lines`. When text is cut, the last kept
/// line ends in `…`.
pub fn wrap_clamped(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = wrap_text(text, width);
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        *last = if display_width(last) < width {
            format!("{}\u{2026}", last)
        } else {
            truncate_to_width(last, width.saturating_sub(1))
        };
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_wrap_needed() {
        assert_eq!(wrap_text("hello world", 80), vec!["hello world"]);
    }

    #[test]
    fn wrap_at_space() {
        assert_eq!(wrap_text("hello world", 7), vec!["hello", "world"]);
    }

    #[test]
    fn char_wrap_long_word() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wide_characters() {
        assert_eq!(
            wrap_text("日本語テキスト", 6),
            vec!["日本語", "テキス", "ト"]
        );
    }

    #[test]
    fn newlines_and_empty() {
        assert_eq!(wrap_text("", 5), vec![""]);
        assert_eq!(wrap_text("a\n\nb", 5), vec!["a", "", "b"]);
        assert!(wrap_text("abc", 0).is_empty());
    }

    #[test]
    fn clamped_adds_ellipsis() {
        assert_eq!(
            wrap_clamped("one two three four", 9, 2),
            vec!["one two", "three\u{2026}"]
        );
        assert_eq!(wrap_clamped("one two", 9, 2), vec!["one two"]);
        // A full last line is shortened to make room
        assert_eq!(wrap_clamped("abcd efgh ijkl", 4, 1), vec!["ab\u{2026}"]);
    }
}
