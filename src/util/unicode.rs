use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Cells a tab occupies in a grid cell or on the status row
const TAB_WIDTH: usize = 4;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

fn grapheme_width(g: &str) -> usize {
    if g == "\t" {
        TAB_WIDTH
    } else {
        UnicodeWidthStr::width(g)
    }
}

/// Cut `s` down to `max_cells` terminal cells, ending in `…` when anything
/// was dropped.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = grapheme_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Byte offset of the grapheme after the one at `offset`, or None at the end.
pub fn next_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let (_, g) = s.get(offset..)?.grapheme_indices(true).next()?;
    Some(offset + g.len())
}

/// Byte offset of the grapheme before `offset`, or None at the start.
pub fn prev_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    s.get(..offset)?
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
}

fn is_space(g: &str) -> bool {
    g.chars().all(char::is_whitespace)
}

/// Start of the word left of `offset`, skipping whitespace first.
pub fn word_boundary_left(s: &str, offset: usize) -> usize {
    let Some(prefix) = s.get(..offset) else {
        return 0;
    };
    let mut start = offset;
    let mut in_word = false;
    for (i, g) in prefix.grapheme_indices(true).rev() {
        if is_space(g) {
            if in_word {
                break;
            }
        } else {
            in_word = true;
        }
        start = i;
    }
    if in_word { start } else { 0 }
}

/// Start of the next word right of `offset`, or the end of `s`.
pub fn word_boundary_right(s: &str, offset: usize) -> usize {
    let Some(suffix) = s.get(offset..) else {
        return s.len();
    };
    let mut seen_space = false;
    for (i, g) in suffix.grapheme_indices(true) {
        if is_space(g) {
            seen_space = true;
        } else if seen_space {
            return offset + i;
        }
    }
    s.len()
}
