//! Display width helpers for terminal cells.
//!
//! Wide (East Asian, emoji) graphemes take two columns and control
//! characters take none. Positions inside a line are char offsets; these
//! helpers convert between those and screen columns.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Columns occupied by one grapheme cluster.
pub fn grapheme_width(grapheme: &str) -> usize {
    // Tabs are drawn as a single blank
    if grapheme == "\t" {
        return 1;
    }
    if grapheme.chars().all(char::is_control) {
        return 0;
    }
    // Multi-codepoint emoji sequences render as a single wide cell
    if grapheme.chars().count() > 1 && grapheme.contains('\u{200D}') {
        return 2;
    }
    UnicodeWidthStr::width(grapheme)
}

pub fn str_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

/// Screen column at which the char at `char_idx` starts.
pub fn char_index_to_col(line: &str, char_idx: usize) -> usize {
    let mut col = 0;
    let mut chars_seen = 0;
    for grapheme in line.graphemes(true) {
        if chars_seen >= char_idx {
            break;
        }
        col += grapheme_width(grapheme);
        chars_seen += grapheme.chars().count();
    }
    col
}

/// Char offset of the grapheme covering `col`; past the end yields the
/// line's char count.
pub fn col_to_char_index(line: &str, col: usize) -> usize {
    let mut width = 0;
    let mut char_idx = 0;
    for grapheme in line.graphemes(true) {
        let w = grapheme_width(grapheme);
        if width + w > col {
            return char_idx;
        }
        width += w;
        char_idx += grapheme.chars().count();
    }
    char_idx
}

/// Cuts `text` to at most `width` columns, never splitting a grapheme.
pub fn truncate(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, grapheme) in text.grapheme_indices(true) {
        let w = grapheme_width(grapheme);
        if used + w > width {
            return &text[..idx];
        }
        used += w;
    }
    text
}

/// Drops the first `cols` columns of `text`. Returns the number of chars
/// dropped and the rest; a wide grapheme cut in half leaves blanks.
pub fn skip_cols(text: &str, cols: usize) -> (usize, String) {
    let mut used = 0;
    let mut chars = 0;
    for (idx, grapheme) in text.grapheme_indices(true) {
        if used >= cols {
            let pad = " ".repeat(used - cols);
            return (chars, pad + &text[idx..]);
        }
        used += grapheme_width(grapheme);
        chars += grapheme.chars().count();
    }
    (chars, " ".repeat(used.saturating_sub(cols)))
}

/// Truncates or right-pads with spaces to exactly `width` columns.
pub fn fit(text: &str, width: usize) -> String {
    let cut = truncate(text, width);
    let mut out = String::with_capacity(width);
    out.push_str(cut);
    for _ in str_width(cut)..width {
        out.push(' ');
    }
    out
}
