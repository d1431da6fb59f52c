use unicode_width::UnicodeWidthChar;

use crate::util::clamp_to_char_boundary_left;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

/// (row, display column) of a byte offset in unwrapped multi-line text.
pub fn cursor_row_col(text: &str, cursor_byte: usize) -> (usize, usize) {
    let cursor_byte = clamp_to_char_boundary_left(text, cursor_byte);
    let mut row = 0usize;
    let mut col = 0usize;
    for (idx, ch) in text.char_indices() {
        if idx >= cursor_byte {
            break;
        }
        if ch == '\n' {
            row += 1;
            col = 0;
        } else if ch != '\r' {
            col += char_display_width(ch);
        }
    }
    (row, col)
}

pub fn truncate_to_display_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width && used > 0 {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}
