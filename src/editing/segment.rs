use crate::util::clamp_to_char_boundary_left;

pub const STATEMENT_TERMINATOR: &str = ";;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The substring to submit to the toplevel.
    pub text: String,
    /// Where the cursor rests after submission: just past the next terminator
    /// after the original cursor, or end of text.
    pub next_cursor: usize,
}

/// Extract the statement around `cursor`, or honor an explicit selection.
///
/// Without a selection the segment runs from just after the nearest `;;` at
/// or before the cursor (or the start of text) to just after the nearest `;;`
/// at or after it (or the end). A cursor parked at end-of-text searches for
/// the preceding terminator strictly before it, so typing at the bottom of
/// the buffer re-submits the last statement instead of the whole document.
pub fn segment(text: &str, cursor: usize, selection: Option<(usize, usize)>) -> Segment {
    let cursor = clamp_to_char_boundary_left(text, cursor);

    if let Some((a, b)) = selection {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let from = clamp_to_char_boundary_left(text, from);
        let to = clamp_to_char_boundary_left(text, to);
        if from < to {
            return Segment {
                text: text[from..to].to_string(),
                next_cursor: cursor,
            };
        }
    }

    let term = STATEMENT_TERMINATOR;
    let mut start = terminator_at_or_before(text, cursor)
        .map(|i| i + term.len())
        .unwrap_or(0);
    if cursor == text.len() && cursor >= term.len() {
        // End-of-text: look strictly before the final terminator.
        start = text[..cursor - term.len()]
            .rfind(term)
            .map(|i| i + term.len())
            .unwrap_or(0);
    }

    let end = text[cursor..]
        .find(term)
        .map(|i| cursor + i + term.len())
        .unwrap_or(text.len());

    Segment {
        text: text[start..end].to_string(),
        next_cursor: end,
    }
}

/// Last occurrence of `;;` whose first byte is at or before `cursor`.
fn terminator_at_or_before(text: &str, cursor: usize) -> Option<usize> {
    let window = (cursor + STATEMENT_TERMINATOR.len()).min(text.len());
    text[..window].rfind(STATEMENT_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_at_start_takes_first_statement() {
        let text = "print_int 1;; print_int 2;;";
        let seg = segment(text, 0, None);
        assert_eq!(seg.text, "print_int 1;;");
        assert_eq!(seg.next_cursor, 13, "cursor must land just after the ;;");
    }

    #[test]
    fn test_cursor_in_second_statement() {
        let text = "print_int 1;; print_int 2;;";
        let seg = segment(text, 18, None);
        assert_eq!(seg.text, " print_int 2;;");
        assert_eq!(seg.next_cursor, text.len());
    }

    #[test]
    fn test_cursor_at_end_of_text_resubmits_last_statement() {
        let text = "print_int 1;; print_int 2;;";
        let seg = segment(text, text.len(), None);
        assert_eq!(
            seg.text, " print_int 2;;",
            "appending at the end must not resubmit the whole buffer"
        );
        assert_eq!(seg.next_cursor, text.len());
    }

    #[test]
    fn test_no_terminators_takes_everything() {
        let text = "let x = 1";
        let seg = segment(text, 4, None);
        assert_eq!(seg.text, text);
        assert_eq!(seg.next_cursor, text.len());
    }

    #[test]
    fn test_cursor_on_terminator_start_yields_empty_span() {
        // Both searches resolve to the same `;;` when the cursor sits on its
        // first byte, so there is nothing between them to submit.
        let text = "a;;b;;";
        let seg = segment(text, 1, None);
        assert_eq!(seg.text, "");
        assert_eq!(seg.next_cursor, 3);
    }

    #[test]
    fn test_cursor_inside_terminator_takes_next_statement() {
        let text = "a;;b;;";
        let seg = segment(text, 2, None);
        assert_eq!(seg.text, "b;;");
        assert_eq!(seg.next_cursor, 6);
    }

    #[test]
    fn test_selection_wins_and_keeps_cursor() {
        let text = "print_int 1;; print_int 2;;";
        let seg = segment(text, 5, Some((14, 27)));
        assert_eq!(seg.text, "print_int 2;;");
        assert_eq!(seg.next_cursor, 5, "selection must not move the cursor");
    }

    #[test]
    fn test_reversed_selection_is_normalized() {
        let text = "abc;;";
        let seg = segment(text, 0, Some((3, 0)));
        assert_eq!(seg.text, "abc");
    }

    #[test]
    fn test_empty_selection_falls_back_to_statement() {
        let text = "a;;b;;";
        let seg = segment(text, 3, Some((3, 3)));
        assert_eq!(seg.text, "b;;");
    }

    #[test]
    fn test_empty_text() {
        let seg = segment("", 0, None);
        assert_eq!(seg.text, "");
        assert_eq!(seg.next_cursor, 0);
    }
}
