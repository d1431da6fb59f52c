use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditorPanes {
    pub header: Rect,
    pub editor: Rect,
    pub transcript: Rect,
}

/// One header row over a side-by-side source/transcript split, the TUI shape
/// of the original's input/output splitter.
pub fn split_editor_layout(area: Rect) -> EditorPanes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    EditorPanes {
        header: rows[0],
        editor: columns[0],
        transcript: columns[1],
    }
}
