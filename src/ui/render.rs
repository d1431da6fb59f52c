use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{TranscriptKind, TranscriptLine};
use crate::ui::editor::DocumentEditor;
use crate::ui::input_metrics::{cursor_row_col, truncate_to_display_width};

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let text = truncate_to_display_width(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Source pane: unwrapped lines with a following viewport, selection shading,
/// and the terminal cursor parked on the edit point.
pub fn render_editor(frame: &mut Frame<'_>, area: Rect, editor: &DocumentEditor) {
    if area.height < 2 || area.width < 3 {
        return;
    }
    let block = Block::default().borders(Borders::RIGHT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = editor.buffer();
    let (cursor_row, cursor_col) = cursor_row_col(text, editor.cursor());
    let visible_rows = inner.height as usize;
    let first_row = cursor_row.saturating_add(1).saturating_sub(visible_rows);
    let h_scroll = cursor_col.saturating_add(1).saturating_sub(inner.width as usize);

    let selection = editor.selection();
    let mut rendered = Vec::with_capacity(visible_rows);
    let mut line_start = 0usize;
    for (row, line) in text.split('\n').enumerate() {
        let line_end = line_start + line.len();
        if row >= first_row && row < first_row + visible_rows {
            rendered.push(editor_line(line, line_start, selection));
        }
        line_start = line_end + 1;
        if row >= first_row + visible_rows {
            break;
        }
    }

    frame.render_widget(
        Paragraph::new(rendered)
            .style(Style::default().fg(Color::White))
            .scroll((0, h_scroll as u16)),
        inner,
    );

    let cursor_x = inner.x + (cursor_col.saturating_sub(h_scroll)) as u16;
    let cursor_y = inner.y + (cursor_row - first_row) as u16;
    frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), cursor_y));
}

fn editor_line(line: &str, line_start: usize, selection: Option<(usize, usize)>) -> Line<'static> {
    let selected = Style::default().bg(Color::Rgb(60, 60, 90));
    let Some((from, to)) = selection else {
        return Line::from(line.to_string());
    };
    let line_end = line_start + line.len();
    if to <= line_start || from >= line_end {
        return Line::from(line.to_string());
    }
    let sel_from = from.max(line_start) - line_start;
    let sel_to = to.min(line_end) - line_start;
    Line::from(vec![
        Span::raw(line[..sel_from].to_string()),
        Span::styled(line[sel_from..sel_to].to_string(), selected),
        Span::raw(line[sel_to..].to_string()),
    ])
}

/// Transcript pane: one styled line per entry, scrolled from the mode's
/// scroll state.
pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    lines: &[TranscriptLine],
    scroll: usize,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let rendered: Vec<Line<'_>> = lines
        .iter()
        .map(|line| Line::styled(line.text.clone(), transcript_style(line.kind)))
        .collect();
    frame.render_widget(
        Paragraph::new(rendered).scroll((scroll as u16, 0)),
        area,
    );
}

fn transcript_style(kind: TranscriptKind) -> Style {
    match kind {
        TranscriptKind::Toplevel => Style::default().fg(Color::White),
        TranscriptKind::Echo => Style::default().fg(Color::Blue),
        TranscriptKind::Error => Style::default().fg(Color::Red),
        TranscriptKind::Notice => Style::default().fg(Color::DarkGray),
        TranscriptKind::Diagram => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    }
}
