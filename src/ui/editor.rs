use crate::runtime::frontend::EditAction;
use crate::util::clamp_to_char_boundary_left;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Snapshot {
    buffer: String,
    cursor: usize,
}

/// The document being edited: a multi-line buffer with a byte cursor, an
/// optional selection anchor, and snapshot-based undo/redo.
#[derive(Debug, Default)]
pub struct DocumentEditor {
    buffer: String,
    cursor: usize,
    anchor: Option<usize>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl DocumentEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The active selection as an ordered, non-empty byte range.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = clamp_to_char_boundary_left(&self.buffer, cursor);
        self.anchor = None;
    }

    /// Replace the whole document (file open, reformat). Clamps the cursor
    /// and keeps the edit undoable.
    pub fn set_text(&mut self, text: String) {
        self.push_undo();
        self.buffer = text;
        self.cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.anchor = None;
    }

    pub fn clear(&mut self) {
        self.push_undo();
        self.buffer.clear();
        self.cursor = 0;
        self.anchor = None;
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            buffer: self.buffer.clone(),
            cursor: self.cursor,
        }
    }

    fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
    }

    fn restore(&mut self, snap: Snapshot) {
        self.buffer = snap.buffer;
        self.cursor = clamp_to_char_boundary_left(&self.buffer, snap.cursor);
        self.anchor = None;
    }

    pub fn undo(&mut self) {
        if let Some(previous) = self.undo_stack.pop() {
            self.redo_stack.push(self.snapshot());
            self.restore(previous);
        }
    }

    pub fn redo(&mut self) {
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(self.snapshot());
            self.restore(next);
        }
    }

    pub fn insert_str(&mut self, value: &str) {
        self.push_undo();
        if let Some((from, to)) = self.selection() {
            self.buffer.replace_range(from..to, "");
            self.cursor = from;
            self.anchor = None;
        }
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        if let Some((from, to)) = self.selection() {
            self.push_undo();
            self.buffer.replace_range(from..to, "");
            self.cursor = from;
            self.anchor = None;
            return;
        }
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_char_boundary(end);
        self.push_undo();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        if let Some((from, to)) = self.selection() {
            self.push_undo();
            self.buffer.replace_range(from..to, "");
            self.cursor = from;
            self.anchor = None;
            return;
        }
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_char_boundary(start);
        self.push_undo();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    /// Splice arbitrary text over a byte range and park the cursor; the
    /// indenters use this to rewrite whole lines.
    pub fn replace_range(&mut self, from: usize, to: usize, text: &str, new_cursor: usize) {
        let from = clamp_to_char_boundary_left(&self.buffer, from);
        let to = clamp_to_char_boundary_left(&self.buffer, to.max(from));
        self.push_undo();
        self.buffer.replace_range(from..to, text);
        self.cursor = clamp_to_char_boundary_left(&self.buffer, new_cursor);
        self.anchor = None;
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        if i == 0 {
            return 0;
        }
        let mut j = i - 1;
        while j > 0 && !self.buffer.is_char_boundary(j) {
            j -= 1;
        }
        j
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        if i >= self.buffer.len() {
            return self.buffer.len();
        }
        match self.buffer[i..].chars().next() {
            Some(ch) => i + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }

    /// Byte bounds of the line containing `at` (end excludes the newline).
    pub fn line_bounds(&self, at: usize) -> (usize, usize) {
        let at = clamp_to_char_boundary_left(&self.buffer, at);
        let start = self.buffer[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = self.buffer[at..]
            .find('\n')
            .map(|i| at + i)
            .unwrap_or(self.buffer.len());
        (start, end)
    }

    pub fn current_line_bounds(&self) -> (usize, usize) {
        self.line_bounds(self.cursor)
    }

    fn begin_motion(&mut self, select: bool) {
        if select {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }
    }

    fn move_vertical(&mut self, up: bool) {
        let (start, _end) = self.current_line_bounds();
        let col = self.buffer[start..self.cursor].chars().count();
        let target_start = if up {
            if start == 0 {
                self.cursor = 0;
                return;
            }
            let (prev_start, _) = self.line_bounds(start - 1);
            prev_start
        } else {
            let (_, end) = self.current_line_bounds();
            if end >= self.buffer.len() {
                self.cursor = self.buffer.len();
                return;
            }
            end + 1
        };
        let (_, target_end) = self.line_bounds(target_start);
        let mut offset = target_start;
        for _ in 0..col {
            if offset >= target_end {
                break;
            }
            offset = self.next_char_boundary(offset);
        }
        self.cursor = offset.min(target_end);
    }

    pub fn apply(&mut self, action: EditAction) {
        match action {
            EditAction::Insert(text) => self.insert_str(&text),
            EditAction::Newline => self.insert_str("\n"),
            EditAction::Backspace => self.backspace(),
            EditAction::Delete => self.delete(),
            EditAction::MoveLeft => {
                self.begin_motion(false);
                self.cursor = self.prev_char_boundary(self.cursor);
            }
            EditAction::MoveRight => {
                self.begin_motion(false);
                self.cursor = self.next_char_boundary(self.cursor);
            }
            EditAction::MoveUp => {
                self.begin_motion(false);
                self.move_vertical(true);
            }
            EditAction::MoveDown => {
                self.begin_motion(false);
                self.move_vertical(false);
            }
            EditAction::MoveLineStart => {
                self.begin_motion(false);
                self.cursor = self.current_line_bounds().0;
            }
            EditAction::MoveLineEnd => {
                self.begin_motion(false);
                self.cursor = self.current_line_bounds().1;
            }
            EditAction::MoveBufferStart => {
                self.begin_motion(false);
                self.cursor = 0;
            }
            EditAction::MoveBufferEnd => {
                self.begin_motion(false);
                self.cursor = self.buffer.len();
            }
            EditAction::SelectLeft => {
                self.begin_motion(true);
                self.cursor = self.prev_char_boundary(self.cursor);
            }
            EditAction::SelectRight => {
                self.begin_motion(true);
                self.cursor = self.next_char_boundary(self.cursor);
            }
            EditAction::SelectUp => {
                self.begin_motion(true);
                self.move_vertical(true);
            }
            EditAction::SelectDown => {
                self.begin_motion(true);
                self.move_vertical(false);
            }
            EditAction::SelectAll => {
                self.anchor = Some(0);
                self.cursor = self.buffer.len();
            }
            EditAction::Undo => self.undo(),
            EditAction::Redo => self.redo(),
        }
    }
}
