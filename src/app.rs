use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::editing::{prepare_submission, segment};
use crate::indent::{IndentEngine, IndentState};
use crate::runtime::frontend::{EditAction, ScrollAction, UserInputEvent};
use crate::runtime::r#loop::Runtime;
use crate::runtime::{OutputChannel, RuntimeContext, RuntimeMode, UiUpdate};
use crate::session::{RecentFiles, ToplevelSession};
use crate::ui::editor::DocumentEditor;

const DEFAULT_MAX_TRANSCRIPT_LINES: usize = 2000;
const MAX_TRANSCRIPT_LINES_ENV: &str = "CAMLPAD_MAX_TRANSCRIPT_LINES";
const UNTITLED_SAVE_PATH: &str = "untitled.ml";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptKind {
    Toplevel,
    Echo,
    Error,
    Notice,
    Diagram,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptLine {
    pub text: String,
    pub kind: TranscriptKind,
}

/// The output pane: capped scrollback with auto-follow, fed by arbitrary
/// text chunks that may or may not end in a newline.
struct TranscriptState {
    lines: Vec<TranscriptLine>,
    scroll_offset: usize,
    auto_follow: bool,
    line_cap: usize,
    /// The last pushed chunk did not end its line; the next chunk of the same
    /// kind continues it.
    open_kind: Option<TranscriptKind>,
}

impl TranscriptState {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            scroll_offset: 0,
            auto_follow: true,
            line_cap: resolve_transcript_line_cap(),
            open_kind: None,
        }
    }

    fn push_text(&mut self, kind: TranscriptKind, text: &str) {
        let mut continuing = self.open_kind == Some(kind);
        let closes_line = text.ends_with('\n');
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                continuing = false;
            }
            if segment.is_empty() {
                // Collapse runs of blank lines; a trailing empty segment is
                // just the final newline.
                continue;
            }
            if continuing {
                if let Some(last) = self.lines.last_mut() {
                    last.text.push_str(segment);
                    continue;
                }
            }
            self.lines.push(TranscriptLine {
                text: segment.to_string(),
                kind,
            });
        }
        self.open_kind = if closes_line { None } else { Some(kind) };
        self.after_append();
    }

    fn push_line(&mut self, kind: TranscriptKind, text: String) {
        self.open_kind = None;
        self.lines.push(TranscriptLine { text, kind });
        self.after_append();
    }

    fn after_append(&mut self) {
        self.enforce_cap();
        if self.auto_follow {
            self.scroll_offset = self.max_scroll_offset();
        } else {
            self.clamp_scroll();
        }
    }

    fn enforce_cap(&mut self) {
        if self.lines.len() > self.line_cap {
            let excess = self.lines.len() - self.line_cap;
            self.lines.drain(..excess);
            self.scroll_offset = self.scroll_offset.saturating_sub(excess);
        }
    }

    fn max_scroll_offset(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
    }

    fn apply_scroll(&mut self, action: ScrollAction) {
        match action {
            ScrollAction::LineUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                self.auto_follow = false;
            }
            ScrollAction::LineDown => {
                self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll_offset());
                self.auto_follow = self.scroll_offset >= self.max_scroll_offset();
            }
            ScrollAction::PageUp(step) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(step.max(1));
                self.auto_follow = false;
            }
            ScrollAction::PageDown(step) => {
                self.scroll_offset =
                    (self.scroll_offset + step.max(1)).min(self.max_scroll_offset());
                self.auto_follow = self.scroll_offset >= self.max_scroll_offset();
            }
            ScrollAction::Home => {
                self.scroll_offset = 0;
                self.auto_follow = false;
            }
            ScrollAction::End => {
                self.scroll_offset = self.max_scroll_offset();
                self.auto_follow = true;
            }
        }
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.scroll_offset = 0;
        self.auto_follow = true;
        self.open_kind = None;
    }
}

fn resolve_transcript_line_cap() -> usize {
    std::env::var(MAX_TRANSCRIPT_LINES_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|cap| *cap > 0)
        .unwrap_or(DEFAULT_MAX_TRANSCRIPT_LINES)
}

/// An action that would lose unsaved work arms itself on first press and only
/// runs when repeated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArmedAction {
    Quit,
    NewDocument,
}

/// The editor application: document state on the left, transcript on the
/// right, and the key commands that drive the indent engine, the statement
/// segmenter, and the toplevel session.
pub struct EditorMode {
    transcript: TranscriptState,
    editor: DocumentEditor,
    indent: IndentEngine,
    indent_on_enter: bool,
    /// (line-start offset, carry state) from the last live-indent run; valid
    /// until the next edit elsewhere in the buffer.
    indent_cache: Option<(usize, IndentState)>,
    config: Config,
    recent: RecentFiles,
    current_file: Option<PathBuf>,
    unsaved_changes: bool,
    toplevel_running: bool,
    armed: Option<ArmedAction>,
    quit_requested: bool,
}

impl EditorMode {
    pub fn new(config: Config) -> Self {
        let recent = RecentFiles::from_entries(
            config.recent_capacity,
            config.recent_files.iter().cloned(),
        );
        Self {
            transcript: TranscriptState::new(),
            editor: DocumentEditor::new(),
            indent: IndentEngine::new(config.indent_unit),
            indent_on_enter: config.indent_on_enter,
            indent_cache: None,
            recent,
            config,
            current_file: None,
            unsaved_changes: false,
            toplevel_running: false,
            armed: None,
            quit_requested: false,
        }
    }

    pub fn editor(&self) -> &DocumentEditor {
        &self.editor
    }

    pub fn transcript_lines(&self) -> &[TranscriptLine] {
        &self.transcript.lines
    }

    pub fn transcript_scroll(&self) -> usize {
        self.transcript.scroll_offset
    }

    pub fn recent_files(&self) -> &RecentFiles {
        &self.recent
    }

    pub fn status_line(&self) -> String {
        let file = self
            .current_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let dirty = if self.unsaved_changes { "*" } else { "" };
        let caml = if self.toplevel_running {
            "running"
        } else {
            "stopped"
        };
        let indent = if self.indent_on_enter { "on" } else { "off" };
        format!(
            "cpad  file:{file}{dirty}  caml:{caml}  indent-on-enter:{indent}  transcript:{}",
            self.transcript.lines.len()
        )
    }

    /// Load a file into the editor (startup path, recent-files path).
    pub fn open_file(&mut self, path: PathBuf) -> Result<()> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("unable to open {}", path.display()))?;
        self.editor.set_text(text);
        self.editor.set_cursor(0);
        self.remember_file(path);
        self.unsaved_changes = false;
        self.indent_cache = None;
        Ok(())
    }

    fn remember_file(&mut self, path: PathBuf) {
        self.recent.promote(path.display().to_string());
        self.current_file = Some(path);
        self.persist_preferences();
    }

    fn persist_preferences(&mut self) {
        self.config.recent_files = self.recent.to_vec();
        self.config.indent_on_enter = self.indent_on_enter;
        if let Err(error) = self.config.save() {
            self.notice(&format!("settings not saved: {error:#}"));
        }
    }

    fn notice(&mut self, text: &str) {
        self.transcript
            .push_line(TranscriptKind::Notice, format!("[{text}]"));
    }

    fn edit(&mut self, action: EditAction) {
        let was_newline = action == EditAction::Newline;
        self.editor.apply(action);
        self.unsaved_changes = true;
        self.armed = None;
        if was_newline && self.indent_on_enter {
            self.live_indent_after_newline();
        } else {
            self.indent_cache = None;
        }
    }

    /// The Enter-key assist: re-derive the just-completed line's indentation
    /// and open the new line at the resulting depth.
    fn live_indent_after_newline(&mut self) {
        let buffer = self.editor.buffer().to_string();
        let cursor = self.editor.cursor();
        if cursor == 0 || buffer.as_bytes().get(cursor - 1) != Some(&b'\n') {
            self.indent_cache = None;
            return;
        }

        let new_line_start = cursor;
        let prev_line_start = buffer[..new_line_start - 1]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let prev_line = &buffer[prev_line_start..new_line_start - 1];
        let cur_line_end = buffer[new_line_start..]
            .find('\n')
            .map(|i| new_line_start + i)
            .unwrap_or(buffer.len());
        let cur_line = &buffer[new_line_start..cur_line_end];

        let mut state = match &self.indent_cache {
            Some((offset, cached)) if *offset == prev_line_start => cached.clone(),
            _ => self.indent.state_at(&buffer, prev_line_start),
        };

        let new_prev = self.indent.reindent_line(prev_line, &mut state);
        let carry_after_prev = state.clone();
        // A fresh empty line still gets its leading whitespace so typing
        // starts at depth; the buffer-wide pass would leave it bare.
        let new_cur = if cur_line.trim_start().is_empty() {
            " ".repeat(self.config.indent_unit * state.depth())
        } else {
            self.indent.reindent_line(cur_line, &mut state)
        };
        let indent_len = new_cur.len() - new_cur.trim_start().len();

        let replacement = format!("{new_prev}\n{new_cur}");
        let new_cursor = prev_line_start + new_prev.len() + 1 + indent_len;
        self.editor
            .replace_range(prev_line_start, cur_line_end, &replacement, new_cursor);

        self.indent_cache = Some((prev_line_start + new_prev.len() + 1, carry_after_prev));
    }

    fn send_to_toplevel(&mut self, ctx: &mut RuntimeContext) {
        let selection = self.editor.selection();
        let seg = segment(self.editor.buffer(), self.editor.cursor(), selection);
        let payload = prepare_submission(&seg.text);
        ctx.submit(payload);
        if selection.is_none() {
            self.editor.set_cursor(seg.next_cursor);
        }
    }

    fn reindent_buffer(&mut self) {
        let reindented = self.indent.reindent_buffer(self.editor.buffer());
        if reindented != self.editor.buffer() {
            self.editor.set_text(reindented);
            self.unsaved_changes = true;
        }
        self.indent_cache = None;
    }

    fn unindent_current_line(&mut self) {
        let (start, end) = self.editor.current_line_bounds();
        let line = self.editor.buffer()[start..end].to_string();
        let trimmed = IndentEngine::unindent_once(&line);
        if trimmed.len() == line.len() {
            return;
        }
        let cursor = self.editor.cursor();
        let new_cursor = if cursor > start { cursor - 1 } else { start };
        self.editor.replace_range(start, end, trimmed, new_cursor);
        self.unsaved_changes = true;
        self.indent_cache = None;
    }

    fn save_document(&mut self) {
        let path = self
            .current_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(UNTITLED_SAVE_PATH));
        match std::fs::write(&path, self.editor.buffer()) {
            Ok(()) => {
                self.unsaved_changes = false;
                self.notice(&format!("saved {}", path.display()));
                self.remember_file(path);
            }
            Err(error) => {
                self.transcript.push_line(
                    TranscriptKind::Error,
                    format!("[unable to save {}: {error}]", path.display()),
                );
            }
        }
    }

    fn new_document(&mut self, ctx: &mut RuntimeContext) {
        if self.unsaved_changes && self.armed != Some(ArmedAction::NewDocument) {
            self.armed = Some(ArmedAction::NewDocument);
            self.notice("unsaved changes; press again to discard them");
            return;
        }
        self.armed = None;
        self.editor.clear();
        self.transcript.clear();
        self.current_file = None;
        self.unsaved_changes = false;
        self.indent_cache = None;
        ctx.reset();
    }

    fn request_quit(&mut self) {
        if self.unsaved_changes && self.armed != Some(ArmedAction::Quit) {
            self.armed = Some(ArmedAction::Quit);
            self.notice("unsaved changes; press again to quit without saving");
            return;
        }
        self.quit_requested = true;
    }
}

impl RuntimeMode for EditorMode {
    fn on_frontend_event(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext) {
        match event {
            UserInputEvent::Edit(action) => self.edit(action),
            UserInputEvent::SendToToplevel => {
                self.armed = None;
                self.send_to_toplevel(ctx);
            }
            UserInputEvent::ReindentBuffer => self.reindent_buffer(),
            UserInputEvent::Unindent => self.unindent_current_line(),
            UserInputEvent::ToggleIndentOnEnter => {
                self.indent_on_enter = !self.indent_on_enter;
                let state = if self.indent_on_enter { "on" } else { "off" };
                self.notice(&format!("indent-on-enter {state}"));
                self.persist_preferences();
            }
            UserInputEvent::InterruptToplevel => ctx.interrupt(),
            UserInputEvent::StopToplevel => ctx.stop(),
            UserInputEvent::ClearTranscript => self.transcript.clear(),
            UserInputEvent::NewDocument => self.new_document(ctx),
            UserInputEvent::SaveDocument => self.save_document(),
            UserInputEvent::Scroll(action) => self.transcript.apply_scroll(action),
            UserInputEvent::Quit => self.request_quit(),
        }
    }

    fn on_session_update(&mut self, update: UiUpdate, _ctx: &mut RuntimeContext) {
        match update {
            UiUpdate::Output { channel, text } => {
                let kind = match channel {
                    OutputChannel::Toplevel => TranscriptKind::Toplevel,
                    OutputChannel::Echo => TranscriptKind::Echo,
                    OutputChannel::Error => TranscriptKind::Error,
                    OutputChannel::Notice => TranscriptKind::Notice,
                };
                self.transcript.push_text(kind, &text);
            }
            UiUpdate::Diagram { index, lines } => {
                self.transcript
                    .push_line(TranscriptKind::Diagram, format!("[tree #{index}]"));
                for line in lines {
                    self.transcript.push_line(TranscriptKind::Diagram, line);
                }
            }
            UiUpdate::ToplevelState { running } => self.toplevel_running = running,
            UiUpdate::Warning(message) => {
                self.transcript
                    .push_line(TranscriptKind::Error, format!("[warning] {message}"));
            }
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

pub fn build_runtime(
    config: Config,
    initial_file: Option<PathBuf>,
) -> Result<(Runtime<EditorMode>, RuntimeContext)> {
    let session = ToplevelSession::new(config.clone());
    let ctx = RuntimeContext::new(session);
    let mut mode = EditorMode::new(config);
    if let Some(path) = initial_file {
        mode.open_file(path)?;
    }
    Ok((Runtime::new(mode), ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::context::SessionRequest;

    fn setup() -> (EditorMode, RuntimeContext) {
        let config = Config::default();
        let mode = EditorMode::new(config.clone());
        let ctx = RuntimeContext::new(ToplevelSession::new(config));
        (mode, ctx)
    }

    fn type_text(mode: &mut EditorMode, ctx: &mut RuntimeContext, text: &str) {
        for ch in text.chars() {
            let event = if ch == '\n' {
                UserInputEvent::Edit(EditAction::Newline)
            } else {
                UserInputEvent::Edit(EditAction::Insert(ch.to_string()))
            };
            mode.on_frontend_event(event, ctx);
        }
    }

    #[test]
    fn test_send_extracts_statement_and_moves_cursor() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "print_int 1;; print_int 2;;");
        mode.editor.set_cursor(0);

        mode.on_frontend_event(UserInputEvent::SendToToplevel, &mut ctx);

        assert_eq!(
            ctx.pending_requests(),
            &[SessionRequest::Submit("print_int 1;;\n".to_string())]
        );
        assert_eq!(
            mode.editor.cursor(),
            13,
            "cursor must land just after the submitted statement's ;;"
        );
    }

    #[test]
    fn test_send_with_selection_keeps_cursor() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "abc;;");
        mode.editor.set_cursor(0);
        for _ in 0..3 {
            mode.on_frontend_event(UserInputEvent::Edit(EditAction::SelectRight), &mut ctx);
        }
        mode.on_frontend_event(UserInputEvent::SendToToplevel, &mut ctx);
        assert_eq!(
            ctx.pending_requests(),
            &[SessionRequest::Submit("abc\n".to_string())]
        );
        assert_eq!(mode.editor.cursor(), 3, "selection send must not move the cursor");
    }

    #[test]
    fn test_submission_strips_comments() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "let x = 1 (* hidden *);;");
        mode.editor.set_cursor(0);
        mode.on_frontend_event(UserInputEvent::SendToToplevel, &mut ctx);
        assert_eq!(
            ctx.pending_requests(),
            &[SessionRequest::Submit("let x = 1 ;;\n".to_string())]
        );
    }

    #[test]
    fn test_live_indent_on_enter_opens_nested_line() {
        let (mut mode, mut ctx) = setup();
        mode.indent_on_enter = true;
        type_text(&mut mode, &mut ctx, "while true do");
        mode.on_frontend_event(UserInputEvent::Edit(EditAction::Newline), &mut ctx);

        assert_eq!(mode.editor.buffer(), "while true do\n   ");
        assert_eq!(mode.editor.cursor(), mode.editor.buffer().len());
    }

    #[test]
    fn test_live_indent_realigns_closer_line() {
        let (mut mode, mut ctx) = setup();
        mode.indent_on_enter = true;
        type_text(&mut mode, &mut ctx, "while true do\nprint_int 1;\ndone");
        // The engine indents as we type; finishing the done line realigns it.
        mode.on_frontend_event(UserInputEvent::Edit(EditAction::Newline), &mut ctx);
        assert_eq!(
            mode.editor.buffer(),
            "while true do\n   print_int 1;\ndone\n"
        );
    }

    #[test]
    fn test_indent_off_leaves_lines_alone() {
        let (mut mode, mut ctx) = setup();
        mode.indent_on_enter = false;
        type_text(&mut mode, &mut ctx, "while true do\nx");
        assert_eq!(mode.editor.buffer(), "while true do\nx");
    }

    #[test]
    fn test_reindent_buffer_command() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "begin\nx;\nend");
        mode.on_frontend_event(UserInputEvent::ReindentBuffer, &mut ctx);
        assert_eq!(mode.editor.buffer(), "begin\n   x;\nend");
    }

    #[test]
    fn test_unindent_removes_exactly_one_leading_char() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "   done");
        mode.on_frontend_event(UserInputEvent::Unindent, &mut ctx);
        assert_eq!(mode.editor.buffer(), "  done");
        mode.on_frontend_event(UserInputEvent::Unindent, &mut ctx);
        assert_eq!(mode.editor.buffer(), " done");
    }

    #[test]
    fn test_transcript_continuation_joins_partial_chunks() {
        let (mut mode, mut ctx) = setup();
        mode.on_session_update(
            UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "val x : ".to_string(),
            },
            &mut ctx,
        );
        mode.on_session_update(
            UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "int = 3\n".to_string(),
            },
            &mut ctx,
        );
        assert_eq!(mode.transcript_lines().len(), 1);
        assert_eq!(mode.transcript_lines()[0].text, "val x : int = 3");
    }

    #[test]
    fn test_transcript_does_not_join_across_kinds() {
        let (mut mode, mut ctx) = setup();
        mode.on_session_update(
            UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "partial".to_string(),
            },
            &mut ctx,
        );
        mode.on_session_update(
            UiUpdate::Output {
                channel: OutputChannel::Error,
                text: "boom\n".to_string(),
            },
            &mut ctx,
        );
        assert_eq!(mode.transcript_lines().len(), 2);
        assert_eq!(mode.transcript_lines()[1].kind, TranscriptKind::Error);
    }

    #[test]
    fn test_transcript_collapses_blank_runs() {
        let (mut mode, mut ctx) = setup();
        mode.on_session_update(
            UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "a\n\n\n\nb\n".to_string(),
            },
            &mut ctx,
        );
        let texts: Vec<_> = mode
            .transcript_lines()
            .iter()
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_transcript_cap_enforced() {
        let (mut mode, mut ctx) = setup();
        mode.transcript.line_cap = 10;
        for i in 0..25 {
            mode.on_session_update(
                UiUpdate::Output {
                    channel: OutputChannel::Toplevel,
                    text: format!("line-{i}\n"),
                },
                &mut ctx,
            );
        }
        assert_eq!(mode.transcript_lines().len(), 10);
        assert_eq!(mode.transcript_lines()[0].text, "line-15");
    }

    #[test]
    fn test_diagram_lines_are_labelled() {
        let (mut mode, mut ctx) = setup();
        mode.on_session_update(
            UiUpdate::Diagram {
                index: 3,
                lines: vec!["  p".to_string(), " / \\".to_string()],
            },
            &mut ctx,
        );
        assert_eq!(mode.transcript_lines()[0].text, "[tree #3]");
        assert_eq!(mode.transcript_lines()[0].kind, TranscriptKind::Diagram);
        assert_eq!(mode.transcript_lines().len(), 3);
    }

    #[test]
    fn test_quit_arms_when_unsaved() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "x");
        mode.on_frontend_event(UserInputEvent::Quit, &mut ctx);
        assert!(!mode.quit_requested(), "first quit must only arm");
        mode.on_frontend_event(UserInputEvent::Quit, &mut ctx);
        assert!(mode.quit_requested(), "second quit must go through");
    }

    #[test]
    fn test_quit_is_immediate_when_clean() {
        let (mut mode, mut ctx) = setup();
        mode.on_frontend_event(UserInputEvent::Quit, &mut ctx);
        assert!(mode.quit_requested());
    }

    #[test]
    fn test_edit_disarms_pending_quit() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "x");
        mode.on_frontend_event(UserInputEvent::Quit, &mut ctx);
        type_text(&mut mode, &mut ctx, "y");
        mode.on_frontend_event(UserInputEvent::Quit, &mut ctx);
        assert!(
            !mode.quit_requested(),
            "an edit between quit presses must re-arm from scratch"
        );
    }

    #[test]
    fn test_new_document_resets_session_and_state() {
        let (mut mode, mut ctx) = setup();
        type_text(&mut mode, &mut ctx, "x;;");
        mode.unsaved_changes = false;
        mode.on_frontend_event(UserInputEvent::NewDocument, &mut ctx);
        assert!(mode.editor.is_empty());
        assert!(mode.transcript_lines().is_empty());
        assert_eq!(ctx.pending_requests(), &[SessionRequest::Reset]);
    }

    #[test]
    fn test_scroll_commands_update_transcript_state() {
        let (mut mode, mut ctx) = setup();
        for i in 0..50 {
            mode.on_session_update(
                UiUpdate::Output {
                    channel: OutputChannel::Toplevel,
                    text: format!("line-{i}\n"),
                },
                &mut ctx,
            );
        }
        assert_eq!(mode.transcript_scroll(), 49, "auto-follow tracks the tail");
        mode.on_frontend_event(
            UserInputEvent::Scroll(ScrollAction::PageUp(10)),
            &mut ctx,
        );
        assert_eq!(mode.transcript_scroll(), 39);
        mode.on_frontend_event(UserInputEvent::Scroll(ScrollAction::End), &mut ctx);
        assert_eq!(mode.transcript_scroll(), 49);
    }

    #[test]
    fn test_status_line_tokens() {
        let (mut mode, mut ctx) = setup();
        let status = mode.status_line();
        assert!(status.contains("file:untitled"));
        assert!(status.contains("caml:stopped"));
        mode.on_session_update(UiUpdate::ToplevelState { running: true }, &mut ctx);
        assert!(mode.status_line().contains("caml:running"));
    }

    #[test]
    fn test_warning_reaches_transcript() {
        let (mut mode, mut ctx) = setup();
        mode.on_session_update(UiUpdate::Warning("no toplevel".to_string()), &mut ctx);
        assert!(mode.transcript_lines()[0].text.contains("no toplevel"));
        assert_eq!(mode.transcript_lines()[0].kind, TranscriptKind::Error);
    }
}
