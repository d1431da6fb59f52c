use anyhow::Result;
use camlpad::app::{build_runtime, EditorMode};
use camlpad::config::Config;
use camlpad::runtime::frontend::{
    EditAction, FrontendAdapter, ScrollAction, UserInputEvent,
};
use camlpad::terminal;
use camlpad::ui::layout::split_editor_layout;
use camlpad::ui::render::{render_editor, render_status_line, render_transcript};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::Clear;
use std::path::PathBuf;
use std::time::Duration;

struct ManagedTuiFrontend {
    terminal: terminal::TerminalType,
    quit: bool,
}

impl ManagedTuiFrontend {
    fn new() -> Result<Self> {
        let terminal = terminal::setup()?;
        Ok(Self {
            terminal,
            quit: false,
        })
    }
}

fn map_key(key: KeyEvent) -> Option<UserInputEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        // Session commands.
        KeyCode::Enter if ctrl => Some(UserInputEvent::SendToToplevel),
        KeyCode::F(5) => Some(UserInputEvent::SendToToplevel),
        KeyCode::Char('c') if ctrl => Some(UserInputEvent::InterruptToplevel),
        KeyCode::Char('k') if ctrl => Some(UserInputEvent::StopToplevel),
        KeyCode::Char('l') if ctrl => Some(UserInputEvent::ClearTranscript),
        // File commands.
        KeyCode::Char('n') if ctrl => Some(UserInputEvent::NewDocument),
        KeyCode::Char('s') if ctrl => Some(UserInputEvent::SaveDocument),
        KeyCode::Char('q') if ctrl => Some(UserInputEvent::Quit),
        // Indentation.
        KeyCode::Char('w') if ctrl => Some(UserInputEvent::ReindentBuffer),
        KeyCode::Char('t') if ctrl => Some(UserInputEvent::ToggleIndentOnEnter),
        KeyCode::BackTab => Some(UserInputEvent::Unindent),
        KeyCode::Tab => Some(UserInputEvent::Edit(EditAction::Insert("\t".to_string()))),
        // Editing.
        KeyCode::Char('z') if ctrl => Some(UserInputEvent::Edit(EditAction::Undo)),
        KeyCode::Char('y') if ctrl => Some(UserInputEvent::Edit(EditAction::Redo)),
        KeyCode::Char('a') if ctrl => Some(UserInputEvent::Edit(EditAction::SelectAll)),
        KeyCode::Enter => Some(UserInputEvent::Edit(EditAction::Newline)),
        KeyCode::Backspace => Some(UserInputEvent::Edit(EditAction::Backspace)),
        KeyCode::Delete => Some(UserInputEvent::Edit(EditAction::Delete)),
        // Transcript scrollback.
        KeyCode::PageUp => Some(UserInputEvent::Scroll(ScrollAction::PageUp(10))),
        KeyCode::PageDown => Some(UserInputEvent::Scroll(ScrollAction::PageDown(10))),
        // Cursor movement, with shift extending the selection.
        KeyCode::Left if shift => Some(UserInputEvent::Edit(EditAction::SelectLeft)),
        KeyCode::Right if shift => Some(UserInputEvent::Edit(EditAction::SelectRight)),
        KeyCode::Up if shift => Some(UserInputEvent::Edit(EditAction::SelectUp)),
        KeyCode::Down if shift => Some(UserInputEvent::Edit(EditAction::SelectDown)),
        KeyCode::Left => Some(UserInputEvent::Edit(EditAction::MoveLeft)),
        KeyCode::Right => Some(UserInputEvent::Edit(EditAction::MoveRight)),
        KeyCode::Up => Some(UserInputEvent::Edit(EditAction::MoveUp)),
        KeyCode::Down => Some(UserInputEvent::Edit(EditAction::MoveDown)),
        KeyCode::Home if ctrl => Some(UserInputEvent::Edit(EditAction::MoveBufferStart)),
        KeyCode::End if ctrl => Some(UserInputEvent::Edit(EditAction::MoveBufferEnd)),
        KeyCode::Home => Some(UserInputEvent::Edit(EditAction::MoveLineStart)),
        KeyCode::End => Some(UserInputEvent::Edit(EditAction::MoveLineEnd)),
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            Some(UserInputEvent::Edit(EditAction::Insert(ch.to_string())))
        }
        _ => None,
    }
}

impl Drop for ManagedTuiFrontend {
    fn drop(&mut self) {
        let _ = terminal::restore();
    }
}

impl FrontendAdapter<EditorMode> for ManagedTuiFrontend {
    fn poll_user_input(&mut self, _mode: &EditorMode) -> Option<UserInputEvent> {
        let Ok(has_event) = event::poll(Duration::from_millis(16)) else {
            self.quit = true;
            return None;
        };
        if !has_event {
            return None;
        }

        let Ok(ev) = event::read() else {
            self.quit = true;
            return None;
        };

        match ev {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    return None;
                }
                map_key(key)
            }
            Event::Paste(text) => Some(UserInputEvent::Edit(EditAction::Insert(text))),
            _ => None,
        }
    }

    fn render(&mut self, mode: &EditorMode) {
        let status = mode.status_line();
        let _ = self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Clear, area);
            let panes = split_editor_layout(area);
            render_status_line(frame, panes.header, &status);
            render_editor(frame, panes.editor, mode.editor());
            render_transcript(
                frame,
                panes.transcript,
                mode.transcript_lines(),
                mode.transcript_scroll(),
            );
        });
    }

    fn should_quit(&self) -> bool {
        self.quit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let initial_file = std::env::args().nth(1).map(PathBuf::from);
    let (mut runtime, mut ctx) = build_runtime(config, initial_file)?;
    let mut frontend = ManagedTuiFrontend::new()?;
    runtime.run(&mut frontend, &mut ctx).await;
    Ok(())
}
