use super::mode::RuntimeMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp(usize),
    PageDown(usize),
    Home,
    End,
}

/// Document-editor operations, produced by the frontend's key mapping and
/// consumed by the mode's editor state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditAction {
    Insert(String),
    /// Line break; runs the live indenter when indent-on-enter is active.
    Newline,
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveLineStart,
    MoveLineEnd,
    MoveBufferStart,
    MoveBufferEnd,
    SelectLeft,
    SelectRight,
    SelectUp,
    SelectDown,
    SelectAll,
    Undo,
    Redo,
}

/// Everything a frontend can ask of the mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserInputEvent {
    Edit(EditAction),
    /// Submit the statement around the cursor (or the selection).
    SendToToplevel,
    ReindentBuffer,
    Unindent,
    ToggleIndentOnEnter,
    InterruptToplevel,
    StopToplevel,
    ClearTranscript,
    NewDocument,
    SaveDocument,
    Scroll(ScrollAction),
    Quit,
}

pub trait FrontendAdapter<M: RuntimeMode> {
    fn poll_user_input(&mut self, mode: &M) -> Option<UserInputEvent>;
    fn render(&mut self, mode: &M);
    fn should_quit(&self) -> bool;
}
