/// Which pen a piece of transcript text is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    /// The toplevel's own stdout.
    Toplevel,
    /// Code echoed back as it is submitted.
    Echo,
    /// Inline errors: stderr, protocol failures, malformed trees.
    Error,
    /// Lifecycle notices from the session itself.
    Notice,
}

/// One update flowing from the session toward the UI mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    Output {
        channel: OutputChannel,
        text: String,
    },
    /// A rendered tree, ready to embed in the transcript.
    Diagram {
        index: u64,
        lines: Vec<String>,
    },
    ToplevelState {
        running: bool,
    },
    /// A failure worth interrupting the user over (e.g. the toplevel would
    /// not start); shown in the transcript and the status line.
    Warning(String),
}
