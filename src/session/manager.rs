use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::editing::collapse_blank_lines;
use crate::protocol::{
    dispatch, parse_command_block, DispatchConfig, DispatchResult, Frame, FrameScanner,
    SubstitutionTable,
};
use crate::runtime::{OutputChannel, UiUpdate};
use crate::tree;

use super::process::{ProcessOutput, ToplevelProcess};

const STARTUP_WINDOW: Duration = Duration::from_millis(1500);

/// One open document's toplevel session: the process handle, the stream
/// scanner, and the substitution state the protocol mutates. Owned by the
/// runtime task; every method runs there, so frames are handled and their
/// write-backs issued strictly in stream order.
pub struct ToplevelSession {
    config: Config,
    dispatch_config: DispatchConfig,
    process: Option<ToplevelProcess>,
    output_tx: mpsc::UnboundedSender<ProcessOutput>,
    output_rx: mpsc::UnboundedReceiver<ProcessOutput>,
    scanner: FrameScanner,
    substitutions: SubstitutionTable,
    diagram_count: u64,
    /// A deliberate stop already reported the shutdown; swallow the pump's
    /// trailing exit event instead of announcing it twice.
    stop_reported: bool,
}

impl ToplevelSession {
    pub fn new(config: Config) -> Self {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let dispatch_config = DispatchConfig {
            tree_models_dir: config.tree_models_dir.clone(),
        };
        Self {
            config,
            dispatch_config,
            process: None,
            output_tx,
            output_rx,
            scanner: FrameScanner::new(),
            substitutions: SubstitutionTable::new(),
            diagram_count: 0,
            stop_reported: false,
        }
    }

    pub fn is_running(&mut self) -> bool {
        self.process
            .as_mut()
            .map(|p| p.is_running())
            .unwrap_or(false)
    }

    pub fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    /// Start the toplevel if it is not running, waiting briefly for it to
    /// come up. Errors here are the "cannot start the toplevel" warning path.
    pub async fn ensure_started(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.process = None;
        let mut process = ToplevelProcess::spawn(
            &self.config.toplevel_path,
            &self.config.toplevel_args,
            self.output_tx.clone(),
        )
        .context("unable to start the Caml toplevel; check its configured path")?;
        process.wait_ready(STARTUP_WINDOW).await?;
        self.process = Some(process);
        self.stop_reported = false;
        Ok(())
    }

    /// Submit already-prepared source: echo it, then write it to the
    /// toplevel's stdin. Starts the toplevel first when needed.
    pub async fn submit(&mut self, source: &str, updates: &mut Vec<UiUpdate>) -> Result<()> {
        self.ensure_started().await?;
        updates.push(UiUpdate::ToplevelState { running: true });
        updates.push(UiUpdate::Output {
            channel: OutputChannel::Echo,
            text: source.to_string(),
        });
        self.write(source).await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        match self.process.as_mut() {
            Some(process) => process.write(text).await,
            None => anyhow::bail!("toplevel is not running"),
        }
    }

    pub fn interrupt(&mut self) -> Result<()> {
        match self.process.as_ref() {
            Some(process) => process.interrupt(),
            None => anyhow::bail!("toplevel is not running"),
        }
    }

    /// Hard stop. A partially-buffered frame is discarded, not resumed.
    pub async fn stop(&mut self, updates: &mut Vec<UiUpdate>) {
        if let Some(mut process) = self.process.take() {
            process.stop().await;
            self.note_stopped(updates);
            self.stop_reported = true;
        }
        self.scanner.clear();
        while self.output_rx.try_recv().is_ok() {}
    }

    /// New-document reset: stop, clear protocol state, start fresh.
    pub async fn reset(&mut self, updates: &mut Vec<UiUpdate>) -> Result<()> {
        self.stop(updates).await;
        self.substitutions.clear();
        self.diagram_count = 0;
        self.ensure_started().await?;
        updates.push(UiUpdate::ToplevelState { running: true });
        Ok(())
    }

    /// Drain everything the pumps delivered since the last tick.
    pub async fn drain_output(&mut self, updates: &mut Vec<UiUpdate>) {
        while let Ok(output) = self.output_rx.try_recv() {
            self.handle_output(output, updates).await;
        }
    }

    pub async fn handle_output(&mut self, output: ProcessOutput, updates: &mut Vec<UiUpdate>) {
        match output {
            ProcessOutput::Stdout(bytes) => {
                if self.config.draw_trees {
                    let frames = self.scanner.process(&bytes);
                    for frame in frames {
                        self.handle_frame(frame, updates).await;
                    }
                } else {
                    // Tree drawing off: the stream is plain output, tags and all.
                    push_output(updates, OutputChannel::Toplevel, &String::from_utf8_lossy(&bytes));
                }
            }
            ProcessOutput::Stderr(bytes) => {
                let text = collapse_blank_lines(&String::from_utf8_lossy(&bytes), false);
                if !text.is_empty() {
                    push_output(updates, OutputChannel::Error, &text);
                }
            }
            ProcessOutput::Exited => {
                if self.stop_reported {
                    self.stop_reported = false;
                    return;
                }
                let frames = self.scanner.finish();
                for frame in frames {
                    self.handle_frame(frame, updates).await;
                }
                self.process = None;
                self.note_stopped(updates);
            }
        }
    }

    async fn handle_frame(&mut self, frame: Frame, updates: &mut Vec<UiUpdate>) {
        match frame {
            Frame::PlainText(text) => push_output(updates, OutputChannel::Toplevel, &text),
            Frame::CommandBlock(body) => {
                for command in parse_command_block(&body) {
                    let result = dispatch(&command, &mut self.substitutions, &self.dispatch_config);
                    self.apply_dispatch(result, updates).await;
                }
            }
            Frame::TreeBlock(body) => self.handle_tree_block(&body, updates),
            Frame::UnterminatedCommandBlock => push_error(
                updates,
                "---LemonCaml error--- Unterminated command: not interpreted\n",
            ),
            Frame::UnterminatedTreeBlock => push_error(
                updates,
                "---LemonCaml error--- Unterminated tree: not drawn\n",
            ),
        }
    }

    async fn apply_dispatch(&mut self, result: DispatchResult, updates: &mut Vec<UiUpdate>) {
        match result {
            DispatchResult::WriteToToplevel(text) => {
                if let Err(error) = self.write(&text).await {
                    push_error(updates, &format!("---LemonCaml error--- {error:#}\n"));
                }
            }
            DispatchResult::LoadAuxiliarySource(path) => {
                let directive = include_directive(&path);
                if let Err(error) = self.write(&directive).await {
                    push_error(updates, &format!("---LemonCaml error--- {error:#}\n"));
                }
            }
            DispatchResult::NoOp => {}
            DispatchResult::Error(message) => {
                push_error(updates, &format!("---LemonCaml error--- {message}\n"));
            }
        }
    }

    fn handle_tree_block(&mut self, body: &str, updates: &mut Vec<UiUpdate>) {
        // No parenthesis means no tree in the block; stay silent like the
        // plain-text path would.
        let Some(literal) = tree::extract_literal(body) else {
            return;
        };
        match tree::parse(literal) {
            Ok(parsed) => {
                let diagram = tree::layout(&parsed);
                self.diagram_count += 1;
                updates.push(UiUpdate::Diagram {
                    index: self.diagram_count,
                    lines: diagram.to_lines(),
                });
            }
            Err(error) => {
                push_error(
                    updates,
                    &format!("---LemonCaml error--- malformed tree: {error}\n"),
                );
            }
        }
    }

    fn note_stopped(&mut self, updates: &mut Vec<UiUpdate>) {
        updates.push(UiUpdate::ToplevelState { running: false });
        push_output(
            updates,
            OutputChannel::Notice,
            "\nCaml Stopped\n-----------\n\n",
        );
    }
}

fn include_directive(path: &Path) -> String {
    format!("include \"{}\";;\n", path.display())
}

fn push_output(updates: &mut Vec<UiUpdate>, channel: OutputChannel, text: &str) {
    if text.is_empty() {
        return;
    }
    updates.push(UiUpdate::Output {
        channel,
        text: text.to_string(),
    });
}

fn push_error(updates: &mut Vec<UiUpdate>, text: &str) {
    push_output(updates, OutputChannel::Error, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn session_with_trees() -> ToplevelSession {
        let config = Config {
            draw_trees: true,
            ..Config::default()
        };
        ToplevelSession::new(config)
    }

    async fn feed(session: &mut ToplevelSession, chunk: &str) -> Vec<UiUpdate> {
        let mut updates = Vec::new();
        session
            .handle_output(
                ProcessOutput::Stdout(Bytes::copy_from_slice(chunk.as_bytes())),
                &mut updates,
            )
            .await;
        updates
    }

    #[tokio::test]
    async fn test_plain_output_reaches_transcript() {
        let mut session = session_with_trees();
        let updates = feed(&mut session, "val x : int = 3\n").await;
        assert_eq!(
            updates,
            vec![UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "val x : int = 3\n".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_tree_block_renders_diagram() {
        let mut session = session_with_trees();
        let updates = feed(
            &mut session,
            "--LemonTree--Node(Leaf,Leaf)--EndLemonTree--",
        )
        .await;
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            UiUpdate::Diagram { index, lines } => {
                assert_eq!(*index, 1);
                assert!(lines[0].contains("Node"));
            }
            other => panic!("expected a diagram, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_diagram_numbers_increase() {
        let mut session = session_with_trees();
        feed(&mut session, "--LemonTree--a()--EndLemonTree--").await;
        let updates = feed(&mut session, "--LemonTree--b()--EndLemonTree--").await;
        assert!(matches!(updates[0], UiUpdate::Diagram { index: 2, .. }));
    }

    #[tokio::test]
    async fn test_malformed_tree_is_inline_error_and_stream_continues() {
        let mut session = session_with_trees();
        let updates = feed(
            &mut session,
            "--LemonTree--broken(--EndLemonTree--still here",
        )
        .await;
        assert_eq!(updates.len(), 2);
        assert!(matches!(
            &updates[0],
            UiUpdate::Output { channel: OutputChannel::Error, text } if text.contains("malformed tree")
        ));
        assert!(matches!(
            &updates[1],
            UiUpdate::Output { channel: OutputChannel::Toplevel, text } if text == "still here"
        ));
    }

    #[tokio::test]
    async fn test_tree_block_without_parenthesis_is_silent() {
        let mut session = session_with_trees();
        let updates = feed(&mut session, "--LemonTree--no tree--EndLemonTree--ok").await;
        assert_eq!(
            updates,
            vec![UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "ok".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_register_tree_type_updates_substitutions() {
        let mut session = session_with_trees();
        let updates = feed(
            &mut session,
            "--LemonCamlCommand--RegisterTreeType\tavl\tnode=Node;leaf=Leaf--EndLemonCamlCommand--",
        )
        .await;
        assert_eq!(session.substitutions().lookup("node"), Some("Node"));
        // The include write fails (no process) and must surface inline.
        assert!(matches!(
            &updates[0],
            UiUpdate::Output { channel: OutputChannel::Error, text }
                if text.contains("toplevel is not running")
        ));
    }

    #[tokio::test]
    async fn test_unknown_command_error_does_not_block_later_commands() {
        let mut session = session_with_trees();
        feed(
            &mut session,
            "--LemonCamlCommand--RegisterTreeType\tavl\tnode=Node--EndLemonCamlCommand--",
        )
        .await;
        let updates = feed(
            &mut session,
            "--LemonCamlCommand--Bogus\tRegisterTreeType\tbst\tleft=L--EndLemonCamlCommand--",
        )
        .await;
        assert!(
            matches!(&updates[0], UiUpdate::Output { text, .. } if text.contains("unknown command: Bogus")),
            "first update must be the unknown-command error"
        );
        assert_eq!(
            session.substitutions().lookup("left"),
            Some("L"),
            "commands after the failing one must still run"
        );
        assert_eq!(session.substitutions().lookup("node"), None);
    }

    #[tokio::test]
    async fn test_unknown_substitution_variable_is_inline_error() {
        let mut session = session_with_trees();
        let updates = feed(
            &mut session,
            "--LemonCamlCommand--SubstituteTree\tghost--EndLemonCamlCommand--",
        )
        .await;
        assert!(matches!(
            &updates[0],
            UiUpdate::Output { channel: OutputChannel::Error, text }
                if text.contains("unknown variable: ghost")
        ));
    }

    #[tokio::test]
    async fn test_stderr_is_collapsed_and_error_styled() {
        let mut session = session_with_trees();
        let mut updates = Vec::new();
        session
            .handle_output(
                ProcessOutput::Stderr(Bytes::from_static(b"\n\nToplevel input:\n\n")),
                &mut updates,
            )
            .await;
        assert_eq!(
            updates,
            vec![UiUpdate::Output {
                channel: OutputChannel::Error,
                text: "Toplevel input:".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_exit_flushes_scanner_and_notes_stop() {
        let mut session = session_with_trees();
        feed(&mut session, "tail --LemonTree--dangling").await;
        let mut updates = Vec::new();
        session
            .handle_output(ProcessOutput::Exited, &mut updates)
            .await;
        assert!(
            matches!(&updates[0], UiUpdate::Output { channel: OutputChannel::Error, text }
                if text.contains("Unterminated tree")),
            "pending block must resolve to an unterminated error on exit"
        );
        assert!(updates
            .iter()
            .any(|u| matches!(u, UiUpdate::ToplevelState { running: false })));
    }

    #[tokio::test]
    async fn test_draw_trees_off_passes_tags_through() {
        let mut session = ToplevelSession::new(Config::default());
        let mut updates = Vec::new();
        session
            .handle_output(
                ProcessOutput::Stdout(Bytes::from_static(
                    b"--LemonTree--raw()--EndLemonTree--",
                )),
                &mut updates,
            )
            .await;
        assert_eq!(
            updates,
            vec![UiUpdate::Output {
                channel: OutputChannel::Toplevel,
                text: "--LemonTree--raw()--EndLemonTree--".to_string(),
            }]
        );
    }
}
