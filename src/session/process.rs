use anyhow::{bail, Context, Result};
use bytes::Bytes;
use futures::StreamExt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

/// One event from the toplevel's output pumps.
#[derive(Debug)]
pub enum ProcessOutput {
    Stdout(Bytes),
    Stderr(Bytes),
    Exited,
}

/// The external toplevel. Stdout and stderr are pumped into the session's
/// channel from background tasks; everything else (writes, signals, waits)
/// happens on the owning runtime task.
pub struct ToplevelProcess {
    child: Child,
    stdin: ChildStdin,
    cancel: CancellationToken,
}

impl ToplevelProcess {
    pub fn spawn(
        path: &Path,
        args: &[String],
        output_tx: mpsc::UnboundedSender<ProcessOutput>,
    ) -> Result<Self> {
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("unable to start toplevel {}", path.display()))?;

        let stdin = child.stdin.take().context("toplevel stdin unavailable")?;
        let stdout = child.stdout.take().context("toplevel stdout unavailable")?;
        let stderr = child.stderr.take().context("toplevel stderr unavailable")?;

        let cancel = CancellationToken::new();
        spawn_pump(
            ReaderStream::new(stdout),
            output_tx.clone(),
            ProcessOutput::Stdout,
            // Stdout closing is the process-gone signal; stderr is quieter.
            true,
            cancel.clone(),
        );
        spawn_pump(
            ReaderStream::new(stderr),
            output_tx,
            ProcessOutput::Stderr,
            false,
            cancel.clone(),
        );

        Ok(Self {
            child,
            stdin,
            cancel,
        })
    }

    pub async fn write(&mut self, text: &str) -> Result<()> {
        self.stdin
            .write_all(text.as_bytes())
            .await
            .context("write to toplevel failed")?;
        self.stdin.flush().await.context("flush to toplevel failed")
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Bounded wait for the child to be observably up. Returns an error if it
    /// exits during the window.
    pub async fn wait_ready(&mut self, window: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + window;
        loop {
            match self.child.try_wait() {
                Ok(None) => {
                    if self.child.id().is_some() {
                        return Ok(());
                    }
                }
                Ok(Some(status)) => bail!("toplevel exited during startup ({status})"),
                Err(error) => return Err(error).context("toplevel status unavailable"),
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("toplevel did not reach the running state");
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    /// SIGINT without taking the process down; the toplevel drops back to its
    /// prompt. Shells out to kill(1), which keeps this dependency-free.
    pub fn interrupt(&self) -> Result<()> {
        #[cfg(unix)]
        {
            let Some(pid) = self.child.id() else {
                bail!("toplevel is not running");
            };
            let status = std::process::Command::new("kill")
                .args(["-INT", &pid.to_string()])
                .status()
                .context("failed to run kill -INT")?;
            if !status.success() {
                bail!("kill -INT exited with {status}");
            }
            Ok(())
        }
        #[cfg(not(unix))]
        {
            bail!("interrupt is not available on this platform; stop the toplevel instead")
        }
    }

    pub async fn stop(&mut self) {
        self.cancel.cancel();
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

fn spawn_pump<R>(
    mut stream: ReaderStream<R>,
    output_tx: mpsc::UnboundedSender<ProcessOutput>,
    wrap: fn(Bytes) -> ProcessOutput,
    announce_exit: bool,
    cancel: CancellationToken,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        if output_tx.send(wrap(bytes)).is_err() {
                            break;
                        }
                    }
                    Some(Err(_)) | None => {
                        if announce_exit {
                            let _ = output_tx.send(ProcessOutput::Exited);
                        }
                        break;
                    }
                },
            }
        }
    });
}
