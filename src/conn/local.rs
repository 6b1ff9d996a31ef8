//! Child-process transport.
//!
//! Spawns the target executable with piped standard streams and drives it
//! through the same [`Connection`] contract as the TCP backend. The child's
//! stderr is folded into the receive path: `recv` waits on stdout and stderr
//! together and returns whichever chunk arrives first, so diagnostics the
//! target writes to stderr are never lost.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command as ProcessCommand};
use tracing::debug;

use crate::conn::{Connection, RECV_CHUNK};
use crate::{AppError, Result};

/// Grace period between the terminate request and the forced kill, and again
/// between the kill and giving up on the wait.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Connection to a locally spawned child process.
#[derive(Debug)]
pub struct LocalConn {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl LocalConn {
    /// Validate `path` and spawn it with piped stdin/stdout/stderr.
    ///
    /// The child carries `kill_on_drop(true)` so it cannot outlive the
    /// connection even on an abnormal exit path; [`Connection::close`] is
    /// still the orderly way to shut it down.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Spawn`] when the path fails validation (missing,
    /// not a regular file, no execute permission) or the OS spawn fails.
    pub fn spawn(path: &Path) -> Result<Self> {
        let binary = validate_binary(path)?;
        let mut child = ProcessCommand::new(&binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AppError::Spawn(format!("{}: {err}", binary.display())))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture child stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture child stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Spawn("failed to capture child stderr".into()))?;

        debug!(binary = %binary.display(), pid = child.id(), "child process spawned");
        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }
}

impl Connection for LocalConn {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| AppError::Io("connection already closed".into()))?;
        stdin.write_all(data).await?;
        // Flush immediately so the target sees the command without delay.
        stdin.flush().await?;
        Ok(())
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        if self.child.is_none() {
            return Err(AppError::Io("connection already closed".into()));
        }
        let merged = async {
            loop {
                let chunk = tokio::select! {
                    res = read_chunk(&mut self.stdout) => res?,
                    res = read_chunk(&mut self.stderr) => res?,
                };
                // An empty chunk marks EOF on one stream; the other may
                // still produce data, so keep waiting until the deadline.
                if !chunk.is_empty() {
                    return Ok::<_, std::io::Error>(chunk);
                }
            }
        };
        match tokio::time::timeout(timeout, merged).await {
            Err(_) => Ok(Vec::new()),
            Ok(Ok(chunk)) => Ok(chunk),
            Ok(Err(err)) => Err(err.into()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        // Dropping stdin delivers EOF before any signal arrives.
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;

        terminate(&mut child);
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "child process exited");
                Ok(())
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                child.start_kill()?;
                match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                    Ok(Ok(status)) => {
                        debug!(%status, "child process killed");
                        Ok(())
                    }
                    Ok(Err(err)) => Err(err.into()),
                    Err(_) => Err(AppError::Io(
                        "child process still running after kill; leaking".into(),
                    )),
                }
            }
        }
    }
}

/// One bounded read from an optional stream.
///
/// Returns an empty chunk on EOF and parks the stream (`None`) so later
/// selects no longer poll it; a parked stream pends forever, leaving the
/// caller's deadline in charge.
async fn read_chunk<R: AsyncRead + Unpin>(stream: &mut Option<R>) -> std::io::Result<Vec<u8>> {
    match stream {
        Some(reader) => {
            let mut buf = vec![0u8; RECV_CHUNK];
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                *stream = None;
                return Ok(Vec::new());
            }
            buf.truncate(n);
            Ok(buf)
        }
        None => std::future::pending().await,
    }
}

/// Request orderly termination: SIGTERM on unix, hard kill elsewhere.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
        // Delivery failure is fine; the bounded wait and kill path cover it.
        let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.start_kill();
}

/// Reject paths that do not exist, are not regular files, or (on unix) carry
/// no execute bit — before any spawn attempt.
fn validate_binary(path: &Path) -> Result<PathBuf> {
    let binary = path
        .canonicalize()
        .map_err(|err| AppError::Spawn(format!("{}: {err}", path.display())))?;
    let meta = std::fs::metadata(&binary)
        .map_err(|err| AppError::Spawn(format!("{}: {err}", binary.display())))?;
    if !meta.is_file() {
        return Err(AppError::Spawn(format!(
            "{}: not a regular file",
            binary.display()
        )));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(AppError::Spawn(format!(
                "{}: no execute permission",
                binary.display()
            )));
        }
    }
    Ok(binary)
}
