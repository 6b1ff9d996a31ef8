//! Sequential command dispatch.
//!
//! Replays a flattened command stream over a connection: one send, then one
//! silence-framed collect, strictly in order. The target's behaviour is
//! assumed to depend on request/response ordering, so sends are never
//! pipelined ahead of receives.

use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::chain::{stream_all, ChainElement};
use crate::conn::Connection;
use crate::framing::collect_until_silence;
use crate::Result;

/// The one payload that warrants the long silence window: the target's
/// single-byte state dump, which takes noticeably longer to print.
pub const SLOW_COMMAND: &[u8] = b"p";

/// Per-payload silence windows used during dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Silence window for ordinary commands.
    pub short: Duration,
    /// Silence window for [`SLOW_COMMAND`] and the initial banner read.
    pub long: Duration,
}

/// Replay every payload of `commands` over `conn`, collecting one framed
/// response per payload.
///
/// [`SLOW_COMMAND`] payloads wait out the long window, everything else the
/// short one. With `echo` set, each non-empty response is also written to
/// stdout immediately with lossy UTF-8 decoding.
///
/// # Errors
///
/// Propagates the first transport error; responses collected before the
/// failure are dropped with it.
pub async fn dispatch<C: Connection>(
    conn: &mut C,
    commands: &[ChainElement],
    timeouts: Timeouts,
    echo: bool,
) -> Result<Vec<Vec<u8>>> {
    let mut responses = Vec::new();
    for payload in stream_all(commands) {
        conn.send(payload).await?;
        let timeout = if payload == SLOW_COMMAND {
            timeouts.long
        } else {
            timeouts.short
        };
        let response = collect_until_silence(conn, timeout).await?;
        if echo && !response.is_empty() {
            echo_bytes(&response).await?;
        }
        responses.push(response);
    }
    Ok(responses)
}

/// Write target output to stdout with lossy UTF-8 decoding, flushing
/// immediately so the operator sees it as it arrives.
///
/// # Errors
///
/// Returns [`crate::AppError::Io`] if stdout itself fails.
pub async fn echo_bytes(bytes: &[u8]) -> Result<()> {
    let text = String::from_utf8_lossy(bytes).into_owned();
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
