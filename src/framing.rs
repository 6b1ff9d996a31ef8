//! Silence-based response framing.
//!
//! The targets this tool drives speak no framed protocol: no lengths, no
//! delimiters, no acknowledgements. The only boundary signal available is
//! silence — a response is taken as complete once a full timeout window
//! passes with no new bytes. This is approximate by nature: a responder that
//! stalls longer than one quiet window mid-reply will be framed short. The
//! heuristic is accepted as-is; do not try to sharpen it against an
//! undocumented protocol.

use std::time::{Duration, Instant};

use crate::conn::Connection;
use crate::Result;

/// Accumulate received bytes until a full `timeout` window passes in silence.
///
/// Each non-empty chunk resets the activity clock. If nothing ever arrives,
/// the result is an empty buffer after one quiet window — a command that
/// produces no output is a valid outcome, not an error.
///
/// # Errors
///
/// Propagates transport errors from [`Connection::recv`] unchanged.
pub async fn collect_until_silence<C: Connection>(
    conn: &mut C,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut last_activity = Instant::now();
    loop {
        let chunk = conn.recv(timeout).await?;
        if chunk.is_empty() {
            if last_activity.elapsed() >= timeout {
                break;
            }
        } else {
            buf.extend_from_slice(&chunk);
            last_activity = Instant::now();
        }
    }
    Ok(buf)
}
