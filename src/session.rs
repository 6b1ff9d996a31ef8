//! Session driver: banner read, pre-command replay, interactive control.
//!
//! A session owns its connection exclusively and runs strictly in sequence:
//! collect whatever the target prints on startup, replay the resolved
//! pre-command list, then hand control to the operator line by line.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::chain::ChainElement;
use crate::config::DriveConfig;
use crate::conn::Connection;
use crate::dispatch::{dispatch, echo_bytes};
use crate::framing::collect_until_silence;
use crate::parser::CommandParser;
use crate::Result;

/// Run a full session over `conn`.
///
/// The connection is closed on every exit path, error or not; a close
/// failure during teardown is logged as a warning rather than masking the
/// session's own outcome.
///
/// # Errors
///
/// Propagates transport errors from the banner read and pre-command replay.
/// Interactive-mode errors are isolated per line and never surface here.
pub async fn run<C: Connection>(
    mut conn: C,
    commands: &[ChainElement],
    config: &DriveConfig,
) -> Result<()> {
    let outcome = drive(&mut conn, commands, config).await;
    if let Err(err) = conn.close().await {
        warn!(%err, "connection did not shut down cleanly");
    } else {
        info!("connection closed");
    }
    outcome
}

async fn drive<C: Connection>(
    conn: &mut C,
    commands: &[ChainElement],
    config: &DriveConfig,
) -> Result<()> {
    let timeouts = config.timeouts();

    // Startup banner, if any, arrives unprompted; read it under the long
    // window and show it before anything is sent.
    let banner = collect_until_silence(conn, timeouts.long).await?;
    if !banner.is_empty() {
        echo_bytes(&banner).await?;
    }

    if !commands.is_empty() {
        info!("replaying pre-commands");
        dispatch(conn, commands, timeouts, true).await?;
    }

    interactive(conn, config).await
}

/// Interactive control loop.
///
/// One token per line; `exit` / `quit` (case-insensitive) or end-of-input
/// ends the session. Parse and dispatch errors are reported inline and the
/// loop continues — a bad line never tears the session down.
async fn interactive<C: Connection>(conn: &mut C, config: &DriveConfig) -> Result<()> {
    let parser = CommandParser::new()?;
    let timeouts = config.timeouts();
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"[*] Enter commands to drive the target. Type 'exit' to quit.\n")
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let outcome = match parser.parse(&[line]) {
            Ok(cmds) => {
                let elements: Vec<ChainElement> = cmds.into_iter().map(Into::into).collect();
                dispatch(conn, &elements, timeouts, true).await.map(|_| ())
            }
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            let report = format!("[!] error: {err}\n");
            stdout.write_all(report.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
