//! Unit tests for sequential dispatch and slow-command timeout selection.

use std::time::Duration;

use byteplay::chain::{ChainElement, Command, CommandChain};
use byteplay::conn::Connection;
use byteplay::dispatch::{dispatch, Timeouts, SLOW_COMMAND};
use byteplay::Result;

const TIMEOUTS: Timeouts = Timeouts {
    short: Duration::from_millis(50),
    long: Duration::from_millis(120),
};

/// Records every sent payload and the timeout passed to each `recv` call;
/// never produces data, so each payload costs exactly one quiet window.
#[derive(Default)]
struct RecordingConn {
    sent: Vec<Vec<u8>>,
    recv_timeouts: Vec<Duration>,
}

impl Connection for RecordingConn {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.sent.push(data.to_vec());
        Ok(())
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.recv_timeouts.push(timeout);
        tokio::time::sleep(timeout).await;
        Ok(Vec::new())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Replies with a fixed payload a fixed delay after each send.
struct DelayedEchoConn {
    reply: Vec<u8>,
    delay: Duration,
    pending: Option<Vec<u8>>,
}

impl Connection for DelayedEchoConn {
    async fn send(&mut self, _data: &[u8]) -> Result<()> {
        self.pending = Some(self.reply.clone());
        Ok(())
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        match self.pending.take() {
            Some(reply) if self.delay <= timeout => {
                tokio::time::sleep(self.delay).await;
                Ok(reply)
            }
            other => {
                self.pending = other;
                tokio::time::sleep(timeout).await;
                Ok(Vec::new())
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The designated slow byte selects the long window; every other payload —
/// including multi-byte payloads containing that byte — gets the short one.
#[tokio::test]
async fn slow_command_selects_long_timeout() {
    let commands: Vec<ChainElement> = vec![
        Command::new(b"x").into(),
        Command::new(SLOW_COMMAND).into(),
        Command::new(b"pp").into(),
    ];
    let mut conn = RecordingConn::default();
    dispatch(&mut conn, &commands, TIMEOUTS, false).await.unwrap();

    assert_eq!(
        conn.sent,
        vec![b"x".to_vec(), b"p".to_vec(), b"pp".to_vec()]
    );
    assert_eq!(
        conn.recv_timeouts,
        vec![TIMEOUTS.short, TIMEOUTS.long, TIMEOUTS.short]
    );
}

/// Dispatch expands chains and sends each payload of the expansion once, in
/// order, collecting one response buffer per payload.
#[tokio::test]
async fn dispatch_expands_chains_sequentially() {
    let commands: Vec<ChainElement> = vec![CommandChain::with_repeat(
        vec![Command::with_repeat(b"a", 2).into(), Command::new(b"b").into()],
        2,
    )
    .into()];
    let mut conn = RecordingConn::default();
    let responses = dispatch(&mut conn, &commands, TIMEOUTS, false).await.unwrap();

    let expected: Vec<Vec<u8>> = [b"a", b"a", b"b", b"a", b"a", b"b"]
        .iter()
        .map(|payload| payload.to_vec())
        .collect();
    assert_eq!(conn.sent, expected);
    assert_eq!(responses.len(), 6);
    assert!(responses.iter().all(Vec::is_empty));
}

/// End-to-end: a target that echoes "OK\n" 50 ms after any send is framed
/// correctly under a 100 ms quiet window.
#[tokio::test]
async fn delayed_echo_is_collected() {
    let mut conn = DelayedEchoConn {
        reply: b"OK\n".to_vec(),
        delay: Duration::from_millis(50),
        pending: None,
    };
    let commands: Vec<ChainElement> = vec![Command::new(b"x").into()];
    let timeouts = Timeouts {
        short: Duration::from_millis(100),
        long: Duration::from_millis(200),
    };
    let responses = dispatch(&mut conn, &commands, timeouts, false).await.unwrap();
    assert_eq!(responses, vec![b"OK\n".to_vec()]);
}

/// An empty command list dispatches nothing and returns no responses.
#[tokio::test]
async fn empty_command_list_is_a_noop() {
    let mut conn = RecordingConn::default();
    let responses = dispatch(&mut conn, &[], TIMEOUTS, false).await.unwrap();
    assert!(responses.is_empty());
    assert!(conn.sent.is_empty());
}
