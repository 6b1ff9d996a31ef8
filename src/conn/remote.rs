//! TCP stream transport.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::conn::{Connection, RECV_CHUNK};
use crate::{AppError, Result};

/// Connection to a remote target over a TCP stream.
#[derive(Debug)]
pub struct RemoteConn {
    stream: Option<TcpStream>,
}

impl RemoteConn {
    /// Connect to `host:port`, giving up after `timeout`.
    ///
    /// The established stream lives on the tokio reactor in non-blocking
    /// mode; every subsequent read is gated by a readiness wait.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connect`] when the connection is refused, fails
    /// to resolve, or does not complete within the deadline.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                AppError::Connect(format!("{host}:{port}: no connection within {timeout:?}"))
            })?
            .map_err(|err| AppError::Connect(format!("{host}:{port}: {err}")))?;
        debug!(host, port, "tcp connection established");
        Ok(Self {
            stream: Some(stream),
        })
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| AppError::Io("connection already closed".into()))
    }
}

impl Connection for RemoteConn {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream_mut()?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let stream = self.stream_mut()?;
        let mut buf = vec![0u8; RECV_CHUNK];
        match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
            // Deadline passed with nothing readable.
            Err(_) => Ok(Vec::new()),
            // Clean shutdown by the peer: no data, not fatal.
            Ok(Ok(0)) => Ok(Vec::new()),
            Ok(Ok(n)) => {
                buf.truncate(n);
                Ok(buf)
            }
            Ok(Err(err)) => Err(err.into()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
            debug!("tcp connection closed");
        }
        Ok(())
    }
}
