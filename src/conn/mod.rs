//! Transport-agnostic connection layer.
//!
//! The [`Connection`] trait is the seam between the dispatch core and the two
//! transports: a TCP stream ([`RemoteConn`]) and a spawned child process
//! ([`LocalConn`]). Both register their descriptors non-blocking with the
//! tokio reactor and gate every read behind a readiness wait bounded by
//! `tokio::time::timeout`, so a `recv` never oversleeps its deadline and
//! never consumes data it cannot return.

pub mod local;
pub mod remote;

use std::time::Duration;

pub use local::LocalConn;
pub use remote::RemoteConn;

use crate::Result;

/// Upper bound on the bytes returned by a single `recv` call.
pub const RECV_CHUNK: usize = 4096;

/// Capability interface over exactly one underlying transport.
///
/// A connection exclusively owns its OS resource (socket or child process)
/// and must be closed exactly once; `close` is idempotent, but `send` and
/// `recv` on a closed connection fail with [`crate::AppError::Io`] rather
/// than silently doing nothing.
pub trait Connection {
    /// Write the whole buffer to the target, retrying internally until every
    /// byte is out or the transport errors.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Io`] on transport failure or after `close`.
    fn send(&mut self, data: &[u8]) -> impl std::future::Future<Output = Result<()>>;

    /// Wait up to `timeout` for readability, then perform one bounded read
    /// (at most [`RECV_CHUNK`] bytes).
    ///
    /// Returns an empty buffer when the deadline passes with nothing to read
    /// or when the peer has shut down cleanly — absence of data is not an
    /// error here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Io`] on transport failure or after `close`.
    fn recv(&mut self, timeout: Duration) -> impl std::future::Future<Output = Result<Vec<u8>>>;

    /// Release the underlying resource. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Io`] when the resource cannot be fully
    /// released; callers treat this as a shutdown warning, not a failure.
    fn close(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
