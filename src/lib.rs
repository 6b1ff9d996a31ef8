#![forbid(unsafe_code)]

//! Drive an interactive byte-oriented target — a TCP endpoint or a spawned
//! child process — with composable, repeatable command sequences, framing
//! responses purely by inter-byte silence.

pub mod chain;
pub mod config;
pub mod conn;
pub mod dispatch;
pub mod errors;
pub mod framing;
pub mod parser;
pub mod session;

pub use config::DriveConfig;
pub use errors::{AppError, Result};
