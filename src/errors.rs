//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// TCP connect failure or connect-deadline expiry.
    Connect(String),
    /// Target binary validation or child-process spawn failure.
    Spawn(String),
    /// A command token does not match any rule of the grammar.
    Token(String),
    /// Transport-level send/recv failure, or use of a closed connection.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Connect(msg) => write!(f, "connect: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Token(msg) => write!(f, "invalid command token: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
