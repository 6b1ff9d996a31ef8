//! Command token parser.
//!
//! Turns operator-entered tokens into [`Command`] values. Rules are tried in
//! order and the first match wins:
//!
//! | Token shape        | Result                                            |
//! |--------------------|---------------------------------------------------|
//! | `c*N`              | single ASCII byte `c`, repeat `N`                 |
//! | `\xHH\xHH…`        | decoded byte run, repeat 1                        |
//! | `l\xHH`            | payload `l` + decoded byte, repeat 1              |
//! | `lC`               | payload `l` + ASCII char `C`, repeat 1            |
//! | `c`                | single ASCII byte, repeat 1                       |
//! | *(anything else)*  | [`AppError::Token`]                               |
//!
//! The hex-run rule is checked before the shorter fallbacks so a multi-byte
//! escape sequence is never misread as a literal `\` command. Parsing is
//! all-or-nothing: one bad token fails the whole batch, and the caller
//! decides whether that is fatal (pre-commands) or recoverable (interactive).

use regex::Regex;

use crate::chain::Command;
use crate::{AppError, Result};

/// Compiled token grammar.
#[derive(Debug)]
pub struct CommandParser {
    repeated: Regex,
    hex_run: Regex,
    hex_literal: Regex,
}

impl CommandParser {
    /// Compile the grammar rules.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if a rule pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            repeated: compile(r"^(.)\*(\d+)$")?,
            hex_run: compile(r"^(?:\\x[0-9A-Fa-f]{2})+$")?,
            hex_literal: compile(r"^l\\x([0-9A-Fa-f]{2})$")?,
        })
    }

    /// Parse a batch of tokens into commands, in order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Token`] naming the first offending token; no
    /// commands from a failed batch are returned.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Command>> {
        tokens
            .iter()
            .map(|token| self.parse_token(token.as_ref()))
            .collect()
    }

    /// Parse one token against the grammar rules, first match wins.
    fn parse_token(&self, token: &str) -> Result<Command> {
        if let Some(caps) = self.repeated.captures(token) {
            let ch = caps[1]
                .chars()
                .next()
                .ok_or_else(|| AppError::Token(format!("unrecognised token `{token}`")))?;
            let byte = ascii_byte(ch, token)?;
            let count: u32 = caps[2]
                .parse()
                .map_err(|_| AppError::Token(format!("repeat count out of range in `{token}`")))?;
            return Ok(Command::with_repeat([byte], count));
        }

        if self.hex_run.is_match(token) {
            return Ok(Command::new(decode_hex_run(token)?));
        }

        if let Some(caps) = self.hex_literal.captures(token) {
            let byte = decode_hex_pair(&caps[1], token)?;
            return Ok(Command::new([b'l', byte]));
        }

        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some('l'), Some(second), None) => {
                Ok(Command::new([b'l', ascii_byte(second, token)?]))
            }
            (Some(only), None, None) => Ok(Command::new([ascii_byte(only, token)?])),
            _ => Err(AppError::Token(format!("unrecognised token `{token}`"))),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|err| AppError::Config(format!("token rule `{pattern}` failed to compile: {err}")))
}

/// A single character as one ASCII byte, or a token error.
fn ascii_byte(ch: char, token: &str) -> Result<u8> {
    u8::try_from(ch)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| AppError::Token(format!("non-ASCII character in `{token}`")))
}

/// Decode a full `\xHH\xHH…` run into its raw bytes.
fn decode_hex_run(token: &str) -> Result<Vec<u8>> {
    token
        .split("\\x")
        .filter(|pair| !pair.is_empty())
        .map(|pair| decode_hex_pair(pair, token))
        .collect()
}

fn decode_hex_pair(pair: &str, token: &str) -> Result<u8> {
    u8::from_str_radix(pair, 16)
        .map_err(|_| AppError::Token(format!("bad hex escape in `{token}`")))
}
