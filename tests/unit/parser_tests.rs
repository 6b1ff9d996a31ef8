//! Unit tests for the command token grammar.

use byteplay::parser::CommandParser;
use byteplay::AppError;

fn parser() -> CommandParser {
    CommandParser::new().unwrap()
}

/// `c*N` yields one command with a single-byte payload and repeat `N`.
#[test]
fn repeat_token() {
    let cmds = parser().parse(&["a*3"]).unwrap();
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].payload(), b"a");
    assert_eq!(cmds[0].repeat(), 3);
}

/// A contiguous hex run decodes into one multi-byte payload, repeat 1.
#[test]
fn hex_run_token() {
    let cmds = parser().parse(&[r"\x41\x42"]).unwrap();
    assert_eq!(cmds[0].payload(), b"AB");
    assert_eq!(cmds[0].repeat(), 1);
}

/// A single hex escape is matched by the hex-run rule, not the one-char
/// fallback — rule order matters.
#[test]
fn single_hex_escape_decodes() {
    let cmds = parser().parse(&[r"\x7f"]).unwrap();
    assert_eq!(cmds[0].payload(), &[0x7f]);
}

/// `l\xHH` yields `l` followed by the decoded byte.
#[test]
fn literal_hex_token() {
    let cmds = parser().parse(&[r"l\x7f"]).unwrap();
    assert_eq!(cmds[0].payload(), &[b'l', 0x7f]);
    assert_eq!(cmds[0].repeat(), 1);
}

/// `lC` yields `l` followed by the literal character.
#[test]
fn literal_char_token() {
    let cmds = parser().parse(&["lX"]).unwrap();
    assert_eq!(cmds[0].payload(), b"lX");
}

/// A single character is its own one-byte command.
#[test]
fn single_char_token() {
    let cmds = parser().parse(&["z"]).unwrap();
    assert_eq!(cmds[0].payload(), b"z");
    assert_eq!(cmds[0].repeat(), 1);
}

/// Anything longer that matches no rule is rejected, naming the token.
#[test]
fn unrecognised_token_fails() {
    let err = parser().parse(&["toolong"]).unwrap_err();
    assert!(matches!(err, AppError::Token(_)));
    assert!(err.to_string().contains("toolong"));
}

/// An empty token matches nothing.
#[test]
fn empty_token_fails() {
    assert!(parser().parse(&[""]).is_err());
}

/// A dangling `*` with no count is not the repeat rule and not a single char.
#[test]
fn bare_star_suffix_fails() {
    assert!(parser().parse(&["w*"]).is_err());
}

/// Truncated hex escapes are rejected rather than partially decoded.
#[test]
fn truncated_hex_fails() {
    assert!(parser().parse(&[r"\x4"]).is_err());
}

/// Non-ASCII single characters cannot become byte payloads.
#[test]
fn non_ascii_char_fails() {
    assert!(parser().parse(&["é"]).is_err());
    assert!(parser().parse(&["lé"]).is_err());
}

/// `c*0` parses; the repeat invariant clamps it to one.
#[test]
fn zero_count_clamps() {
    let cmds = parser().parse(&["w*0"]).unwrap();
    assert_eq!(cmds[0].repeat(), 1);
}

/// One bad token aborts the whole batch — no partial results.
#[test]
fn batch_is_all_or_nothing() {
    let err = parser().parse(&["a", "toolong", "b"]).unwrap_err();
    assert!(matches!(err, AppError::Token(_)));
}

/// A clean batch preserves token order.
#[test]
fn batch_preserves_order() {
    let cmds = parser().parse(&["a*2", r"\x00", "lX", "q"]).unwrap();
    let payloads: Vec<&[u8]> = cmds.iter().map(byteplay::chain::Command::payload).collect();
    assert_eq!(
        payloads,
        vec![b"a".as_slice(), &[0x00], b"lX".as_slice(), b"q".as_slice()]
    );
}
