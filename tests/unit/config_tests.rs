//! Unit tests for configuration parsing and validation.

use std::time::Duration;

use byteplay::{AppError, DriveConfig};

#[test]
fn defaults_match_the_documented_values() {
    let config = DriveConfig::default();
    assert!((config.short_timeout - 0.4).abs() < f64::EPSILON);
    assert!((config.long_timeout - 1.0).abs() < f64::EPSILON);
    assert!((config.connect_timeout - 5.0).abs() < f64::EPSILON);
    assert!(config.pre_commands.is_none());
}

#[test]
fn empty_toml_yields_defaults() {
    let config = DriveConfig::from_toml_str("").unwrap();
    assert_eq!(config, DriveConfig::default());
}

#[test]
fn toml_overrides_individual_fields() {
    let config = DriveConfig::from_toml_str(
        r#"
        short_timeout = 0.2
        pre_commands = ["a*3", "w"]
        "#,
    )
    .unwrap();
    assert!((config.short_timeout - 0.2).abs() < f64::EPSILON);
    assert!((config.long_timeout - 1.0).abs() < f64::EPSILON);
    assert_eq!(
        config.pre_commands,
        Some(vec!["a*3".to_owned(), "w".to_owned()])
    );
}

/// An explicit empty list is distinct from no list at all — it disables the
/// built-in replay sequence.
#[test]
fn empty_pre_commands_list_is_preserved() {
    let config = DriveConfig::from_toml_str("pre_commands = []").unwrap();
    assert_eq!(config.pre_commands, Some(Vec::new()));
}

#[test]
fn non_positive_timeouts_are_rejected() {
    for text in ["short_timeout = 0.0", "long_timeout = -1.0"] {
        let err = DriveConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "{text} was accepted");
    }
}

#[test]
fn unknown_fields_are_rejected() {
    let err = DriveConfig::from_toml_str("shrot_timeout = 0.4").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = DriveConfig::from_toml_str("short_timeout = [oops").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn timeouts_convert_to_durations() {
    let config = DriveConfig::default();
    let timeouts = config.timeouts();
    assert_eq!(timeouts.short, Duration::from_millis(400));
    assert_eq!(timeouts.long, Duration::from_secs(1));
    assert_eq!(config.connect_timeout(), Duration::from_secs(5));
}
