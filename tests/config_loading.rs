// tests/config_loading.rs

mod common;
use crate::common::ConfigFileBuilder;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use bashq::config::{load_and_validate, parse_duration, resolve_config_path, StoreMode};
use bashq::errors::BashqError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.settings.max_concurrent, 100);
    assert_eq!(cfg.settings.shell, "bash");
    assert_eq!(cfg.settings.max_output_bytes, None);
    assert_eq!(cfg.settings.poll_interval, Duration::from_secs(10));
    assert_eq!(cfg.settings.output_flush_interval, Duration::from_secs(3));
    assert_eq!(cfg.store, StoreMode::Memory);
}

#[test]
fn full_file_is_parsed() {
    let file = write_config(
        r#"
[service]
max_concurrent = 4
shell = "sh"
max_output_bytes = 65536

[timing]
poll_interval = "500ms"
output_flush_interval = "1s"

[store]
mode = "file"
path = "state/commands.json"
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.settings.max_concurrent, 4);
    assert_eq!(cfg.settings.shell, "sh");
    assert_eq!(cfg.settings.max_output_bytes, Some(65536));
    assert_eq!(cfg.settings.poll_interval, Duration::from_millis(500));
    assert_eq!(cfg.settings.output_flush_interval, Duration::from_secs(1));
    assert_eq!(
        cfg.store,
        StoreMode::File(PathBuf::from("state/commands.json"))
    );
}

#[test]
fn zero_concurrency_is_rejected() {
    let file = write_config("[service]\nmax_concurrent = 0\n");

    match load_and_validate(file.path()) {
        Err(BashqError::ConfigError(msg)) => assert!(msg.contains("max_concurrent")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn blank_shell_is_rejected() {
    let file = write_config("[service]\nshell = \"  \"\n");

    match load_and_validate(file.path()) {
        Err(BashqError::ConfigError(msg)) => assert!(msg.contains("shell")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn zero_output_cap_is_rejected() {
    let file = write_config("[service]\nmax_output_bytes = 0\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BashqError::ConfigError(_))
    ));
}

#[test]
fn bad_durations_are_rejected() {
    for timing in [
        "poll_interval = \"10\"",
        "poll_interval = \"0s\"",
        "output_flush_interval = \"3 weeks\"",
        "poll_interval = \"5124095576030432h\"",
        "output_flush_interval = \"307445734561825861m\"",
    ] {
        let file = write_config(&format!("[timing]\n{timing}\n"));
        match load_and_validate(file.path()) {
            Err(BashqError::ConfigError(msg)) => assert!(msg.contains("timing"), "{msg}"),
            Err(e) => panic!("Expected ConfigError for {timing}, got: {:?}", e),
            Ok(_) => panic!("Expected error for {timing}, got Ok"),
        }
    }
}

#[test]
fn unknown_store_mode_is_rejected() {
    let file = write_config("[store]\nmode = \"postgres\"\n");

    match load_and_validate(file.path()) {
        Err(BashqError::ConfigError(msg)) => assert!(msg.contains("postgres")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[service\nmax_concurrent = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BashqError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(BashqError::IoError(_))));
}

#[test]
fn explicit_config_path_wins() {
    assert_eq!(
        resolve_config_path(Some("custom/bashq.toml")),
        Some(PathBuf::from("custom/bashq.toml"))
    );
}

#[test]
fn parse_duration_units() {
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration(" 10s ").unwrap(), Duration::from_secs(10));
    assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn oversized_durations_are_errors_not_panics() {
    for raw in ["5124095576030432h", "307445734561825861m"] {
        match parse_duration(raw) {
            Err(msg) => assert!(msg.contains("too large"), "{msg}"),
            Ok(d) => panic!("Expected error for {raw}, got {d:?}"),
        }
    }
    // Largest hour count that still fits.
    assert!(parse_duration("5124095576030431h").is_ok());
}

#[test]
fn builder_goes_through_validation() {
    let cfg = ConfigFileBuilder::new()
        .max_concurrent(3)
        .shell("sh")
        .poll_interval("20ms")
        .file_store("snap.json")
        .build();

    assert_eq!(cfg.settings.max_concurrent, 3);
    assert_eq!(cfg.settings.poll_interval, Duration::from_millis(20));
    assert_eq!(cfg.store, StoreMode::File(PathBuf::from("snap.json")));
}
