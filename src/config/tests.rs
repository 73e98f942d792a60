// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::loader::SourceKind;
use super::{Config, ConfigLoader};
use crate::error::ConfigError;
use crate::logging::LogLevel;
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.global.output_log_level, LogLevel::INFO);
    assert_eq!(config.global.file_log_level, LogLevel::TRACE);
    assert_eq!(config.global.log_file, PathBuf::from("svnop.log"));
    assert!((1..=8).contains(&config.scheduler.max_workers));
    assert!(config.scheduler.fifo);
    assert!(config.retry.unsupported_feature);
    assert!(config.console.enabled);
    assert!(!config.console.show_progress_bar);
    assert!(config.sort.case_insensitive);
}

#[test]
fn test_config_parse() {
    let config = Config::parse(
        r#"
[global]
output_log_level = 4
log_file = "/var/log/svnop.log"

[scheduler]
max_workers = 2
fifo = false

[retry]
unsupported_feature = false

[sort]
case_insensitive = false
"#,
    )
    .expect("parse should succeed");

    assert_eq!(config.global.output_log_level, LogLevel::DEBUG);
    assert_eq!(config.global.log_file, PathBuf::from("/var/log/svnop.log"));
    assert_eq!(config.scheduler.max_workers, 2);
    assert!(!config.scheduler.fifo);
    assert!(!config.retry.unsupported_feature);
    assert!(!config.sort.case_insensitive);
    assert!(config.console.enabled, "untouched sections keep defaults");
}

#[test]
fn test_zero_workers_is_rejected() {
    let err = Config::parse("[scheduler]\nmax_workers = 0").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidValue { key, .. }) if key == "max_workers"
    ));
}

#[test]
fn test_log_level_out_of_range_is_rejected() {
    assert!(Config::parse("[global]\noutput_log_level = 9").is_err());
}

#[test]
fn test_deny_unknown_fields_top_level() {
    let result = Config::parse("[paths]\nprefix = \"/x\"");
    assert!(result.is_err(), "unknown sections are rejected");
}

#[test]
fn test_deny_unknown_fields_in_section() {
    let result = Config::parse("[scheduler]\nworkers = 3");
    assert!(result.is_err(), "unknown keys are rejected");
}

#[test]
fn test_format_options_deterministic() {
    let mut config = Config::default();
    config.scheduler.max_workers = 3;

    insta::assert_snapshot!(config.format_options().join("\n"), @r"
    console.enabled           = true
    console.show_progress_bar = false
    global.file_log_level     = 5
    global.log_file           = svnop.log
    global.log_json           = false
    global.output_log_level   = 3
    retry.unsupported_feature = true
    scheduler.fifo            = true
    scheduler.max_workers     = 3
    sort.case_insensitive     = true
    ");
}

#[test]
fn test_config_loader_tracks_sources() {
    let loader = ConfigLoader::new()
        .add_toml_str("[scheduler]\nfifo = true")
        .add_toml_file("/nonexistent/svnop.toml");

    let sources = loader.loaded_sources();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].0, SourceKind::Inline);
    assert_eq!(sources[1], (SourceKind::File, PathBuf::from("/nonexistent/svnop.toml")));
}

#[test]
fn test_config_loader_format_loaded_sources() {
    let loader = ConfigLoader::new()
        .add_toml_str("")
        .add_toml_file("/etc/svnop.toml");

    insta::assert_snapshot!(loader.format_loaded_sources().join("\n"), @r"
    1. [string] <string>
    2. [file] /etc/svnop.toml
    ");
}

#[test]
fn test_config_loader_optional_only_tracks_existing() {
    let loader = ConfigLoader::new().add_toml_file_optional("/nonexistent/svnop.toml");

    assert!(loader.loaded_sources().is_empty());
    assert!(loader.build().is_ok(), "missing optional file is fine");
}

#[test]
fn test_config_loader_add_toml_file_success() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(
        file,
        r"
[console]
show_progress_bar = true
"
    )
    .expect("failed to write temp file");

    let config = ConfigLoader::new()
        .add_toml_file(file.path())
        .build()
        .expect("build should succeed");

    assert!(config.console.show_progress_bar);
}

#[test]
fn test_config_loader_add_toml_file_not_found() {
    let loader = ConfigLoader::new().add_toml_file("/nonexistent/path/to/svnop.toml");
    let err = loader.build().unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ReadError { path, source })
            if path == "/nonexistent/path/to/svnop.toml"
                && source.kind() == std::io::ErrorKind::NotFound
    ));
}

#[test]
fn test_config_loader_add_toml_file_invalid_toml() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(file, "this is not valid toml {{{{{{").expect("failed to write");

    let err = ConfigLoader::new()
        .add_toml_file(file.path())
        .build()
        .unwrap_err();
    assert!(
        matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::ParseError { .. })),
        "build should fail with a parse error: {err:#}"
    );
}

#[test]
fn test_config_loader_invalid_inline_toml_names_string_source() {
    let err = ConfigLoader::new()
        .add_toml_str("[scheduler\nmax_workers = 2")
        .build()
        .unwrap_err();

    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::ParseError { path, .. }) => assert_eq!(path, "<string>"),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_config_loader_with_env_prefix() {
    // SAFETY: the variable name is unique to this test.
    unsafe {
        std::env::set_var("SVNOPTEST_SCHEDULER__MAX_WORKERS", "5");
    }

    let config = ConfigLoader::new()
        .add_toml_str("[scheduler]\nmax_workers = 1")
        .with_env_prefix("SVNOPTEST")
        .build()
        .expect("build should succeed");

    assert_eq!(config.scheduler.max_workers, 5, "env var overrides TOML");

    // SAFETY: Same as above
    unsafe {
        std::env::remove_var("SVNOPTEST_SCHEDULER__MAX_WORKERS");
    }
}

#[test]
fn test_config_loader_set_override() {
    let config = ConfigLoader::new()
        .add_toml_str("[retry]\nunsupported_feature = true")
        .set("retry.unsupported_feature", false)
        .expect("set should succeed")
        .build()
        .expect("build should succeed");

    assert!(!config.retry.unsupported_feature);
}

#[test]
fn test_config_loader_layered_sources() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(
        file,
        r"
[scheduler]
max_workers = 2
fifo = false
"
    )
    .expect("failed to write");

    let config = ConfigLoader::new()
        .add_toml_file(file.path())
        .add_toml_str("[scheduler]\nmax_workers = 6")
        .build()
        .expect("build should succeed");

    assert_eq!(config.scheduler.max_workers, 6, "string overrides file");
    assert!(!config.scheduler.fifo, "file value persists");
}

#[test]
fn test_config_loader_build_deserialization_error() {
    let result = ConfigLoader::new()
        .add_toml_str("[scheduler]\nfifo = \"sometimes\"")
        .build();

    let err_str = result.unwrap_err().to_string();
    assert!(
        err_str.contains("fifo") || err_str.contains("invalid type"),
        "error should mention the problematic field: {err_str}"
    );
}
