// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing and the command handlers.

use svnop_rs::cli::{Command, try_parse_from};
use svnop_rs::cmd::sort::sorted_names;
use svnop_rs::config::Config;
use svnop_rs::config::loader::ConfigLoader;

#[test]
fn sort_command_orders_naturally() {
    let cli = try_parse_from(["svnop", "sort", "file10", "file2", "file1", "file01"]).unwrap();
    let Some(Command::Sort(args)) = cli.command else {
        panic!("expected sort");
    };

    let names = sorted_names(&args, &Config::default());
    assert_eq!(names, vec!["file1", "file01", "file2", "file10"]);
}

#[test]
fn empty_name_sorts_first() {
    let cli = try_parse_from(["svnop", "sort", "b", "", "a"]).unwrap();
    let Some(Command::Sort(args)) = cli.command else {
        panic!("expected sort");
    };

    assert_eq!(sorted_names(&args, &Config::default()), vec!["", "a", "b"]);
}

#[test]
fn global_flags_flow_into_config() {
    let cli = try_parse_from([
        "svnop",
        "-l",
        "1",
        "--set",
        "console.enabled=false",
        "options",
    ])
    .unwrap();

    let config = cli
        .global
        .apply_overrides(ConfigLoader::new())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.global.output_log_level.as_u8(), 1);
    assert_eq!(config.global.file_log_level.as_u8(), 1);
    assert!(!config.console.enabled);
}

#[test]
fn unknown_command_is_rejected() {
    assert!(try_parse_from(["svnop", "build"]).is_err());
}
