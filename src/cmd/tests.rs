// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use super::run::{execute_plan, scheduler_for};
use super::sort::sorted_names;
use crate::cli::{RunArgs, SortArgs};
use crate::config::Config;
use crate::console::{ChannelConsole, ConsoleLevel};
use crate::plan::Plan;
use crate::status::Severity;

const PLAN: &str = r#"
name = "nightly"

[repository]
url = "https://svn.example.com/repo"
seed = ["/trunk/main.c", "/tags/"]

[[operation]]
id = "tag"
kind = "tag"
paths = ["/trunk"]
destination = "/tags/nightly"
message = "nightly"

[[operation]]
id = "history"
kind = "log"
paths = ["/trunk"]
after = ["tag"]
"#;

fn sort_args(names: &[&str], case_sensitive: bool) -> SortArgs {
    SortArgs {
        case_sensitive,
        names: names.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn test_sorted_names_natural_order() {
    let names = sorted_names(
        &sort_args(&["file10", "file2", "file1", "file01"], false),
        &Config::default(),
    );

    assert_eq!(names, vec!["file1", "file01", "file2", "file10"]);
}

#[test]
fn test_sorted_names_case_sensitive_flag_wins() {
    let insensitive = sorted_names(&sort_args(&["a", "B", "A"], false), &Config::default());
    let sensitive = sorted_names(&sort_args(&["a", "B", "A"], true), &Config::default());

    assert_eq!(insensitive, vec!["a", "A", "B"]);
    assert_eq!(sensitive, vec!["A", "B", "a"]);
}

#[tokio::test]
async fn test_execute_plan_reports_revisions_and_echoes() {
    let plan = Plan::from_toml(PLAN).unwrap();
    let built = plan.build(true).unwrap();
    let (console, rx) = ChannelConsole::new();
    let scheduler = scheduler_for(&Config::default(), Arc::new(console), false);

    let report = execute_plan(&plan.name, &built, &scheduler).await;
    drop(scheduler);

    assert_eq!(report.name, "nightly");
    assert_eq!(report.status.severity(), Severity::Ok);
    assert_eq!(report.revisions.len(), 1);
    assert_eq!(report.revisions[0].0, "tag");

    let lines: Vec<_> = rx.drain().collect();
    assert!(lines.iter().any(|line| {
        line.level == ConsoleLevel::Cmd && line.text.starts_with("svn copy \"/trunk\"")
    }));
    assert!(lines
        .iter()
        .any(|line| line.text == "Committed revision 1."));
}

#[tokio::test]
async fn test_summary_lists_revisions_then_status() {
    let plan = Plan::from_toml(PLAN).unwrap();
    let built = plan.build(true).unwrap();
    let (console, _rx) = ChannelConsole::new();
    let scheduler = scheduler_for(&Config::default(), Arc::new(console), false);

    let report = execute_plan(&plan.name, &built, &scheduler).await;
    let summary = report.summary();

    assert_eq!(summary[0], "Revisions:");
    assert!(summary[1].starts_with("  tag: r1 https://svn.example.com/repo"));
    assert!(summary[2].starts_with("OK:"));
}

#[tokio::test]
async fn test_run_command_check_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    std::fs::write(&path, PLAN).unwrap();

    let args = RunArgs {
        plan: path,
        no_retry: false,
        progress: false,
        check: true,
    };

    assert!(super::run::run_run_command(&args, &Config::default()).await.is_ok());
}

#[tokio::test]
async fn test_run_command_fails_on_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    std::fs::write(
        &path,
        r#"
[repository]
url = "file:///r"

[[operation]]
id = "gone"
kind = "delete"
paths = ["/missing"]
"#,
    )
    .unwrap();

    let args = RunArgs {
        plan: path,
        no_retry: true,
        progress: false,
        check: false,
    };
    let err = super::run::run_run_command(&args, &Config::default())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("plan 'plan' failed"));
}
