// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for workflow plans run through the scheduler.

use std::sync::Arc;

use svnop_rs::cmd::run::{execute_plan, scheduler_for};
use svnop_rs::config::Config;
use svnop_rs::console::{ChannelConsole, ConsoleLevel};
use svnop_rs::plan::Plan;
use svnop_rs::status::Severity;

const RELEASE: &str = r#"
name = "release"

[repository]
url = "https://svn.example.com/repo"
seed = ["/trunk/src/main.c", "/trunk/README", "/branches/", "/tags/"]
author = "builder"

[[operation]]
id = "branch"
kind = "branch"
paths = ["/trunk"]
destination = "/branches/2.0"
message = "Branch 2.0"

[[operation]]
id = "tag"
kind = "tag"
paths_from = "branch"
destination = "/tags/2.0"
message = "Tag 2.0"

[[operation]]
id = "stamp"
kind = "set-author"
revisions_from = "tag"
author = "release-bot"

[[operation]]
id = "history"
kind = "log"
paths = ["/trunk"]
retry = true
"#;

#[tokio::test]
async fn release_plan_runs_on_scheduler() {
    let plan = Plan::from_toml(RELEASE).unwrap();
    let built = plan.build(true).unwrap();
    built
        .repository()
        .reject_feature_once(svnop_rs::connector::CommandOptions::INCLUDE_MERGED_REVISIONS);

    let (console, rx) = ChannelConsole::new();
    let scheduler = scheduler_for(&Config::default(), Arc::new(console), false);
    let report = execute_plan(&plan.name, &built, &scheduler).await;
    drop(scheduler);

    assert_eq!(report.status.severity(), Severity::Ok, "{}", report.status.render());
    let ids: Vec<&str> = report.revisions.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["branch", "tag"]);

    let repo = built.repository();
    assert!(repo.exists("/tags/2.0/src/main.c"));
    assert_eq!(repo.revision_property(2, "svn:author").as_deref(), Some("release-bot"));

    let commands: Vec<String> = rx
        .drain()
        .filter(|line| line.level == ConsoleLevel::Cmd)
        .map(|line| line.text)
        .collect();
    assert!(commands.iter().any(|c| c.starts_with("svn copy \"/trunk\" \"/branches/2.0\"")));
    assert!(commands.iter().any(|c| c.starts_with("svn copy \"/branches/2.0\" \"/tags/2.0\"")));
}

#[tokio::test]
async fn interrupted_plan_is_cancelled_not_failed() {
    let plan = Plan::from_toml(RELEASE).unwrap();
    let built = plan.build(true).unwrap();
    let (console, _rx) = ChannelConsole::new();
    let scheduler = scheduler_for(&Config::default(), Arc::new(console), false);

    scheduler.interrupt_all();
    let report = execute_plan(&plan.name, &built, &scheduler).await;

    assert_eq!(report.status.severity(), Severity::Cancelled);
    assert!(report.revisions.is_empty());
    assert_eq!(built.repository().head(), 0);
}
