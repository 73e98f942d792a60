// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `run` command: executes a workflow plan.
//!
//! ```text
//! Plan::from_path --> Plan::build --> OperationScheduler::submit
//!                                        |
//!          console lines <--------------+--> Status --> report
//! ```

use std::sync::Arc;

use anyhow::anyhow;

use crate::cli::RunArgs;
use crate::config::Config;
use crate::console::{ChannelConsole, ConsoleStream, TracingConsole};
use crate::error::Result;
use crate::ledger::RevisionPair;
use crate::operation::ActionOperation;
use crate::plan::{BuiltPlan, Plan};
use crate::progress::{BarSink, NullSink, ProgressSink};
use crate::scheduling::OperationScheduler;
use crate::status::{Severity, Status};

/// Outcome of one plan run.
#[derive(Debug)]
pub struct RunReport {
    /// Plan name.
    pub name: String,
    /// Aggregate status of every planned operation.
    pub status: Status,
    /// Revisions created, grouped by operation id in plan order.
    pub revisions: Vec<(String, RevisionPair)>,
}

impl RunReport {
    /// Lines printed after the run.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.revisions.len() + 2);
        if self.revisions.is_empty() {
            lines.push("No revisions created".to_string());
        } else {
            lines.push("Revisions:".to_string());
            for (id, pair) in &self.revisions {
                lines.push(format!("  {id}: {pair}"));
            }
        }
        lines.push(self.status.render());
        lines
    }
}

/// Builds a scheduler from the configuration.
#[must_use]
pub fn scheduler_for(
    config: &Config,
    console: Arc<dyn ConsoleStream>,
    show_progress: bool,
) -> OperationScheduler {
    let sink: Arc<dyn ProgressSink> = if show_progress {
        Arc::new(BarSink::new())
    } else {
        Arc::new(NullSink)
    };
    OperationScheduler::with_concurrency(config.scheduler.max_workers)
        .with_fifo(config.scheduler.fifo)
        .with_sink(sink)
        .with_console(console)
}

/// Runs a built plan on `scheduler` and collects the report.
pub async fn execute_plan(
    name: &str,
    built: &BuiltPlan,
    scheduler: &OperationScheduler,
) -> RunReport {
    let operation: Arc<dyn ActionOperation> = built.operation();
    tracing::info!(plan = %name, weight = operation.weight(), "running plan");

    let status = scheduler.submit(operation).wait().await;
    tracing::info!(plan = %name, severity = %status.severity(), "plan finished");

    RunReport {
        name: name.to_string(),
        status,
        revisions: built.revisions(),
    }
}

/// Main handler for the `run` command.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded or built, or if the run
/// ends with an `ERROR` status.
pub async fn run_run_command(args: &RunArgs, config: &Config) -> Result<()> {
    let plan = Plan::from_path(&args.plan)?;
    let retry = config.retry.unsupported_feature && !args.no_retry;
    let built = plan.build(retry)?;

    if args.check {
        let composite = built.operation();
        println!("{} ({} operations)", plan.name, composite.len());
        for id in composite.ids() {
            if let Some(child) = composite.operation(id) {
                println!("  {} (weight {})", child.name(), child.weight());
            }
        }
        return Ok(());
    }

    let (console, printer): (Arc<dyn ConsoleStream>, _) = if config.console.enabled {
        let (console, rx) = ChannelConsole::new();
        let printer = tokio::spawn(async move {
            while let Ok(line) = rx.recv_async().await {
                println!("{line}");
            }
        });
        (Arc::new(console), Some(printer))
    } else {
        (Arc::new(TracingConsole), None)
    };

    let scheduler = scheduler_for(
        config,
        console,
        args.progress || config.console.show_progress_bar,
    );

    let cancel_token = scheduler.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, interrupting operations...");
            cancel_token.cancel();
        }
    });

    let report = execute_plan(&plan.name, &built, &scheduler).await;
    drop(scheduler);
    if let Some(printer) = printer {
        // Ends once every console sender is gone.
        let _ = printer.await;
    }

    for line in report.summary() {
        println!("{line}");
    }

    match report.status.severity() {
        Severity::Error => Err(anyhow!(
            "plan '{}' failed with {} problem(s)",
            report.name,
            report.status.problems().len()
        )),
        Severity::Cancelled => {
            tracing::warn!(plan = %report.name, "plan cancelled");
            Ok(())
        }
        Severity::Ok | Severity::Warning => Ok(()),
    }
}
