// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for svnop-rs using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! svnop [global options] <command>
//! version
//! options
//! inis
//! sort [--case-sensitive] NAMES...
//! run PLAN.toml [--no-retry] [--progress]
//! ```

pub mod global;


use crate::cli::global::GlobalOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Subversion operation engine
///
/// Runs dependency-ordered Subversion workflows.
#[derive(Debug, Parser)]
#[command(
    name = "svnop",
    author,
    version,
    about = "Subversion operation engine",
    long_about = "svnop-rs Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Runs dependency-ordered Subversion workflows described in TOML\n\
                  plans. Do `svnop run plan.toml` to execute a plan. See\n\
                  `svnop <command> --help` for more information about a command.",
    after_help = "INI FILES:\n\n\
                  By default, svnop looks for `svnop.toml` next to the executable\n\
                  and in the current directory; the one in the current directory\n\
                  overrides the other. Additional INIs can be specified with --ini,\n\
                  those are loaded after the two mentioned above. SVNOP_SECTION__KEY\n\
                  environment variables override all files. Use --no-default-inis\n\
                  to disable auto detection and only use --ini."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values from the INIs.
    Options,

    /// Lists the INIs used by svnop.
    Inis,

    /// Sorts names in natural order.
    Sort(SortArgs),

    /// Runs a workflow plan.
    Run(RunArgs),
}

/// Arguments for `sort`.
#[derive(Debug, Clone, Args)]
pub struct SortArgs {
    /// Compare letters case-sensitively, overriding sort.case_insensitive.
    #[arg(long = "case-sensitive")]
    pub case_sensitive: bool,

    /// Names to sort.
    #[arg(value_name = "NAMES", required = true)]
    pub names: Vec<String>,
}

/// Arguments for `run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Plan file to execute.
    #[arg(value_name = "PLAN")]
    pub plan: PathBuf,

    /// Never retry a call without a flag the server rejected.
    #[arg(long = "no-retry")]
    pub no_retry: bool,

    /// Draws a progress bar, overriding console.show_progress_bar.
    #[arg(short = 'p', long = "progress")]
    pub progress: bool,

    /// Only validates and lists the plan without running it.
    #[arg(long = "check")]
    pub check: bool,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

/// Tries to parse command-line arguments from an iterator.
///
/// # Errors
///
/// Same as [`try_parse`].
pub fn try_parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
