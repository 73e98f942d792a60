// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Natural ordering of names given on the command line.

use crate::cli::SortArgs;
use crate::config::Config;
use crate::sort::NaturalOrder;

/// Returns `args.names` in natural order.
///
/// `--case-sensitive` wins over `sort.case_insensitive`.
#[must_use]
pub fn sorted_names(args: &SortArgs, config: &Config) -> Vec<String> {
    let case_insensitive = config.sort.case_insensitive && !args.case_sensitive;
    let mut names = args.names.clone();
    NaturalOrder::new(case_insensitive).sort(&mut names);
    names
}

/// Prints one name per line.
pub fn run_sort_command(args: &SortArgs, config: &Config) {
    for name in sorted_names(args, config) {
        println!("{name}");
    }
}
