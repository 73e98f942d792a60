// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |          options / sort / run
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |      config     plan      |
//!              |  layered TOML   workflows |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!            scheduling   operations  sort
//!          domains/gate   checkout,   natural
//!               |         copy, log.. order
//!               v            |
//!          composite <-------+
//!        DAG of steps        |
//!               |            v
//!               v        connector
//!           operation    server verbs,
//!        protected steps notifications
//!               |            |
//!               +-----+------+
//!                     v
//!                  ledger
//!              revision pairs
//!
//!   +------------------------------------------+
//!   |  status, progress, console               |
//!   +------------------------------------------+
//!   |  foundation   error, logging             |
//!   +------------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod composite;
pub mod config;
pub mod connector;
pub mod console;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod operation;
pub mod operations;
pub mod plan;
pub mod progress;
pub mod scheduling;
pub mod sort;
pub mod status;
