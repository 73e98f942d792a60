// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Version | Options | Inis | Sort | Run
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use svnop_rs::cli::global::GlobalOptions;
use svnop_rs::cli::{self, Command};
use svnop_rs::cmd::config::{run_inis_command, run_options_command};
use svnop_rs::cmd::run::run_run_command;
use svnop_rs::cmd::sort::run_sort_command;
use svnop_rs::config::loader::ConfigLoader;
use svnop_rs::config::{CONFIG_FILE_NAME, Config, ENV_PREFIX};
use svnop_rs::logging::init_logging;
use svnop_rs::logging::{LogConfig, LogLevel};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    // Logging needs the configured levels; a broken config still gets the
    // CLI levels so the error can be reported.
    let config = load_config(&cli.global);
    let log_config = build_log_config(&cli.global, config.as_ref().ok());
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match config {
        Ok(config) => dispatch_command(&cli, &config).await,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_log_config(global: &GlobalOptions, config: Option<&Config>) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .or_else(|| config.map(|c| c.global.output_log_level))
        .unwrap_or(LogLevel::INFO);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .or_else(|| config.map(|c| c.global.file_log_level))
        .unwrap_or(console_level);

    let log_file = global
        .log_file
        .clone()
        .or_else(|| config.map(|c| c.global.log_file.clone()));

    let json_file = global.log_json || config.is_some_and(|c| c.global.log_json);

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(log_file.map(|p| p.display().to_string()))
        .with_json_file(json_file)
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: &Config) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Options) => {
            run_options_command(config);
            Ok(())
        }
        Some(Command::Inis) => {
            let loader = build_config_loader(&cli.global);
            run_inis_command(&loader.format_loaded_sources());
            Ok(())
        }
        Some(Command::Sort(args)) => {
            run_sort_command(args, config);
            Ok(())
        }
        Some(Command::Run(args)) => run_run_command(args, config).await,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn default_inis() -> Vec<PathBuf> {
    let mut inis = Vec::with_capacity(2);
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    {
        inis.push(dir.join(CONFIG_FILE_NAME));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    let is_master = |p: &PathBuf| std::fs::canonicalize(p).ok() == std::fs::canonicalize(&local).ok();
    if !inis.iter().any(is_master) {
        inis.push(local);
    }
    inis
}

fn build_config_loader(global: &GlobalOptions) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if !global.no_default_inis {
        for ini_path in default_inis() {
            loader = loader.add_toml_file_optional(ini_path);
        }
    }
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader.with_env_prefix(ENV_PREFIX)
}

fn load_config(global: &GlobalOptions) -> svnop_rs::error::Result<Config> {
    global
        .apply_overrides(build_config_loader(global))
        .and_then(ConfigLoader::build)
}
