use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use recovercheck::commands::{check_command, init_config_command, show_config_command, CheckOptions};
use recovercheck::{exit_code_for, init_logging};

/// Flags goroutines launched without panic recovery.
///
/// This CLI is a thin wrapper around `recovercheck-core` (exposed in code as
/// `recovercheck_core`). All analysis lives in the library so it can be tested
/// thoroughly and driven from other hosts.
#[derive(Parser, Debug)]
#[command(
    name = "recovercheck",
    version,
    about = "Flags goroutines launched without panic recovery",
    long_about = None
)]
struct Cli {
    /// Log analysis decisions to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every Go file under the root.
    ///
    /// Prints one line per finding and exits with status 3 when anything was
    /// reported.
    Check {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Do not check `*_test.go` files, whatever the settings file says.
        #[arg(long, default_value_t = false)]
        skip_test_files: bool,

        /// Emit a JSON report instead of one line per finding.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Number of worker threads.
        #[arg(long, default_value_t = 1)]
        jobs: usize,
    },

    /// Write a default `.recovercheck.yaml` (or `.json`) at the root.
    InitConfig {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Settings file format (yaml|json).
        #[arg(long, default_value = "yaml")]
        format: String,

        /// Overwrite an existing settings file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show the settings a check at the root would use.
    ShowConfig {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the analyzer version.
    Version,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Default to checking the current directory if no command is provided.
    let command = cli.command.unwrap_or(Command::Check {
        root: ".".to_string(),
        skip_test_files: false,
        json: false,
        jobs: 1,
    });

    match command {
        Command::Check { root, skip_test_files, json, jobs } => {
            let options = CheckOptions { root, skip_test_files, json, jobs };
            let summary = check_command(&options)?;
            return Ok(exit_code_for(&summary));
        }
        Command::InitConfig { root, format, force } => {
            init_config_command(&root, &format, force)?;
        }
        Command::ShowConfig { root, json } => show_config_command(&root, json)?,
        Command::Version => println!("recovercheck v{}", recovercheck_core::version()),
    }

    Ok(ExitCode::SUCCESS)
}
