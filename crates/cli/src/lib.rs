pub mod commands;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use recovercheck_core::services::analysis::RunSummary;
use tracing_subscriber::EnvFilter;

/// Exit status when at least one diagnostic was reported.
pub const DIAGNOSTICS_EXIT_CODE: u8 = 3;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Process exit status for a finished run: 0 when clean.
pub fn exit_status_for(summary: &RunSummary) -> u8 {
    if summary.diagnostics() > 0 {
        DIAGNOSTICS_EXIT_CODE
    } else {
        0
    }
}

pub fn exit_code_for(summary: &RunSummary) -> ExitCode {
    ExitCode::from(exit_status_for(summary))
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
