use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use recovercheck_core::analysis::{CrossModuleLoader, Diagnostic, FnSink};
use recovercheck_core::config::{Settings, WorkspaceLayout};
use recovercheck_core::services::analysis::{Analyzer, RunSummary};
use recovercheck_core::services::frontends::{GoParser, GoWorkspace};

use crate::canonicalize_or_current;

/// Options for one `check` invocation.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub root: String,
    /// Forces `skip_test_files` on regardless of the settings file.
    pub skip_test_files: bool,
    pub json: bool,
    pub jobs: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { root: ".".to_string(), skip_test_files: false, json: false, jobs: 1 }
    }
}

/// JSON document printed by `check --json`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub root: String,
    pub module: Option<String>,
    pub started_at: String,
    pub finished_at: String,
    pub settings: Settings,
    pub diagnostics: Vec<Diagnostic>,
    pub parse_failures: Vec<String>,
    pub summary: RunSummary,
}

/// Check every Go file under `options.root` and print the findings.
pub fn check_command(options: &CheckOptions) -> Result<RunSummary> {
    let root_path = canonicalize_or_current(&options.root)?;
    let workspace = Arc::new(
        GoWorkspace::open(&root_path)
            .with_context(|| format!("Failed to open workspace at {}", root_path.display()))?,
    );
    let layout = workspace.layout().clone();

    let mut settings = Settings::load(&layout).context("Failed to load settings")?;
    if options.skip_test_files {
        settings.skip_test_files = true;
    }

    let started_at = Utc::now().to_rfc3339();
    let (units, failures) = workspace
        .parse_units()
        .with_context(|| format!("Failed to discover Go files under {}", root_path.display()))?;
    tracing::info!(
        root = %root_path.display(),
        units = units.len(),
        parse_failures = failures.len(),
        jobs = options.jobs,
        "checking workspace"
    );

    let loader = CrossModuleLoader::new(GoParser, Arc::clone(&workspace));
    let analyzer = Analyzer::new(&settings, &loader);

    if options.json {
        let mut diagnostics = Vec::new();
        let summary = analyzer.check_units_concurrently(&units, options.jobs, &mut diagnostics);
        let report = CheckReport {
            root: layout.root.display().to_string(),
            module: workspace.module_path().map(str::to_string),
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            settings,
            diagnostics,
            parse_failures: failures.iter().map(|e| e.to_string()).collect(),
            summary: summary.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(summary);
    }

    let mut sink =
        FnSink(|diagnostic: Diagnostic| println!("{}", render_diagnostic(&layout, &diagnostic)));
    let summary = analyzer.check_units_concurrently(&units, options.jobs, &mut sink);
    Ok(summary)
}

/// `path:line:column: message`, with the path relative to the workspace root.
pub fn render_diagnostic(layout: &WorkspaceLayout, diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{}:{}: {}",
        layout.relative_string(&diagnostic.position.file),
        diagnostic.position.line,
        diagnostic.position.column,
        diagnostic.message
    )
}
