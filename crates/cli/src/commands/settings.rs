use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use recovercheck_core::config::{Settings, SettingsFormat, WorkspaceLayout};

use crate::canonicalize_or_current;

pub fn validate_settings_format(format: &str) -> Result<SettingsFormat> {
    match format {
        "yaml" | "yml" => Ok(SettingsFormat::Yaml),
        "json" => Ok(SettingsFormat::Json),
        other => Err(anyhow!("Invalid format '{}'. Allowed: yaml, json", other)),
    }
}

/// Write a default settings file at the workspace root.
pub fn init_config_command(root: &str, format: &str, force: bool) -> Result<PathBuf> {
    let format = validate_settings_format(format)?;
    let root_path = canonicalize_or_current(root)?;
    let layout = WorkspaceLayout::new(&root_path);

    fs::create_dir_all(&layout.root)
        .with_context(|| format!("Failed to create workspace root: {}", layout.root.display()))?;

    let path = layout.settings_path(format).to_path_buf();
    if path.exists() && !force {
        bail!("Settings file already exists at {} (use --force to overwrite)", path.display());
    }

    fs::write(&path, Settings::default().render(format))
        .with_context(|| format!("Failed to write settings: {}", path.display()))?;

    println!("Wrote settings: {}", path.display());
    Ok(path)
}

/// Print the settings a `check` in `root` would use.
pub fn show_config_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = WorkspaceLayout::new(&root_path);
    let settings = Settings::load(&layout).context("Failed to load settings")?;
    let source = layout.settings_candidates().into_iter().find(|p| p.is_file());

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!("recovercheck settings");
    println!("=====================");
    match source {
        Some(path) => println!("Source: {}", path.display()),
        None => println!("Source: (defaults)"),
    }
    println!("skip_test_files: {}", settings.skip_test_files);
    Ok(())
}
