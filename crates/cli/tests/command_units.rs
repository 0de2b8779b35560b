use std::fs;

use recovercheck::commands::{
    check_command, init_config_command, render_diagnostic, show_config_command,
    validate_settings_format, CheckOptions,
};
use recovercheck_core::analysis::Diagnostic;
use recovercheck_core::config::{Settings, SettingsFormat, WorkspaceLayout};
use recovercheck_core::model::{Pos, Position};
use tempfile::tempdir;

#[test]
fn validate_settings_format_accepts_known_formats() {
    assert_eq!(validate_settings_format("yaml").unwrap(), SettingsFormat::Yaml);
    assert_eq!(validate_settings_format("yml").unwrap(), SettingsFormat::Yaml);
    assert_eq!(validate_settings_format("json").unwrap(), SettingsFormat::Json);
    let err = validate_settings_format("toml").unwrap_err();
    assert!(err.to_string().contains("Invalid format"));
}

#[test]
fn init_config_json_round_trips_through_load() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();

    let path = init_config_command(&root, "json", false).unwrap();
    assert!(path.ends_with(".recovercheck.json"));
    let layout = WorkspaceLayout::new(temp.path());
    assert_eq!(Settings::load(&layout).unwrap(), Settings::default());
}

#[test]
fn init_config_rejects_unknown_format() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    let err = init_config_command(&root, "ini", false).unwrap_err();
    assert!(err.to_string().contains("Invalid format"));
}

#[test]
fn show_config_works_without_settings_file() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    show_config_command(&root, false).unwrap();
    show_config_command(&root, true).unwrap();
}

#[test]
fn render_diagnostic_uses_root_relative_paths() {
    let temp = tempdir().unwrap();
    let layout = WorkspaceLayout::new(temp.path());
    let file = temp.path().join("pkg").join("server.go");
    let diagnostic = Diagnostic::malformed_launch(Position::new(file, Pos::new(12, 2)));

    let line = render_diagnostic(&layout, &diagnostic).replace('\\', "/");
    assert_eq!(line, "pkg/server.go:12:2: go statement without call expression");
}

#[test]
fn check_command_returns_summary() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("go.mod"), "module example.com/app\n").unwrap();
    fs::write(
        temp.path().join("main.go"),
        "package main\n\nfunc main() {\n\tgo work()\n\tgo work\n}\n\nfunc work() {}\n",
    )
    .unwrap();

    let options = CheckOptions {
        root: temp.path().to_string_lossy().to_string(),
        ..CheckOptions::default()
    };
    let summary = check_command(&options).unwrap();
    assert_eq!(summary.launches, 2);
    assert_eq!(summary.unsafe_launches, 1);
    assert_eq!(summary.malformed_launches, 1);
    assert_eq!(summary.units.len(), 1);
}

#[test]
fn check_command_errors_for_missing_root() {
    let temp = tempdir().unwrap();
    let options = CheckOptions {
        root: temp.path().join("absent").to_string_lossy().to_string(),
        ..CheckOptions::default()
    };
    let err = check_command(&options).unwrap_err();
    assert!(err.to_string().contains("Failed to open workspace"), "unexpected error: {err}");
}
