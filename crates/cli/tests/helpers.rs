use std::fs;

use recovercheck::{canonicalize_or_current, exit_status_for, DIAGNOSTICS_EXIT_CODE};
use recovercheck_core::services::analysis::RunSummary;
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_resolves_absolute_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result = canonicalize_or_current(&subdir.to_string_lossy()).expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn exit_code_reflects_diagnostics() {
    let clean = RunSummary::default();
    assert_eq!(exit_status_for(&clean), 0);

    let flagged = RunSummary { malformed_launches: 1, ..RunSummary::default() };
    assert_eq!(exit_status_for(&flagged), DIAGNOSTICS_EXIT_CODE);
}
