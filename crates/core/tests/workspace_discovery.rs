#![cfg(feature = "go-frontend")]

use std::fs;
use std::path::Path;

use recovercheck_core::analysis::SymbolService;
use recovercheck_core::model::{Import, Pos, Unit};
use recovercheck_core::services::frontends::{GoWorkspace, WorkspaceError};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    fs::write(path, body).expect("write fixture");
}

#[test]
fn open_fails_for_missing_root() {
    let dir = tempdir().expect("tempdir");
    let err = GoWorkspace::open(dir.path().join("nope")).expect_err("missing root");
    assert!(matches!(err, WorkspaceError::MissingRoot(_)));
}

#[test]
fn module_path_comes_from_go_mod() {
    let dir = tempdir().expect("tempdir");
    write(dir.path(), "go.mod", "// comment\nmodule example.com/app\n\ngo 1.22\n");

    let workspace = GoWorkspace::open(dir.path()).expect("open");
    assert_eq!(workspace.module_path(), Some("example.com/app"));
    assert_eq!(workspace.module_for_dir(dir.path()), "example.com/app");
    assert_eq!(
        workspace.module_for_dir(&dir.path().join("internal").join("pool")),
        "example.com/app/internal/pool"
    );
}

#[test]
fn module_for_dir_without_go_mod_is_relative() {
    let dir = tempdir().expect("tempdir");
    let workspace = GoWorkspace::open(dir.path()).expect("open");
    assert_eq!(workspace.module_path(), None);
    assert_eq!(workspace.module_for_dir(dir.path()), ".");
    assert_eq!(workspace.module_for_dir(&dir.path().join("pkg")), "pkg");
}

#[test]
fn discovery_skips_vendor_testdata_and_hidden_dirs() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    for rel in [
        "main.go",
        "pkg/b.go",
        "pkg/a.go",
        "pkg/a_test.go",
        "vendor/github.com/x/y/y.go",
        "pkg/testdata/fixture.go",
        ".git/hooks/x.go",
        "_scratch/tmp.go",
        "README.md",
    ] {
        write(root, rel, "package x\n");
    }

    let workspace = GoWorkspace::open(root).expect("open");
    let files: Vec<String> = workspace
        .discover_files()
        .expect("discover")
        .iter()
        .map(|p| workspace.layout().relative_string(p).replace('\\', "/"))
        .collect();
    assert_eq!(files, vec!["main.go", "pkg/a.go", "pkg/a_test.go", "pkg/b.go"]);
}

#[test]
fn locate_finds_top_level_functions_only() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "go.mod", "module example.com/app\n");
    write(
        root,
        "pool/pool.go",
        "package pool\n\ntype Pool struct{}\n\nfunc (p *Pool) Run() {}\n\nfunc Go(f func()) {}\n\nfunc Map[T any](xs []T) {}\n",
    );

    let workspace = GoWorkspace::open(root).expect("open");
    let go = workspace.locate("example.com/app/pool", "Go").expect("Go declared");
    assert!(go.file.ends_with("pool/pool.go"));
    assert_eq!(go.line, 7);

    assert_eq!(workspace.locate("example.com/app/pool", "Map").map(|p| p.line), Some(9));
    assert!(workspace.locate("example.com/app/pool", "Run").is_none());
    assert!(workspace.locate("example.com/app/missing", "Go").is_none());
}

#[test]
fn package_dir_falls_back_to_vendor() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "go.mod", "module example.com/app\n");
    write(root, "vendor/github.com/acme/guard/guard.go", "package guard\n\nfunc Protect() {}\n");

    let workspace = GoWorkspace::open(root).expect("open");
    assert_eq!(
        workspace.package_dir("github.com/acme/guard"),
        Some(root.join("vendor/github.com/acme/guard"))
    );
    assert!(workspace.locate("github.com/acme/guard", "Protect").is_some());
    assert_eq!(workspace.package_dir("github.com/acme/other"), None);
}

#[test]
fn resolve_module_maps_aliases_through_imports() {
    let dir = tempdir().expect("tempdir");
    let workspace = GoWorkspace::open(dir.path()).expect("open");

    let mut unit = Unit::new(dir.path().join("main.go"), ".");
    unit.imports.push(Import::new(Some("w".into()), "example.com/app/worker", Pos::new(3, 8)));
    assert_eq!(workspace.resolve_module(&unit, "w").as_deref(), Some("example.com/app/worker"));
    assert_eq!(workspace.resolve_module(&unit, "worker"), None);
}

#[cfg(unix)]
#[test]
fn discovery_does_not_follow_symlinked_directories() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "pkg/main.go", "package pkg\n");
    std::os::unix::fs::symlink(root.join("pkg"), root.join("pkg/loop")).expect("symlink loop");
    std::os::unix::fs::symlink(root, root.join("pkg/up")).expect("symlink root");

    let workspace = GoWorkspace::open(root).expect("open");
    let files: Vec<String> = workspace
        .discover_files()
        .expect("discover")
        .iter()
        .map(|p| workspace.layout().relative_string(p))
        .collect();
    assert_eq!(files, vec!["pkg/main.go"]);
}

#[test]
fn locate_ignores_declarations_inside_comments_and_strings() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "go.mod", "module example.com/app\n");
    write(
        root,
        "worker/a.go",
        "package worker\n\nconst usage = `\nfunc Run() {}\n`\n\n/*\nfunc Run() {}\n*/\n",
    );
    write(root, "worker/worker.go", "package worker\n\nfunc Run() {\n\tdefer func() { recover() }()\n}\n");

    let workspace = GoWorkspace::open(root).expect("open");
    let run = workspace.locate("example.com/app/worker", "Run").expect("Run declared");
    assert!(run.file.ends_with("worker/worker.go"));
    assert_eq!((run.line, run.column), (3, 6));
}

#[test]
fn unparsable_files_declare_nothing() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "go.mod", "module example.com/app\n");
    write(root, "broken/broken.go", "package broken\n\nfunc Half( {\n");

    let workspace = GoWorkspace::open(root).expect("open");
    assert!(workspace.locate("example.com/app/broken", "Half").is_none());
}
