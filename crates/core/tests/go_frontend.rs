#![cfg(feature = "go-frontend")]

use std::path::Path;

use recovercheck_core::analysis::{collect, LaunchKind, ParseError, SourceParser};
use recovercheck_core::model::{Expr, Stmt, Unit};
use recovercheck_core::services::frontends::GoParser;

const SOURCE: &str = r#"package main

import (
	"fmt"
	w "example.com/app/worker"
	_ "example.com/app/driver"
)

var started = func() bool {
	go w.Run()
	return true
}()

type Server struct{}

func (s *Server) Serve() {
	go s.loop()
}

func main() {
	defer func() {
		if r := recover(); r != nil {
			fmt.Println(r)
		}
	}()
	go worker()
}

func worker() {}
"#;

fn parse(source: &str) -> Unit {
    GoParser::new()
        .parse_source(Path::new("/src/app/main.go"), "example.com/app", source)
        .expect("parse go source")
}

#[test]
fn lowers_package_and_imports() {
    let unit = parse(SOURCE);
    assert_eq!(unit.package, "main");
    assert_eq!(unit.module, "example.com/app");

    let paths: Vec<_> = unit.imports.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, vec!["fmt", "example.com/app/worker", "example.com/app/driver"]);
    assert_eq!(unit.imports[1].alias.as_deref(), Some("w"));
    assert_eq!(unit.import_for("w").map(|i| i.path.as_str()), Some("example.com/app/worker"));
    assert!(unit.import_for("driver").is_none());
}

#[test]
fn lowers_functions_and_methods() {
    let unit = parse(SOURCE);
    let names: Vec<_> = unit.functions.iter().map(|f| f.name.name.as_str()).collect();
    assert_eq!(names, vec!["Serve", "main", "worker"]);
    assert_eq!(unit.functions[0].receiver.as_deref(), Some("(s *Server)"));
    assert!(unit.function("Serve").is_none());
    assert_eq!(unit.function("worker").map(|f| f.name.pos.line), Some(29));
}

#[test]
fn deferred_closure_keeps_its_shape() {
    let unit = parse(SOURCE);
    let main = unit.function("main").expect("main");
    let body = main.body.as_ref().expect("main body");
    match &body[0] {
        Stmt::Defer { call: Some(call), .. } => {
            assert!(matches!(&*call.callee, Expr::Closure(_)));
        }
        other => panic!("expected a defer statement, got {other:?}"),
    }
}

#[test]
fn launches_are_found_in_functions_methods_and_initializers() {
    let unit = parse(SOURCE);
    let launches = collect(&unit).launches;
    let positions: Vec<_> = launches.iter().map(|l| (l.pos.line, l.pos.column)).collect();
    assert_eq!(positions, vec![(10, 2), (17, 2), (26, 2)]);
    assert!(launches.iter().all(|l| l.kind == LaunchKind::GoStatement));
}

#[test]
fn go_without_call_has_no_callable() {
    let unit = parse("package main\n\nfunc main() {\n\tgo worker\n}\n");
    let launches = collect(&unit).launches;
    assert_eq!(launches.len(), 1);
    assert!(launches[0].callable.is_none());
}

#[test]
fn group_launches_are_recognized() {
    let source = "package main\n\nfunc main() {\n\tvar g errgroup.Group\n\tg.Go(func() error {\n\t\treturn nil\n\t})\n}\n";
    let unit = parse(source);
    let launches = collect(&unit).launches;
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].kind, LaunchKind::GroupLaunch);
    assert_eq!(launches[0].pos.line, 5);
    assert!(matches!(launches[0].callable, Some(Expr::Closure(_))));
}

#[test]
fn statements_inside_loops_and_switches_are_lowered() {
    let source = r#"package main

func main() {
	for i := 0; i < 3; i++ {
		switch i {
		case 1:
			go first()
		default:
			select {
			case <-done:
				go second()
			}
		}
	}
}
"#;
    let unit = parse(source);
    let lines: Vec<_> = collect(&unit).launches.iter().map(|l| l.pos.line).collect();
    assert_eq!(lines, vec![7, 11]);
}

#[test]
fn syntax_errors_are_reported_with_position() {
    let err = GoParser::new()
        .parse_source(Path::new("broken.go"), "example.com/app", "package main\n\nfunc main( {\n")
        .expect_err("broken source");
    match err {
        ParseError::Syntax(position) => assert_eq!(position.file, Path::new("broken.go")),
        other => panic!("expected syntax error, got {other}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = GoParser::new()
        .parse_file(Path::new("/definitely/not/here.go"), "example.com/app")
        .expect_err("missing file");
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn lowers_parameters_and_local_bindings() {
    let unit = parse(
        "package main\n\nfunc run(a, b int, rest ...func()) {\n\tw := func(job func()) {}\n\tvar x, y = 1, 2\n\tfor _, f := range rest {\n\t\tgo f()\n\t}\n}\n",
    );
    let run = unit.function("run").expect("run");
    let params: Vec<_> = run.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["a", "b", "rest"]);

    let body = run.body.as_ref().expect("run body");
    match &body[0] {
        Stmt::Bind { names, values } => {
            assert_eq!(names[0].name, "w");
            match &values[0] {
                Expr::Closure(closure) => assert_eq!(closure.params[0].name, "job"),
                other => panic!("expected a closure, got {other:?}"),
            }
        }
        other => panic!("expected a binding, got {other:?}"),
    }
    match &body[1] {
        Stmt::Bind { names, values } => {
            let names: Vec<_> = names.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(names, vec!["x", "y"]);
            assert_eq!(values.len(), 2);
        }
        other => panic!("expected a var binding, got {other:?}"),
    }

    let launches = collect(&unit).launches;
    assert_eq!(launches.len(), 1);
    assert!(launches[0].bindings.binds("f"));
    assert!(launches[0].bindings.binds("rest"));
}
