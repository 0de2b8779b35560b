//! Language-neutral syntax model consumed by the recovery analysis.
//!
//! Frontends lower their parse trees into these types. The model keeps only
//! what the analysis needs: function definitions, statements that register
//! exit-time callbacks or launch concurrent work, calls, closures, and the
//! sub-expressions that may contain them. Everything else collapses into
//! [`Expr::Other`] / [`Stmt::Simple`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the fault-interception primitive.
pub const RECOVER_PRIMITIVE: &str = "recover";

/// Files with this suffix belong to a test suite.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// 1-based line/column inside a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Fully qualified source position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, pos: Pos) -> Self {
        Self { file: file.into(), line: pos.line, column: pos.column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self { name: name.into(), pos }
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub file: PathBuf,
    /// Import path of the package this file belongs to.
    pub module: String,
    /// Name from the package clause.
    pub package: String,
    pub imports: Vec<Import>,
    pub functions: Vec<FunctionDef>,
    /// Package-level variable initializers.
    pub initializers: Vec<Stmt>,
}

impl Unit {
    pub fn new(file: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            module: module.into(),
            package: String::new(),
            imports: Vec::new(),
            functions: Vec::new(),
            initializers: Vec::new(),
        }
    }

    /// First receiver-less function named `name`.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.receiver.is_none() && f.name.name == name)
    }

    /// Import bound to `qualifier` in this file, if any.
    pub fn import_for(&self, qualifier: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.local_name() == Some(qualifier))
    }

    pub fn is_test_suite(&self) -> bool {
        is_test_file(&self.file)
    }

    pub fn position(&self, pos: Pos) -> Position {
        Position::new(&self.file, pos)
    }
}

/// Whether `path` follows the test-file naming convention.
pub fn is_test_file(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub alias: Option<String>,
    pub path: String,
    pub pos: Pos,
}

impl Import {
    pub fn new(alias: Option<String>, path: impl Into<String>, pos: Pos) -> Self {
        Self { alias, path: path.into(), pos }
    }

    /// Qualifier this import binds in the importing file.
    ///
    /// Blank and dot imports bind nothing. Without an alias the last path
    /// segment is used, skipping a trailing major-version segment (`/v2`).
    pub fn local_name(&self) -> Option<&str> {
        match self.alias.as_deref() {
            Some("_") | Some(".") => None,
            Some(alias) => Some(alias),
            None => {
                let mut segments = self.path.rsplit('/');
                let last = segments.next()?;
                if is_major_version(last) {
                    segments.next()
                } else {
                    Some(last)
                }
            }
        }
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    /// Receiver text for methods, e.g. `(s *Server)`.
    pub receiver: Option<String>,
    pub params: Vec<Ident>,
    /// `None` for body-less declarations.
    pub body: Option<Block>,
}

impl FunctionDef {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `go <call>`; `call` is `None` when the operand is not a call.
    Go { pos: Pos, call: Option<Call> },
    /// `defer <call>`; `call` is `None` when the operand is not a call.
    Defer { pos: Pos, call: Option<Call> },
    If { init: Option<Box<Stmt>>, cond: Option<Expr>, then: Block, alt: Option<Box<Stmt>> },
    /// `a, b := x, y`, `var a = x` and range clauses: names bound in the
    /// enclosing frame.
    Bind { names: Vec<Ident>, values: Vec<Expr> },
    /// Bare blocks, loops, switch/select statements and case bodies.
    Block(Block),
    /// Assignments, declarations, returns and similar.
    Simple(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Selector { operand: Box<Expr>, field: Ident },
    Call(Call),
    Closure(Closure),
    Other(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub pos: Pos,
}

impl Call {
    pub fn new(callee: Expr, args: Vec<Expr>, pos: Pos) -> Self {
        Self { callee: Box::new(callee), args, pos }
    }

    /// Whether this is a direct call of the fault-interception primitive.
    pub fn is_recover(&self) -> bool {
        matches!(&*self.callee, Expr::Ident(id) if id.name == RECOVER_PRIMITIVE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub params: Vec<Ident>,
    pub body: Block,
    pub pos: Pos,
}

impl Closure {
    pub fn new(body: Block, pos: Pos) -> Self {
        Self { params: Vec::new(), body, pos }
    }

    pub fn with_params(mut self, params: Vec<Ident>) -> Self {
        self.params = params;
        self
    }
}

/// Shape of a callable expression, which decides how it is resolved.
#[derive(Debug, Clone, Copy)]
pub enum Callable<'a> {
    Closure(&'a Closure),
    Local(&'a str),
    Qualified { qualifier: &'a str, symbol: &'a str },
    /// Method values, computed call targets, anything else.
    Opaque,
}

impl<'a> Callable<'a> {
    pub fn of(expr: &'a Expr) -> Self {
        match expr {
            Expr::Closure(closure) => Callable::Closure(closure),
            Expr::Ident(id) => Callable::Local(&id.name),
            Expr::Selector { operand, field } => match &**operand {
                Expr::Ident(qualifier) => {
                    Callable::Qualified { qualifier: &qualifier.name, symbol: &field.name }
                }
                _ => Callable::Opaque,
            },
            _ => Callable::Opaque,
        }
    }
}

/// Names bound by the parameters and local declarations of the frames that
/// enclose an expression.
///
/// A bound name refers to a variable, never to a package-level function, so
/// calls through it are opaque. A binding anywhere in a frame counts, before
/// or after the use.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bindings<'a> {
    names: Vec<&'a str>,
}

impl<'a> Bindings<'a> {
    /// Bindings inside a frame with `params` and `body`, nested in `self`.
    pub fn enter<'b>(&self, params: &'b [Ident], body: &'b Block) -> Bindings<'b>
    where
        'a: 'b,
    {
        let mut names: Vec<&'b str> = self.names.to_vec();
        names.extend(params.iter().map(|p| p.name.as_str()));
        bound_in_block(body, &mut names);
        Bindings { names }
    }

    pub fn binds(&self, name: &str) -> bool {
        self.names.iter().any(|bound| *bound == name)
    }
}

/// Names declared in `block` and its nested blocks, closures excluded.
fn bound_in_block<'b>(block: &'b Block, out: &mut Vec<&'b str>) {
    for stmt in block {
        bound_in_stmt(stmt, out);
    }
}

fn bound_in_stmt<'b>(stmt: &'b Stmt, out: &mut Vec<&'b str>) {
    match stmt {
        Stmt::Bind { names, .. } => out.extend(names.iter().map(|n| n.name.as_str())),
        Stmt::If { init, then, alt, .. } => {
            if let Some(init) = init {
                bound_in_stmt(init, out);
            }
            bound_in_block(then, out);
            if let Some(alt) = alt {
                bound_in_stmt(alt, out);
            }
        }
        Stmt::Block(block) => bound_in_block(block, out),
        Stmt::Expr(_) | Stmt::Go { .. } | Stmt::Defer { .. } | Stmt::Simple(_) => {}
    }
}
