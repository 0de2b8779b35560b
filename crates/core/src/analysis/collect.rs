//! Syntax collection: function definitions and concurrent launches of one unit.

use serde::{Deserialize, Serialize};

use crate::model::{Bindings, Block, Call, Expr, FunctionDef, Pos, Stmt, Unit};

/// Method name of group-style launchers (`errgroup.Group.Go`, `conc.WaitGroup.Go`).
pub const GROUP_LAUNCH_METHOD: &str = "Go";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchKind {
    /// `go f()`
    GoStatement,
    /// `g.Go(f)`
    GroupLaunch,
}

/// A statement that spawns a callable as an independent task.
#[derive(Debug, Clone)]
pub struct Launch<'a> {
    pub pos: Pos,
    pub kind: LaunchKind,
    /// Launched callable; `None` for a malformed `go` statement.
    pub callable: Option<&'a Expr>,
    /// Local names in scope at the launch.
    pub bindings: Bindings<'a>,
}

#[derive(Debug, Default)]
pub struct Collected<'a> {
    /// Receiver-less function definitions, in declaration order.
    pub functions: Vec<&'a FunctionDef>,
    /// Launches in source order.
    pub launches: Vec<Launch<'a>>,
}

/// Extract function definitions and launches from `unit` in a single pass.
pub fn collect(unit: &Unit) -> Collected<'_> {
    let mut collector = Collector::default();
    for function in &unit.functions {
        if !function.is_method() {
            collector.functions.push(function);
        }
        if let Some(body) = &function.body {
            collector.scope = Bindings::default().enter(&function.params, body);
            collector.block(body);
        }
    }
    collector.scope = Bindings::default();
    collector.block(&unit.initializers);

    // Initializers and functions interleave in the file.
    collector.launches.sort_by_key(|launch| launch.pos);
    Collected { functions: collector.functions, launches: collector.launches }
}

#[derive(Default)]
struct Collector<'a> {
    functions: Vec<&'a FunctionDef>,
    launches: Vec<Launch<'a>>,
    scope: Bindings<'a>,
}

impl<'a> Collector<'a> {
    fn block(&mut self, block: &'a Block) {
        for stmt in block {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Go { pos, call } => {
                self.launches.push(Launch {
                    pos: *pos,
                    kind: LaunchKind::GoStatement,
                    callable: call.as_ref().map(|c| &*c.callee),
                    bindings: self.scope.clone(),
                });
                if let Some(call) = call {
                    self.call(call);
                }
            }
            Stmt::Defer { call, .. } => {
                if let Some(call) = call {
                    self.call(call);
                }
            }
            Stmt::If { init, cond, then, alt } => {
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                self.block(then);
                if let Some(alt) = alt {
                    self.stmt(alt);
                }
            }
            Stmt::Block(block) => self.block(block),
            Stmt::Bind { values, .. } => values.iter().for_each(|e| self.expr(e)),
            Stmt::Simple(exprs) => exprs.iter().for_each(|e| self.expr(e)),
        }
    }

    fn expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Ident(_) => {}
            Expr::Selector { operand, .. } => self.expr(operand),
            Expr::Call(call) => {
                if let Some(first) = group_launch_target(call) {
                    self.launches.push(Launch {
                        pos: call.pos,
                        kind: LaunchKind::GroupLaunch,
                        callable: Some(first),
                        bindings: self.scope.clone(),
                    });
                }
                self.call(call);
            }
            Expr::Closure(closure) => {
                let outer = std::mem::take(&mut self.scope);
                self.scope = outer.enter(&closure.params, &closure.body);
                self.block(&closure.body);
                self.scope = outer;
            }
            Expr::Other(children) => children.iter().for_each(|e| self.expr(e)),
        }
    }

    fn call(&mut self, call: &'a Call) {
        self.expr(&call.callee);
        call.args.iter().for_each(|arg| self.expr(arg));
    }
}

/// First argument of an `x.Go(f, ...)` call.
fn group_launch_target(call: &Call) -> Option<&Expr> {
    match &*call.callee {
        Expr::Selector { field, .. } if field.name == GROUP_LAUNCH_METHOD => call.args.first(),
        _ => None,
    }
}
