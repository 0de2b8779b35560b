//! Fault-safety resolution of callables.
//!
//! A launch is safe when the launched callable [`Facet::Guards`]: its own body
//! registers a `defer` whose deferred callable [`Facet::Intercepts`]. A
//! callable intercepts when its body calls `recover()` directly, or calls
//! another callable that intercepts. Both searches go through nested blocks,
//! loops, cases and conditionals of the same frame but not into closure
//! bodies, which run in frames of their own.
//!
//! A bare name bound by a parameter or local declaration of an enclosing
//! frame is a variable and resolves as opaque, even when a function of the
//! same name exists at package level.

use crate::analysis::loader::CrossModuleLoader;
use crate::analysis::table::{Facet, RecoveryKey, RecoveryStore};
use crate::model::{Bindings, Block, Call, Callable, Expr, FunctionDef, Stmt, Unit};

/// Resolves callables referenced from one unit.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    unit: &'a Unit,
    store: &'a dyn RecoveryStore,
    loader: &'a CrossModuleLoader,
}

impl<'a> Resolver<'a> {
    pub fn new(unit: &'a Unit, store: &'a dyn RecoveryStore, loader: &'a CrossModuleLoader) -> Self {
        Self { unit, store, loader }
    }

    pub fn unit(&self) -> &'a Unit {
        self.unit
    }

    /// Seed the table with the launch safety of every local function.
    pub fn seed<'f>(&self, functions: impl IntoIterator<Item = &'f FunctionDef>) {
        for function in functions {
            self.lookup_local(Facet::Guards, &function.name.name);
        }
    }

    /// Whether launching `callable` is fault-safe, with no local names in scope.
    pub fn is_launch_safe(&self, callable: &Expr) -> bool {
        self.is_launch_safe_in(callable, &Bindings::default())
    }

    /// Whether launching `callable` from a frame that binds `bindings` is
    /// fault-safe.
    pub fn is_launch_safe_in(&self, callable: &Expr, bindings: &Bindings<'_>) -> bool {
        self.resolve(Facet::Guards, Callable::of(callable), bindings)
    }

    pub fn resolve(&self, facet: Facet, callable: Callable<'_>, bound: &Bindings<'_>) -> bool {
        match callable {
            Callable::Closure(closure) => {
                let inner = bound.enter(&closure.params, &closure.body);
                self.block_has(facet, &closure.body, &inner)
            }
            Callable::Local(name) if bound.binds(name) => {
                tracing::debug!(name, file = %self.unit.file.display(), "callable is a local variable");
                false
            }
            Callable::Local(name) => match self.lookup_local(facet, name) {
                Some(value) => value,
                None => self.resolve_sibling(facet, name),
            },
            Callable::Qualified { qualifier, symbol } => {
                self.resolve_qualified(facet, qualifier, symbol)
            }
            Callable::Opaque => false,
        }
    }

    /// Memoized `facet` of a function defined in this unit; `None` when the
    /// unit defines no such function.
    pub fn lookup_local(&self, facet: Facet, name: &str) -> Option<bool> {
        let function = self.unit.function(name)?;
        let key = RecoveryKey::local(facet, &self.unit.file, name);
        Some(self.store.lookup_or_compute(key, &mut || self.function_has(facet, function)))
    }

    /// `facet` of a definition's body; body-less declarations never qualify.
    pub fn function_has(&self, facet: Facet, function: &FunctionDef) -> bool {
        function.body.as_ref().is_some_and(|body| {
            let bound = Bindings::default().enter(&function.params, body);
            self.block_has(facet, body, &bound)
        })
    }

    /// A bare name defined in another file of the same module.
    fn resolve_sibling(&self, facet: Facet, name: &str) -> bool {
        if !self.loader.has_declaration(&self.unit.module, name) {
            tracing::debug!(name, file = %self.unit.file.display(), "unknown local callable");
            return false;
        }
        self.resolve_in_module(facet, &self.unit.module, name)
    }

    fn resolve_qualified(&self, facet: Facet, qualifier: &str, symbol: &str) -> bool {
        let Some(module) = self.loader.symbols().resolve_module(self.unit, qualifier) else {
            tracing::debug!(qualifier, symbol, "qualifier is not an imported module");
            return false;
        };
        self.resolve_in_module(facet, &module, symbol)
    }

    fn resolve_in_module(&self, facet: Facet, module: &str, symbol: &str) -> bool {
        let key = RecoveryKey::qualified(facet, module, symbol);
        self.store.lookup_or_compute(key, &mut || {
            self.loader.resolve_cross_module(self.store, facet, module, symbol)
        })
    }

    fn block_has(&self, facet: Facet, block: &Block, bound: &Bindings<'_>) -> bool {
        block.iter().any(|stmt| self.stmt_has(facet, stmt, bound))
    }

    fn stmt_has(&self, facet: Facet, stmt: &Stmt, bound: &Bindings<'_>) -> bool {
        match stmt {
            Stmt::Defer { call, .. } => match facet {
                Facet::Guards => call.as_ref().is_some_and(|c| self.defers_interception(c, bound)),
                Facet::Intercepts => call.as_ref().is_some_and(|c| self.call_args_have(c, bound)),
            },
            Stmt::If { init, cond, then, alt } => {
                init.as_ref().is_some_and(|s| self.stmt_has(facet, s, bound))
                    || cond.as_ref().is_some_and(|e| self.expr_has(facet, e, bound))
                    || self.block_has(facet, then, bound)
                    || alt.as_ref().is_some_and(|s| self.stmt_has(facet, s, bound))
            }
            Stmt::Block(block) => self.block_has(facet, block, bound),
            // The launched call runs in another goroutine; only its
            // arguments are evaluated here.
            Stmt::Go { call, .. } => match facet {
                Facet::Guards => false,
                Facet::Intercepts => call.as_ref().is_some_and(|c| self.call_args_have(c, bound)),
            },
            Stmt::Expr(expr) => self.expr_has(facet, expr, bound),
            Stmt::Bind { values: exprs, .. } | Stmt::Simple(exprs) => {
                exprs.iter().any(|e| self.expr_has(facet, e, bound))
            }
        }
    }

    /// Exit-time callbacks only matter to [`Facet::Guards`]; calls only
    /// matter to [`Facet::Intercepts`].
    fn expr_has(&self, facet: Facet, expr: &Expr, bound: &Bindings<'_>) -> bool {
        match facet {
            Facet::Guards => false,
            Facet::Intercepts => self.calls_interceptor(expr, bound),
        }
    }

    /// Whether the callable deferred by `call` intercepts when it runs.
    ///
    /// `defer recover()` does not: the primitive is then the deferred
    /// function itself instead of being called by one. Neither does
    /// `defer handle(recover())`, whose `recover()` is an argument evaluated
    /// when the defer statement runs, not inside the deferred call.
    fn defers_interception(&self, call: &Call, bound: &Bindings<'_>) -> bool {
        if call.is_recover() {
            return false;
        }
        self.resolve(Facet::Intercepts, Callable::of(&call.callee), bound)
    }

    fn calls_interceptor(&self, expr: &Expr, bound: &Bindings<'_>) -> bool {
        match expr {
            Expr::Call(call) => {
                call.is_recover()
                    || self.resolve(Facet::Intercepts, Callable::of(&call.callee), bound)
                    || self.calls_interceptor(&call.callee, bound)
                    || self.call_args_have(call, bound)
            }
            Expr::Selector { operand, .. } => self.calls_interceptor(operand, bound),
            Expr::Other(children) => children.iter().any(|e| self.calls_interceptor(e, bound)),
            Expr::Ident(_) | Expr::Closure(_) => false,
        }
    }

    /// Arguments of a deferred or launched call run in the current frame.
    fn call_args_have(&self, call: &Call, bound: &Bindings<'_>) -> bool {
        call.args.iter().any(|arg| self.calls_interceptor(arg, bound))
    }
}
