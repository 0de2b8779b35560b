//! Fault-recovery reachability analysis.
//!
//! - `collect`: function definitions and launches of one unit
//! - `table`: memoized results with a `resolving` guard against cycles
//! - `resolver`: classifies callables as fault-safe or not
//! - `loader`: parses external declarations on demand
//! - `diagnostics`: what gets reported and where it goes

pub mod collect;
pub mod diagnostics;
pub mod loader;
pub mod resolver;
pub mod table;

pub use collect::{collect, Collected, Launch, LaunchKind};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, FnSink};
pub use loader::{CrossModuleLoader, LoaderStats, NoSymbols, ParseError, SourceParser, SymbolService};
pub use resolver::Resolver;
pub use table::{Facet, RecoveryKey, RecoveryStore, RecoveryTable, Scope, SharedRecoveryTable};
