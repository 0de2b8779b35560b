//! On-demand loading of callables declared outside the current unit.
//!
//! The loader never parses a whole external module: it asks the
//! [`SymbolService`] where a symbol is declared, parses that one file, and
//! analyzes the first matching definition. Every failure along the way is
//! absorbed and classified unsafe.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::resolver::Resolver;
use crate::analysis::table::{Facet, RecoveryStore};
use crate::model::{Position, Unit};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load grammar: {0}")]
    Grammar(String),
    #[error("Syntax error at {0}")]
    Syntax(Position),
}

/// Turns source text into a [`Unit`].
pub trait SourceParser: Send + Sync {
    fn parse_source(&self, file: &Path, module: &str, source: &str) -> Result<Unit, ParseError>;

    fn parse_file(&self, file: &Path, module: &str) -> Result<Unit, ParseError> {
        let source = fs::read_to_string(file)
            .map_err(|source| ParseError::Io { path: file.to_path_buf(), source })?;
        self.parse_source(file, module, &source)
    }
}

/// Symbol information supplied by the host driver.
pub trait SymbolService: Send + Sync {
    /// Module (import path) that `qualifier` names inside `unit`.
    ///
    /// The default maps the qualifier through the unit's imports, which
    /// covers aliased imports.
    fn resolve_module(&self, unit: &Unit, qualifier: &str) -> Option<String> {
        unit.import_for(qualifier).map(|import| import.path.clone())
    }

    /// Declared position of the top-level function `symbol` in `module`.
    fn locate(&self, module: &str, symbol: &str) -> Option<Position>;
}

impl<T: SymbolService + ?Sized> SymbolService for Arc<T> {
    fn resolve_module(&self, unit: &Unit, qualifier: &str) -> Option<String> {
        (**self).resolve_module(unit, qualifier)
    }

    fn locate(&self, module: &str, symbol: &str) -> Option<Position> {
        (**self).locate(module, symbol)
    }
}

/// Symbol service that knows nothing; every external reference is unsafe.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSymbols;

impl SymbolService for NoSymbols {
    fn locate(&self, _module: &str, _symbol: &str) -> Option<Position> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderStats {
    /// Cross-module resolutions performed (table misses).
    pub resolutions: usize,
    /// Files parsed on demand.
    pub parsed_files: usize,
}

type ParseSlot = OnceLock<Option<Arc<Unit>>>;

pub struct CrossModuleLoader {
    parser: Box<dyn SourceParser>,
    symbols: Box<dyn SymbolService>,
    /// One cell per file, filled by the first caller; `None` records a
    /// failed parse.
    units: Mutex<HashMap<PathBuf, Arc<ParseSlot>>>,
    resolutions: AtomicUsize,
    parsed_files: AtomicUsize,
}

impl CrossModuleLoader {
    pub fn new<P, S>(parser: P, symbols: S) -> Self
    where
        P: SourceParser + 'static,
        S: SymbolService + 'static,
    {
        Self {
            parser: Box::new(parser),
            symbols: Box::new(symbols),
            units: Mutex::new(HashMap::new()),
            resolutions: AtomicUsize::new(0),
            parsed_files: AtomicUsize::new(0),
        }
    }

    pub fn parser(&self) -> &dyn SourceParser {
        &*self.parser
    }

    pub fn symbols(&self) -> &dyn SymbolService {
        &*self.symbols
    }

    pub fn has_declaration(&self, module: &str, symbol: &str) -> bool {
        self.symbols.locate(module, symbol).is_some()
    }

    /// Whether the external function `module.symbol` has `facet`.
    ///
    /// Callers memoize through the recovery table, so this runs at most once
    /// per key and run.
    pub fn resolve_cross_module(
        &self,
        store: &dyn RecoveryStore,
        facet: Facet,
        module: &str,
        symbol: &str,
    ) -> bool {
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        let Some(position) = self.symbols.locate(module, symbol) else {
            tracing::debug!(module, symbol, "declaration not found");
            return false;
        };
        let Some(unit) = self.load(&position.file, module) else {
            return false;
        };
        let Some(function) = unit.function(symbol) else {
            tracing::debug!(module, symbol, file = %position.file.display(), "no matching definition");
            return false;
        };
        Resolver::new(&unit, store, self).function_has(facet, function)
    }

    /// Parse `file`, reusing an earlier parse of the same file.
    ///
    /// Concurrent callers for one file wait on the same cell, so each file
    /// is parsed at most once. The map lock is not held while parsing.
    pub fn load(&self, file: &Path, module: &str) -> Option<Arc<Unit>> {
        let slot = Arc::clone(self.units.lock().entry(file.to_path_buf()).or_default());
        slot.get_or_init(|| match self.parser.parse_file(file, module) {
            Ok(unit) => {
                self.parsed_files.fetch_add(1, Ordering::Relaxed);
                Some(Arc::new(unit))
            }
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "failed to load declaration");
                None
            }
        })
        .clone()
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            parsed_files: self.parsed_files.load(Ordering::Relaxed),
        }
    }
}
