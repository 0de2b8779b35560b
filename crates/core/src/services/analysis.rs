use std::path::PathBuf;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::analysis::{
    collect, CrossModuleLoader, Diagnostic, DiagnosticKind, DiagnosticSink, LoaderStats,
    RecoveryStore, RecoveryTable, Resolver, SharedRecoveryTable,
};
use crate::config::Settings;
use crate::model::Unit;

/// Outcome of checking one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub file: PathBuf,
    /// Excluded by settings (test-suite unit).
    pub skipped: bool,
    pub launches: usize,
    pub unsafe_launches: usize,
    pub malformed_launches: usize,
}

impl UnitReport {
    fn new(unit: &Unit) -> Self {
        Self {
            file: unit.file.clone(),
            skipped: false,
            launches: 0,
            unsafe_launches: 0,
            malformed_launches: 0,
        }
    }
}

/// Totals for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub units: Vec<UnitReport>,
    pub launches: usize,
    pub unsafe_launches: usize,
    pub malformed_launches: usize,
    /// Resolved entries in the recovery table at the end of the run.
    pub table_entries: usize,
    pub loader: LoaderStats,
}

impl RunSummary {
    fn push(&mut self, report: UnitReport) {
        self.launches += report.launches;
        self.unsafe_launches += report.unsafe_launches;
        self.malformed_launches += report.malformed_launches;
        self.units.push(report);
    }

    pub fn diagnostics(&self) -> usize {
        self.unsafe_launches + self.malformed_launches
    }
}

/// Coordinator that runs the recovery analysis over units supplied by a host.
pub struct Analyzer<'a> {
    pub settings: &'a Settings,
    pub loader: &'a CrossModuleLoader,
}

impl<'a> Analyzer<'a> {
    pub fn new(settings: &'a Settings, loader: &'a CrossModuleLoader) -> Self {
        Self { settings, loader }
    }

    /// Check one unit against `store`, streaming diagnostics into `sink`.
    pub fn check_unit(
        &self,
        store: &dyn RecoveryStore,
        unit: &Unit,
        sink: &mut dyn DiagnosticSink,
    ) -> UnitReport {
        let mut report = UnitReport::new(unit);
        if self.settings.skip_test_files && unit.is_test_suite() {
            tracing::debug!(file = %unit.file.display(), "skipping test-suite unit");
            report.skipped = true;
            return report;
        }

        let collected = collect(unit);
        let resolver = Resolver::new(unit, store, self.loader);
        resolver.seed(collected.functions.iter().copied());

        for launch in &collected.launches {
            report.launches += 1;
            let position = unit.position(launch.pos);
            let diagnostic = match launch.callable {
                None => Some(Diagnostic::malformed_launch(position)),
                Some(callable) if !resolver.is_launch_safe_in(callable, &launch.bindings) => {
                    Some(Diagnostic::unsafe_launch(position, launch.kind))
                }
                Some(_) => None,
            };
            if let Some(diagnostic) = diagnostic {
                match diagnostic.kind {
                    DiagnosticKind::UnsafeLaunch => report.unsafe_launches += 1,
                    DiagnosticKind::MalformedLaunch => report.malformed_launches += 1,
                }
                sink.report(diagnostic);
            }
        }
        report
    }

    /// Check `units` in order with one table for the whole run.
    pub fn check_units(&self, units: &[Unit], sink: &mut dyn DiagnosticSink) -> RunSummary {
        let store = RecoveryTable::new();
        let mut summary = RunSummary::default();
        for unit in units {
            summary.push(self.check_unit(&store, unit, sink));
        }
        summary.table_entries = store.len();
        summary.loader = self.loader.stats();
        summary
    }

    /// Check `units` on up to `jobs` threads sharing one table.
    ///
    /// Diagnostics reach `sink` in unit order once every worker is done.
    pub fn check_units_concurrently(
        &self,
        units: &[Unit],
        jobs: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> RunSummary {
        if jobs <= 1 || units.len() <= 1 {
            return self.check_units(units, sink);
        }

        let store = SharedRecoveryTable::new();
        let chunk_size = units.len().div_ceil(jobs);
        let results: Vec<(UnitReport, Vec<Diagnostic>)> = thread::scope(|scope| {
            let store = &store;
            let workers: Vec<_> = units
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|unit| {
                                let mut diagnostics = Vec::new();
                                let report = self.check_unit(store, unit, &mut diagnostics);
                                (report, diagnostics)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| {
                    worker.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });

        let mut summary = RunSummary::default();
        for (report, diagnostics) in results {
            diagnostics.into_iter().for_each(|d| sink.report(d));
            summary.push(report);
        }
        summary.table_entries = store.len();
        summary.loader = self.loader.stats();
        summary
    }
}
