//! Diagnostics produced for launches and the sinks that consume them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::collect::LaunchKind;
use crate::model::Position;

pub const UNSAFE_GOROUTINE: &str = "goroutine created without panic recovery";
pub const UNSAFE_GROUP_LAUNCH: &str = "errgroup goroutine created without panic recovery";
pub const MALFORMED_GO_STATEMENT: &str = "go statement without call expression";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnsafeLaunch,
    MalformedLaunch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub position: Position,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn unsafe_launch(position: Position, launch: LaunchKind) -> Self {
        let message = match launch {
            LaunchKind::GoStatement => UNSAFE_GOROUTINE,
            LaunchKind::GroupLaunch => UNSAFE_GROUP_LAUNCH,
        };
        Self { position, message: message.to_string(), kind: DiagnosticKind::UnsafeLaunch }
    }

    pub fn malformed_launch(position: Position) -> Self {
        Self {
            position,
            message: MALFORMED_GO_STATEMENT.to_string(),
            kind: DiagnosticKind::MalformedLaunch,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

/// Receives diagnostics as they are produced.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Adapts a closure into a [`DiagnosticSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(Diagnostic)> DiagnosticSink for FnSink<F> {
    fn report(&mut self, diagnostic: Diagnostic) {
        (self.0)(diagnostic)
    }
}
