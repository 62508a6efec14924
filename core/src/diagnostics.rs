use crate::{FixtureId, MatchStatus};
use log::warn;
use std::fmt;

/// A record the pipeline skipped or had to interpret. Never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A fixture arrived without an identifier and was dropped.
    MissingFixtureId { batch: usize, position: usize },
    /// A raw record could not be read into a fixture or prediction.
    MalformedRecord { source: String, reason: String },
    /// A score is present while the status says the match has not begun.
    InconsistentStatus { fixture: FixtureId, status: MatchStatus },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingFixtureId { batch, position } => {
                write!(f, "fixture without id skipped (batch {batch}, position {position})")
            }
            Diagnostic::MalformedRecord { source, reason } => {
                write!(f, "malformed record skipped in {source}: {reason}")
            }
            Diagnostic::InconsistentStatus { fixture, status } => write!(
                f,
                "fixture {fixture} has a result but status {status}; treating the result as authoritative"
            ),
        }
    }
}

/// Caller-supplied receiver for diagnostics. Closures work directly.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Discards everything; the log line is still written.
impl DiagnosticSink for () {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Log and forward.
pub(crate) fn emit(sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) {
    warn!("{diagnostic}");
    sink.report(diagnostic);
}
