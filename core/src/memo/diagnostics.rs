// dataruns/src/memo/diagnostics.rs

//! Slow-invocation reports and the sinks that receive them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, Level};

/// A report emitted when a memoized invocation exceeds the slow threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
  SlowFunction {
    name: String,
    elapsed: Duration,
    /// Fraction of calls served from cache so far, in `0.0..=1.0`.
    hit_rate: f64,
  },
  SlowPipeline {
    elapsed: Duration,
    num_stages: usize,
  },
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Diagnostic::SlowFunction {
        name,
        elapsed,
        hit_rate,
      } => write!(
        f,
        "{}: {:.4}s (cache hit rate: {:.1}%)",
        name,
        elapsed.as_secs_f64(),
        hit_rate * 100.0
      ),
      Diagnostic::SlowPipeline { elapsed, num_stages } => write!(
        f,
        "Pipeline: {:.4}s (containing {} stages)",
        elapsed.as_secs_f64(),
        num_stages
      ),
    }
  }
}

/// Receives diagnostics. Advisory only; a sink never affects results.
pub trait DiagnosticSink: Send + Sync {
  fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
  F: Fn(&Diagnostic) + Send + Sync,
{
  fn report(&self, diagnostic: &Diagnostic) {
    self(diagnostic)
  }
}

pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Default sink: forwards every diagnostic to `tracing` at `INFO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
  fn report(&self, diagnostic: &Diagnostic) {
    match diagnostic {
      Diagnostic::SlowFunction {
        name,
        elapsed,
        hit_rate,
      } => event!(
        Level::INFO,
        function = %name,
        elapsed_secs = elapsed.as_secs_f64(),
        hit_rate = *hit_rate,
        "{}",
        diagnostic
      ),
      Diagnostic::SlowPipeline { elapsed, num_stages } => event!(
        Level::INFO,
        elapsed_secs = elapsed.as_secs_f64(),
        num_stages = *num_stages,
        "{}",
        diagnostic
      ),
    }
  }
}
