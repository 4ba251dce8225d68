// dataruns/src/memo/config.rs

use crate::error::{DatarunsError, DatarunsResult};
use crate::memo::diagnostics::{DiagnosticSink, SharedSink, TracingSink};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding the slow-invocation threshold, in milliseconds.
pub const SLOW_THRESHOLD_ENV: &str = "DATARUNS_SLOW_THRESHOLD_MS";

pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(100);

/// Settings for a memoizing wrapper. Cloned into every per-stage wrapper of a
/// memoized pipeline, so all of them report to the same sink.
#[derive(Clone)]
pub struct MemoConfig {
  /// Invocations taking longer than this are reported to the sink.
  pub slow_threshold: Duration,
  pub sink: SharedSink,
}

impl Default for MemoConfig {
  fn default() -> Self {
    MemoConfig {
      slow_threshold: DEFAULT_SLOW_THRESHOLD,
      sink: Arc::new(TracingSink),
    }
  }
}

impl MemoConfig {
  /// Defaults, with the threshold taken from `DATARUNS_SLOW_THRESHOLD_MS` if set.
  pub fn from_env() -> DatarunsResult<Self> {
    let mut config = Self::default();
    if let Ok(raw) = env::var(SLOW_THRESHOLD_ENV) {
      let millis = raw.trim().parse::<u64>().map_err(|e| DatarunsError::Config {
        message: format!("Invalid {} '{}': {}", SLOW_THRESHOLD_ENV, raw, e),
      })?;
      config.slow_threshold = Duration::from_millis(millis);
    }
    Ok(config)
  }

  pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
    self.slow_threshold = threshold;
    self
  }

  pub fn with_sink<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
    self.sink = Arc::new(sink);
    self
  }

  pub fn with_shared_sink(mut self, sink: SharedSink) -> Self {
    self.sink = sink;
    self
  }
}

impl fmt::Debug for MemoConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoConfig")
      .field("slow_threshold", &self.slow_threshold)
      .finish_non_exhaustive()
  }
}
