// dataruns/src/memo/wrapper.rs

//! The memoizing execution wrapper.
//!
//! `Memoized` is a tagged union over the two things it can decorate:
//!  - a single stage or function (`MemoizedFunction`): calls are served from a cache
//!    keyed on the value-derived form of their arguments;
//!  - a whole pipeline (`MemoizedPipeline`): every stage is wrapped individually in a
//!    shadow pipeline, and the pipeline-level call is timed but not cached.

use crate::core::stage::{SharedTransform, Stage};
use crate::core::transform::Transform;
use crate::core::value::Value;
use crate::error::{DatarunsError, DatarunsResult};
use crate::memo::config::MemoConfig;
use crate::memo::diagnostics::Diagnostic;
use crate::memo::key::{derive_key, Arguments, CacheKey};
use crate::pipeline::definition::Pipeline;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{event, Level};

/// A function over full call arguments, for memoizing more than single-value stages.
pub type ArgsFn = Arc<dyn Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync>;

/// Point-in-time counters of a memoizing wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub total_calls: u64,
  pub cache_hits: u64,
  pub cached_entries: usize,
}

impl CacheStats {
  /// `cache_hits / total_calls`, or `0.0` before the first call.
  pub fn hit_rate(&self) -> f64 {
    if self.total_calls == 0 {
      0.0
    } else {
      self.cache_hits as f64 / self.total_calls as f64
    }
  }
}

/// What a wrapper decorates; decides the mode at wrap time.
pub enum WrapTarget {
  Stage(Stage),
  Pipeline(Pipeline),
}

impl From<Stage> for WrapTarget {
  fn from(stage: Stage) -> Self {
    WrapTarget::Stage(stage)
  }
}

impl From<SharedTransform> for WrapTarget {
  fn from(transform: SharedTransform) -> Self {
    WrapTarget::Stage(Stage::from_shared(transform))
  }
}

impl From<Pipeline> for WrapTarget {
  fn from(pipeline: Pipeline) -> Self {
    WrapTarget::Pipeline(pipeline)
  }
}

enum FunctionTarget {
  Stage(Stage),
  Args(ArgsFn),
}

/// Function-mode wrapper: caches results per derived argument key.
///
/// The cache is unbounded and lives as long as the wrapper. Two wrappers around
/// the same function never share entries.
pub struct MemoizedFunction {
  name: String,
  target: FunctionTarget,
  config: MemoConfig,
  cache: Mutex<HashMap<CacheKey, Value>>,
  total_calls: AtomicU64,
  cache_hits: AtomicU64,
}

impl MemoizedFunction {
  pub fn new(stage: Stage) -> Self {
    Self::with_config(stage, MemoConfig::default())
  }

  pub fn with_config(stage: Stage, config: MemoConfig) -> Self {
    Self::build(stage.name().to_string(), FunctionTarget::Stage(stage), config)
  }

  /// Wraps a function that takes positional and keyword arguments.
  pub fn from_fn<S, F>(name: S, f: F) -> Self
  where
    S: Into<String>,
    F: Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
  {
    Self::from_fn_with_config(name, f, MemoConfig::default())
  }

  pub fn from_fn_with_config<S, F>(name: S, f: F, config: MemoConfig) -> Self
  where
    S: Into<String>,
    F: Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
  {
    Self::build(name.into(), FunctionTarget::Args(Arc::new(f)), config)
  }

  fn build(name: String, target: FunctionTarget, config: MemoConfig) -> Self {
    MemoizedFunction {
      name,
      target,
      config,
      cache: Mutex::new(HashMap::new()),
      total_calls: AtomicU64::new(0),
      cache_hits: AtomicU64::new(0),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Invokes the wrapped function with a single positional value.
  pub fn invoke(&self, input: Value) -> DatarunsResult<Value> {
    self.invoke_with(Arguments::single(input))
  }

  /// Invokes the wrapped function, serving the result from cache when the derived
  /// key of `args` has been seen before.
  ///
  /// Arguments that cannot be normalized (see [`crate::memo::key`]) bypass the
  /// cache for this call only: the function runs and nothing is stored. Failed
  /// calls are counted but never cached.
  pub fn invoke_with(&self, args: Arguments) -> DatarunsResult<Value> {
    self.total_calls.fetch_add(1, Ordering::SeqCst);

    let key = derive_key(&args);
    match &key {
      Some(key) => {
        // Clone out and release the lock before returning or calling the target.
        let cached = self.cache.lock().get(key).cloned();
        if let Some(value) = cached {
          self.cache_hits.fetch_add(1, Ordering::SeqCst);
          event!(Level::TRACE, function = %self.name, "Cache hit.");
          return Ok(value);
        }
        event!(Level::TRACE, function = %self.name, "Cache miss.");
      }
      None => event!(Level::TRACE, function = %self.name, "Arguments not normalizable, bypassing cache."),
    }

    let start = Instant::now();
    let result = self.call_target(args)?;
    let elapsed = start.elapsed();

    if let Some(key) = key {
      self.cache.lock().insert(key, result.clone());
    }

    if elapsed > self.config.slow_threshold {
      self.config.sink.report(&Diagnostic::SlowFunction {
        name: self.name.clone(),
        elapsed,
        hit_rate: self.stats().hit_rate(),
      });
    }
    Ok(result)
  }

  fn call_target(&self, mut args: Arguments) -> DatarunsResult<Value> {
    match &self.target {
      FunctionTarget::Stage(stage) => {
        if args.positional.len() != 1 || !args.keyword.is_empty() {
          return Err(DatarunsError::InvalidInput {
            reason: format!(
              "stage '{}' takes exactly one positional argument, got {} positional and {} keyword",
              self.name,
              args.positional.len(),
              args.keyword.len()
            ),
          });
        }
        stage.invoke(args.positional.remove(0))
      }
      FunctionTarget::Args(f) => f(&args).map_err(|e| DatarunsError::stage_failed(&self.name, e)),
    }
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      total_calls: self.total_calls.load(Ordering::SeqCst),
      cache_hits: self.cache_hits.load(Ordering::SeqCst),
      cached_entries: self.cache.lock().len(),
    }
  }

  /// Drops every cached result. Counters are kept.
  pub fn clear_cache(&self) {
    self.cache.lock().clear();
  }
}

impl Transform for MemoizedFunction {
  fn call(&self, input: Value) -> anyhow::Result<Value> {
    Ok(self.invoke(input)?)
  }

  fn name(&self) -> String {
    self.name.clone()
  }
}

impl fmt::Debug for MemoizedFunction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoizedFunction")
      .field("name", &self.name)
      .field("stats", &self.stats())
      .finish()
  }
}

/// Pipeline-mode wrapper: per-stage caching plus whole-pipeline timing.
pub struct MemoizedPipeline {
  original: Pipeline,
  shadow: Pipeline,
  stage_wrappers: Vec<Arc<MemoizedFunction>>,
  config: MemoConfig,
  total_calls: AtomicU64,
}

impl MemoizedPipeline {
  pub fn new(pipeline: Pipeline) -> Self {
    Self::with_config(pipeline, MemoConfig::default())
  }

  /// Wraps every stage of `pipeline` in its own `MemoizedFunction`, sharing
  /// `config`. The original pipeline is kept unchanged.
  pub fn with_config(pipeline: Pipeline, config: MemoConfig) -> Self {
    let stage_wrappers: Vec<Arc<MemoizedFunction>> = pipeline
      .stages()
      .iter()
      .map(|stage| Arc::new(MemoizedFunction::with_config(stage.clone(), config.clone())))
      .collect();
    let shadow = Pipeline::new(
      stage_wrappers
        .iter()
        .map(|wrapper| Stage::from_shared(wrapper.clone() as SharedTransform)),
    );
    MemoizedPipeline {
      original: pipeline,
      shadow,
      stage_wrappers,
      config,
      total_calls: AtomicU64::new(0),
    }
  }

  /// Runs the shadow pipeline. Input validation and results are exactly those of
  /// the wrapped pipeline's `run`.
  pub fn invoke(&self, input: Value) -> DatarunsResult<Value> {
    self.total_calls.fetch_add(1, Ordering::SeqCst);

    let start = Instant::now();
    let result = self.shadow.run(input)?;
    let elapsed = start.elapsed();

    if elapsed > self.config.slow_threshold {
      self.config.sink.report(&Diagnostic::SlowPipeline {
        elapsed,
        num_stages: self.original.len(),
      });
    }
    Ok(result)
  }

  pub fn pipeline(&self) -> &Pipeline {
    &self.original
  }

  /// Pipeline-level counters. The pipeline call itself is never cached, so
  /// `cache_hits` and `cached_entries` stay zero; see [`Self::stage_stats`].
  pub fn stats(&self) -> CacheStats {
    CacheStats {
      total_calls: self.total_calls.load(Ordering::SeqCst),
      ..CacheStats::default()
    }
  }

  /// Counters of each per-stage wrapper, in stage order.
  pub fn stage_stats(&self) -> Vec<(String, CacheStats)> {
    self
      .stage_wrappers
      .iter()
      .map(|wrapper| (wrapper.name().to_string(), wrapper.stats()))
      .collect()
  }

  pub fn clear_cache(&self) {
    for wrapper in &self.stage_wrappers {
      wrapper.clear_cache();
    }
  }
}

impl fmt::Debug for MemoizedPipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoizedPipeline")
      .field("pipeline", &self.original)
      .field("stats", &self.stats())
      .finish()
  }
}

/// Memoizing execution wrapper around either a single stage or a whole pipeline.
///
/// ```
/// use dataruns::{Memoized, Pipeline, Stage, Value};
///
/// # fn main() -> dataruns::DatarunsResult<()> {
/// let pipeline = Pipeline::new(vec![Stage::named("inc", |v: Value| {
///   Ok(Value::Int(v.as_i64().unwrap_or(0) + 1))
/// })]);
/// let fast = Memoized::wrap(pipeline.clone());
/// assert_eq!(fast.invoke(Value::Int(1))?, pipeline.run(Value::Int(1))?);
/// assert_eq!(fast.invoke(Value::Int(1))?, Value::Int(2));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub enum Memoized {
  Function(MemoizedFunction),
  Pipeline(MemoizedPipeline),
}

impl Memoized {
  pub fn wrap<T: Into<WrapTarget>>(target: T) -> Self {
    Self::wrap_with_config(target, MemoConfig::default())
  }

  pub fn wrap_with_config<T: Into<WrapTarget>>(target: T, config: MemoConfig) -> Self {
    match target.into() {
      WrapTarget::Stage(stage) => Memoized::Function(MemoizedFunction::with_config(stage, config)),
      WrapTarget::Pipeline(pipeline) => Memoized::Pipeline(MemoizedPipeline::with_config(pipeline, config)),
    }
  }

  pub fn invoke(&self, input: Value) -> DatarunsResult<Value> {
    match self {
      Memoized::Function(function) => function.invoke(input),
      Memoized::Pipeline(pipeline) => pipeline.invoke(input),
    }
  }

  /// Invokes with full call arguments. A pipeline accepts exactly one positional value.
  pub fn invoke_with(&self, mut args: Arguments) -> DatarunsResult<Value> {
    match self {
      Memoized::Function(function) => function.invoke_with(args),
      Memoized::Pipeline(pipeline) => {
        if args.positional.len() != 1 || !args.keyword.is_empty() {
          return Err(DatarunsError::InvalidInput {
            reason: "a pipeline takes exactly one positional argument".to_string(),
          });
        }
        pipeline.invoke(args.positional.remove(0))
      }
    }
  }

  pub fn is_pipeline(&self) -> bool {
    matches!(self, Memoized::Pipeline(_))
  }

  pub fn name(&self) -> &str {
    match self {
      Memoized::Function(function) => function.name(),
      Memoized::Pipeline(_) => "Pipeline",
    }
  }

  pub fn stats(&self) -> CacheStats {
    match self {
      Memoized::Function(function) => function.stats(),
      Memoized::Pipeline(pipeline) => pipeline.stats(),
    }
  }

  pub fn clear_cache(&self) {
    match self {
      Memoized::Function(function) => function.clear_cache(),
      Memoized::Pipeline(pipeline) => pipeline.clear_cache(),
    }
  }
}

impl Transform for Memoized {
  fn call(&self, input: Value) -> anyhow::Result<Value> {
    Ok(self.invoke(input)?)
  }

  fn name(&self) -> String {
    Memoized::name(self).to_string()
  }
}
