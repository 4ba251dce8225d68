// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use dataruns::{Diagnostic, Stage, Value};
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Stage Creators ---

pub fn add_one(v: Value) -> anyhow::Result<Value> {
  let n = v.as_i64().ok_or_else(|| anyhow::anyhow!("add_one expects an int, got {}", v.type_name()))?;
  Ok(Value::Int(n + 1))
}

pub fn double(v: Value) -> anyhow::Result<Value> {
  let n = v.as_i64().ok_or_else(|| anyhow::anyhow!("double expects an int, got {}", v.type_name()))?;
  Ok(Value::Int(n * 2))
}

pub fn square(v: Value) -> anyhow::Result<Value> {
  let n = v.as_i64().ok_or_else(|| anyhow::anyhow!("square expects an int, got {}", v.type_name()))?;
  Ok(Value::Int(n * n))
}

/// Sums the integer elements of a sequence.
pub fn total(v: Value) -> anyhow::Result<Value> {
  let items = v.as_slice().ok_or_else(|| anyhow::anyhow!("total expects a sequence, got {}", v.type_name()))?;
  Ok(Value::Int(items.iter().filter_map(Value::as_i64).sum()))
}

/// Appends `tag` to a text value.
pub fn tagging_stage(tag: &'static str) -> Stage {
  Stage::named(tag, move |v: Value| {
    let text = v.as_str().unwrap_or_default().to_string();
    Ok(Value::Text(format!("{}{}", text, tag)))
  })
}

/// Doubles its input and bumps `counter` every time it actually runs.
pub fn counting_stage(name: &'static str, counter: Arc<AtomicUsize>) -> Stage {
  Stage::named(name, move |v: Value| {
    counter.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(target: "test_stages", stage = name, "executed");
    double(v)
  })
}

pub fn failing_stage(name: &'static str, message: &'static str) -> Stage {
  Stage::named(name, move |_v: Value| {
    tracing::warn!(target: "test_stages", stage = name, "failing with: '{}'", message);
    Err(anyhow::anyhow!(message))
  })
}

/// Collects every diagnostic it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
  pub seen: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
  pub fn record(&self) -> impl Fn(&Diagnostic) + Send + Sync + 'static {
    let seen = self.seen.clone();
    move |d: &Diagnostic| seen.lock().push(d.clone())
  }

  pub fn len(&self) -> usize {
    self.seen.lock().len()
  }

  pub fn snapshot(&self) -> Vec<Diagnostic> {
    self.seen.lock().clone()
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static STAGE_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static SIDE_EFFECT_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  STAGE_EXEC_COUNTER.store(0, Ordering::SeqCst);
  SIDE_EFFECT_COUNTER.store(0, Ordering::SeqCst);
}
