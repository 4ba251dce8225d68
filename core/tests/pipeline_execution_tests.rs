// tests/pipeline_execution_tests.rs
mod common; // Reference the common module

use common::*;
use dataruns::{DatarunsError, Opaque, Pipeline, Stage, Table, Value};
use serial_test::serial;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[test]
fn test_pipeline_runs_stages_in_order() {
  setup_tracing();
  let pipeline = Pipeline::new(vec![
    tagging_stage(" S1"),
    tagging_stage(" S2"),
    tagging_stage(" S3"),
  ]);

  let result = pipeline.run(Value::Text("start".into())).unwrap();
  assert_eq!(result, Value::Text("start S1 S2 S3".into()));
}

#[test]
fn test_pipeline_is_a_strict_left_fold() {
  setup_tracing();
  let stages = [add_one, double, square, add_one];
  let pipeline = Pipeline::new(stages.iter().map(|f| Stage::from_fn(*f)));

  for x in [-3_i64, 0, 1, 7] {
    let mut expected = Value::Int(x);
    for f in &stages {
      expected = f(expected).unwrap();
    }
    assert_eq!(pipeline.run(Value::Int(x)).unwrap(), expected, "input {}", x);
  }
  // ((2 + 1) * 2)^2 + 1
  assert_eq!(pipeline.run(Value::Int(2)).unwrap(), Value::Int(37));
}

#[test]
fn test_list_input_is_coerced_to_array_before_first_stage() {
  setup_tracing();
  let seen_type = Arc::new(parking_lot::Mutex::new(String::new()));
  let probe = {
    let seen_type = seen_type.clone();
    Stage::named("probe", move |v: Value| {
      *seen_type.lock() = v.type_name().to_string();
      Ok(v)
    })
  };
  let pipeline = Pipeline::new(vec![probe, Stage::from_fn(total)]);

  let result = pipeline.run(vec![1, 2, 3, 4].into()).unwrap();
  assert_eq!(result, Value::Int(10));
  assert_eq!(seen_type.lock().as_str(), "array");
}

#[test]
fn test_scalar_and_table_inputs_are_accepted() {
  setup_tracing();
  let identity = Pipeline::new(vec![Stage::named("identity", |v: Value| Ok(v))]);

  assert_eq!(identity.run(Value::Float(1.5)).unwrap(), Value::Float(1.5));
  let table = Table::new().with_column("price", vec![Value::Int(3), Value::Int(4)]);
  assert_eq!(identity.run(table.clone().into()).unwrap(), Value::Table(table));
  let opaque = Opaque::new(42_u32);
  assert_eq!(identity.run(opaque.clone().into()).unwrap(), Value::Opaque(opaque));
}

#[test]
#[serial]
fn test_null_input_fails_before_any_stage_runs() {
  setup_tracing();
  reset_counters();
  let pipeline = Pipeline::new(vec![counting_stage("side_effect", SIDE_EFFECT_COUNTER.clone())]);

  let result = pipeline.run(Value::Null);
  match result {
    Err(DatarunsError::InvalidInput { reason }) => assert!(reason.contains("null")),
    other => panic!("Expected InvalidInput, got {:?}", other),
  }
  assert_eq!(SIDE_EFFECT_COUNTER.load(Ordering::SeqCst), 0);

  assert!(matches!(pipeline.apply(Value::Null), Err(DatarunsError::InvalidInput { .. })));
  assert_eq!(SIDE_EFFECT_COUNTER.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
fn test_mapping_input_fails_before_any_stage_runs() {
  setup_tracing();
  reset_counters();
  let pipeline = Pipeline::new(vec![counting_stage("side_effect", SIDE_EFFECT_COUNTER.clone())]);

  let mut map = BTreeMap::new();
  map.insert("a".to_string(), Value::Int(1));
  let result = pipeline.run(Value::Map(map));
  match result {
    Err(DatarunsError::InvalidInput { reason }) => assert!(reason.contains("mapping")),
    other => panic!("Expected InvalidInput, got {:?}", other),
  }
  assert_eq!(SIDE_EFFECT_COUNTER.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
fn test_apply_fast_path_matches_run_for_valid_input() {
  setup_tracing();
  reset_counters();
  let pipeline = Pipeline::new(vec![
    Stage::from_fn(total),
    counting_stage("double", STAGE_EXEC_COUNTER.clone()),
  ]);

  let via_run = pipeline.run(vec![1, 2].into()).unwrap();
  let via_apply = pipeline.apply(vec![1, 2].into()).unwrap();
  assert_eq!(via_run, via_apply);
  assert_eq!(via_run, Value::Int(6));
  assert_eq!(STAGE_EXEC_COUNTER.load(Ordering::SeqCst), 2);
}

#[test]
fn test_pipeline_propagates_stage_error_and_stops() {
  setup_tracing();
  let after = Arc::new(std::sync::atomic::AtomicUsize::new(0));
  let pipeline = Pipeline::new(vec![
    Stage::from_fn(add_one),
    failing_stage("bad_stage", "I am a bad stage!"),
    counting_stage("never_runs", after.clone()),
  ]);

  match pipeline.run(Value::Int(1)) {
    Err(DatarunsError::StageFailed { stage_name, source }) => {
      assert_eq!(stage_name, "bad_stage");
      assert_eq!(source.to_string(), "I am a bad stage!");
    }
    other => panic!("Expected StageFailed, got {:?}", other),
  }
  assert_eq!(after.load(Ordering::SeqCst), 0);
}

#[test]
fn test_pipeline_nests_as_a_stage() {
  setup_tracing();
  let inner = Pipeline::new(vec![Stage::from_fn(add_one), Stage::from_fn(double)]);
  let outer = Pipeline::new(vec![Stage::new(inner), Stage::from_fn(square)]);

  assert_eq!(outer.run(Value::Int(1)).unwrap(), Value::Int(16));
  assert_eq!(outer.stage_names(), vec!["Pipeline", "square"]);
}

#[test]
fn test_nested_pipeline_error_is_not_rewrapped() {
  setup_tracing();
  let inner = Pipeline::new(vec![failing_stage("deep", "deep failure")]);
  let outer = Pipeline::new(vec![Stage::new(inner)]);

  match outer.run(Value::Int(1)) {
    Err(DatarunsError::StageFailed { stage_name, .. }) => assert_eq!(stage_name, "deep"),
    other => panic!("Expected StageFailed from inner stage, got {:?}", other),
  }
}

#[test]
fn test_nested_pipeline_input_rejection_names_the_nesting_stage() {
  setup_tracing();
  let before = Arc::new(std::sync::atomic::AtomicUsize::new(0));
  let to_map = {
    let before = before.clone();
    Stage::named("to_map", move |v: Value| {
      before.fetch_add(1, Ordering::SeqCst);
      let mut map = BTreeMap::new();
      map.insert("value".to_string(), v);
      Ok(Value::Map(map))
    })
  };
  let inner = Pipeline::new(vec![Stage::named("identity", |v: Value| Ok(v))]);
  let outer = Pipeline::new(vec![to_map, Stage::new(inner)]);

  match outer.run(Value::Int(1)) {
    Err(DatarunsError::StageFailed { stage_name, source }) => {
      assert_eq!(stage_name, "Pipeline");
      assert!(matches!(
        source.downcast_ref::<DatarunsError>(),
        Some(DatarunsError::InvalidInput { .. })
      ));
    }
    other => panic!("Expected StageFailed wrapping the inner rejection, got {:?}", other),
  }
  // The outer input was valid; the first stage did run.
  assert_eq!(before.load(Ordering::SeqCst), 1);
}

#[test]
fn test_repeated_runs_are_deterministic() {
  setup_tracing();
  let pipeline = Pipeline::new(vec![Stage::from_fn(total), Stage::from_fn(square)]);
  let first = pipeline.run(vec![2, 3].into()).unwrap();
  for _ in 0..5 {
    assert_eq!(pipeline.run(vec![2, 3].into()).unwrap(), first);
  }
}
