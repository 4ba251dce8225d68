// dataruns/examples/error_handling.rs

use dataruns::{DatarunsError, Pipeline, PipelineBuilder, Stage, Value};
use std::collections::BTreeMap;
use tracing::{error, info};

// 1. Define a custom application error type
#[derive(Debug, thiserror::Error)]
enum ExampleAppError {
  #[error("Dataruns error during pipeline execution: {0}")]
  Dataruns(#[from] DatarunsError), // Allows DatarunsError to be converted into ExampleAppError
}

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Error Handling Example ---");

  let pipeline = Pipeline::new(vec![
    Stage::named("parse", |v: Value| {
      let text = v.as_str().ok_or_else(|| anyhow::anyhow!("expected text, got {}", v.type_name()))?;
      Ok(Value::Int(text.trim().parse::<i64>()?))
    }),
    Stage::named("double", |v: Value| Ok(Value::Int(v.as_i64().unwrap_or(0) * 2))),
  ]);

  // Scenario 1: a stage fails
  info!("\nScenario 1: stage failure");
  match run(&pipeline, Value::Text("twelve".into())) {
    Ok(v) => error!("Pipeline unexpectedly succeeded: {:?}", v),
    Err(ExampleAppError::Dataruns(DatarunsError::StageFailed { stage_name, source })) => {
      info!("Stage '{}' failed as expected: {}", stage_name, source);
    }
    Err(e) => error!("Unexpected error: {}", e),
  }

  // Scenario 2: invalid input is rejected before any stage runs
  info!("\nScenario 2: mapping input");
  let mut mapping = BTreeMap::new();
  mapping.insert("value".to_string(), Value::Int(1));
  match run(&pipeline, Value::Map(mapping)) {
    Err(e) => info!("Rejected as expected: {}", e),
    Ok(v) => error!("Pipeline unexpectedly succeeded: {:?}", v),
  }

  // Scenario 3: builder misuse
  info!("\nScenario 3: empty add");
  if let Err(e) = PipelineBuilder::new().add(Vec::<Stage>::new()) {
    info!("Builder refused: {}", e);
  }

  // Scenario 4: happy path
  match run(&pipeline, Value::Text(" 21 ".into())) {
    Ok(v) => info!("Result: {:?}", v),
    Err(e) => error!("Unexpected error: {}", e),
  }
}

fn run(pipeline: &Pipeline, input: Value) -> Result<Value, ExampleAppError> {
  Ok(pipeline.run(input)?)
}
