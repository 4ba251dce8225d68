// dataruns/examples/basic_pipeline.rs

use dataruns::{DatarunsResult, PipelineBuilder, Stage, Value};
use tracing::info;

// 1. Define the transforms. Any `fn(Value) -> anyhow::Result<Value>` qualifies.
fn sum(v: Value) -> anyhow::Result<Value> {
  let items = v.as_slice().ok_or_else(|| anyhow::anyhow!("sum expects a sequence"))?;
  Ok(Value::Int(items.iter().filter_map(Value::as_i64).sum()))
}

fn increment(v: Value) -> anyhow::Result<Value> {
  Ok(Value::Int(v.as_i64().unwrap_or(0) + 1))
}

fn halve(v: Value) -> anyhow::Result<Value> {
  Ok(Value::Float(v.as_f64().unwrap_or(0.0) / 2.0))
}

fn main() -> DatarunsResult<()> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Pipeline Example ---");

  // 2. Accumulate stages. `sum` and `increment` are added together as one group.
  let mut builder = PipelineBuilder::new();
  builder
    .add([Stage::from_fn(sum), Stage::from_fn(increment)])?
    .add_stage(Stage::from_fn(halve));
  info!("{}", builder);

  // 3. Build an immutable pipeline. The builder stays usable afterwards.
  let pipeline = builder.build();
  info!("{}", pipeline);

  // 4. Run it. The list literal reaches `sum` as an array.
  let result = pipeline.run(vec![1, 2, 3, 4, 5].into())?;
  info!("Result: {:?}", result);

  // Expected: (15 + 1) / 2 = 8
  assert_eq!(result, Value::Float(8.0));
  Ok(())
}
