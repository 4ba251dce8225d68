// dataruns/examples/memoized_pipeline.rs

use dataruns::{Diagnostic, MemoConfig, Memoized, Pipeline, Stage, Value};
use std::time::Duration;
use tracing::info;

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Memoized Pipeline Example ---");

  let slow_square = Stage::named("slow_square", |v: Value| {
    std::thread::sleep(Duration::from_millis(150));
    let n = v.as_i64().unwrap_or(0);
    Ok(Value::Int(n * n))
  });
  let negate = Stage::named("negate", |v: Value| Ok(Value::Int(-v.as_i64().unwrap_or(0))));
  let pipeline = Pipeline::new(vec![slow_square, negate]);

  // Threshold from DATARUNS_SLOW_THRESHOLD_MS (100 ms by default). Reports go to
  // this closure instead of the default tracing sink.
  let config = MemoConfig::from_env()?.with_sink(|d: &Diagnostic| info!("slow: {}", d));
  let fast = Memoized::wrap_with_config(pipeline, config);

  for input in [3, 4, 3, 3, 4] {
    let output = fast.invoke(Value::Int(input))?;
    info!("f({}) = {:?}", input, output);
  }

  if let Memoized::Pipeline(inner) = &fast {
    info!("Stage caches of {}", inner.pipeline());
    for (name, stats) in inner.stage_stats() {
      info!(
        "{}: {} calls, {} hits ({:.1}%)",
        name,
        stats.total_calls,
        stats.cache_hits,
        stats.hit_rate() * 100.0
      );
    }
  }
  Ok(())
}
