// dataruns/src/pipeline/execution.rs

//! Contains `Pipeline::run()` and `Pipeline::apply()`, which fold an input value
//! through the pipeline's stages.

use crate::core::value::Value;
use crate::error::{DatarunsError, DatarunsResult};
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Level};

impl Pipeline {
  /// Executes the pipeline on `input`.
  ///
  /// Null and mapping inputs are rejected with `InvalidInput` before any stage runs.
  /// A plain `List` is coerced into an `Array` first. Stages are then applied
  /// left to right, each receiving the previous stage's output.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(num_stages = self.stages.len(), input_type = input.type_name()),
        err(Display)
    )]
  pub fn run(&self, input: Value) -> DatarunsResult<Value> {
    if input.is_null() {
      event!(Level::ERROR, "Rejected null pipeline input.");
      return Err(DatarunsError::null_input());
    }
    if input.is_mapping() {
      event!(Level::ERROR, "Rejected mapping pipeline input.");
      return Err(DatarunsError::mapping_input());
    }
    self.fold(input.into_array_like())
  }

  /// Fast path for trusted callers.
  ///
  /// Skips the mapping check but still coerces lists and still rejects null input.
  pub fn apply(&self, input: Value) -> DatarunsResult<Value> {
    if input.is_null() {
      return Err(DatarunsError::null_input());
    }
    self.fold(input.into_array_like())
  }

  fn fold(&self, input: Value) -> DatarunsResult<Value> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    let mut output = input;
    for (stage_idx, stage) in self.stages.iter().enumerate() {
      let stage_span = span!(
        Level::DEBUG,
        "pipeline_stage_execution",
        stage_name = stage.name(),
        stage_index = stage_idx
      );
      let _stage_span_guard = stage_span.enter();

      output = match stage.invoke(output) {
        Ok(value) => value,
        Err(e) => {
          event!(Level::ERROR, error = %e, "Stage failed.");
          return Err(e);
        }
      };
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    Ok(output)
  }
}
