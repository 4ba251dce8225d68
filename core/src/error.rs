// dataruns/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatarunsError {
  /// A stage target had nothing that could be invoked with a single value.
  #[error("Stage is not invocable: {reason}")]
  NotInvocable { reason: String },

  #[error("No function provided at all")]
  NoStageProvided,

  /// Raised before any stage runs, so a rejected input never causes side effects.
  #[error("Invalid pipeline input: {reason}")]
  InvalidInput { reason: String },

  #[error("Stage '{stage_name}' failed. Source: {source}")]
  StageFailed {
    stage_name: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error: {message}")]
  Config { message: String },
}

impl DatarunsError {
  pub(crate) fn null_input() -> Self {
    DatarunsError::InvalidInput {
      reason: "data cannot be null".to_string(),
    }
  }

  pub(crate) fn mapping_input() -> Self {
    DatarunsError::InvalidInput {
      reason: "data cannot be a mapping".to_string(),
    }
  }

  /// Wraps a transform failure with the name of the stage that produced it.
  ///
  /// A `StageFailed` coming out of a nested pipeline is passed through, so the
  /// innermost stage name is kept. Any other error, including a nested pipeline
  /// rejecting its input, is attributed to `stage_name`: by then earlier stages
  /// have already run.
  pub(crate) fn stage_failed(stage_name: &str, err: AnyhowError) -> Self {
    match err.downcast::<DatarunsError>() {
      Ok(inner @ DatarunsError::StageFailed { .. }) => inner,
      Ok(other) => DatarunsError::StageFailed {
        stage_name: stage_name.to_string(),
        source: other.into(),
      },
      Err(source) => DatarunsError::StageFailed {
        stage_name: stage_name.to_string(),
        source,
      },
    }
  }
}

pub type DatarunsResult<T, E = DatarunsError> = std::result::Result<T, E>;
