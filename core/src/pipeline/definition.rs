// dataruns/src/pipeline/definition.rs

//! Contains the `Pipeline` struct definition and methods for its construction
//! and inspection.

use crate::core::stage::Stage;
use crate::core::transform::Transform;
use crate::core::value::Value;
use std::fmt;

/// An immutable, ordered sequence of stages.
///
/// Stage order is execution order. A pipeline is never reordered or mutated after
/// construction; wrapping it (see [`crate::Memoized`]) produces a new object.
#[derive(Clone)]
pub struct Pipeline {
  pub(crate) stages: Vec<Stage>,
}

impl Pipeline {
  /// Creates a pipeline from stages or shared transforms, in execution order.
  pub fn new<I, S>(stages: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<Stage>,
  {
    Self {
      stages: stages.into_iter().map(Into::into).collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  pub fn stages(&self) -> &[Stage] {
    &self.stages
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(Stage::name).collect()
  }
}

/// Pipelines nest: a whole pipeline can be used as one stage of another.
impl Transform for Pipeline {
  fn call(&self, input: Value) -> anyhow::Result<Value> {
    Ok(self.run(input)?)
  }

  fn name(&self) -> String {
    "Pipeline".to_string()
  }
}

impl fmt::Display for Pipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Pipeline(")?;
    for stage in &self.stages {
      write!(f, "\n    {}", stage)?;
    }
    write!(f, "\n)")
  }
}

impl fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline")
      .field("stages", &self.stage_names())
      .finish()
  }
}
