// dataruns/src/core/stage.rs

//! Defines `Stage`, the uniform invocable unit a pipeline is made of.

use super::transform::Transform;
use super::value::Value;
use crate::error::{DatarunsError, DatarunsResult};
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased transform.
pub type SharedTransform = Arc<dyn Transform>;

#[derive(Clone)]
enum StageTarget {
  Single(SharedTransform),
  /// Every member runs on the same input; only the last result is kept.
  Chain(Vec<SharedTransform>),
}

/// One normalized pipeline step.
///
/// A stage wraps either a single transform or an ordered chain of transforms.
///
/// **Chain semantics:** every member of a chain is invoked, in order, with the *same*
/// input value, and only the last member's result is returned. Earlier results are
/// discarded. A chain is a run of side-effecting transforms yielding one final value,
/// not a nested pipeline; use [`crate::Pipeline`] or the builder for a fold.
#[derive(Clone)]
pub struct Stage {
  name: String,
  target: StageTarget,
}

impl Stage {
  /// Wraps a transform value, such as a struct implementing [`Transform`].
  pub fn new<T: Transform + 'static>(transform: T) -> Self {
    Self::from_shared(Arc::new(transform))
  }

  /// Wraps a closure or fn item. Prefer this over [`Stage::new`] for closures so
  /// that their argument and return types can be inferred.
  pub fn from_fn<F>(f: F) -> Self
  where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
  {
    Self::new(f)
  }

  /// Wraps a closure under an explicit display name.
  pub fn named<S, F>(name: S, f: F) -> Self
  where
    S: Into<String>,
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
  {
    Stage {
      name: name.into(),
      target: StageTarget::Single(Arc::new(f)),
    }
  }

  pub fn from_shared(transform: SharedTransform) -> Self {
    Stage {
      name: transform.name(),
      target: StageTarget::Single(transform),
    }
  }

  /// Wraps an ordered chain of transforms as a single stage. See the type-level
  /// docs for how a chain is invoked.
  ///
  /// Fails with `NotInvocable` if the chain is empty.
  pub fn chain<I>(transforms: I) -> DatarunsResult<Self>
  where
    I: IntoIterator<Item = SharedTransform>,
  {
    let members: Vec<SharedTransform> = transforms.into_iter().collect();
    if members.is_empty() {
      return Err(DatarunsError::NotInvocable {
        reason: "an empty chain has no transform to invoke".to_string(),
      });
    }
    let name = members.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ");
    Ok(Stage {
      name,
      target: StageTarget::Chain(members),
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Invokes the stage on `input`, attaching the stage name to any failure.
  pub fn invoke(&self, input: Value) -> DatarunsResult<Value> {
    self
      .call_raw(input)
      .map_err(|e| DatarunsError::stage_failed(&self.name, e))
  }

  fn call_raw(&self, input: Value) -> anyhow::Result<Value> {
    match &self.target {
      StageTarget::Single(transform) => transform.call(input),
      StageTarget::Chain(members) => {
        // `chain` refuses empty member lists, so `result` is always overwritten.
        let mut result = Value::Null;
        for member in members {
          result = member.call(input.clone())?;
        }
        Ok(result)
      }
    }
  }
}

impl From<SharedTransform> for Stage {
  fn from(transform: SharedTransform) -> Self {
    Stage::from_shared(transform)
  }
}

impl Transform for Stage {
  fn call(&self, input: Value) -> anyhow::Result<Value> {
    self.call_raw(input)
  }

  fn name(&self) -> String {
    self.name.clone()
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Function[{}]", self.name)
  }
}

impl fmt::Debug for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let members = match &self.target {
      StageTarget::Single(_) => 1,
      StageTarget::Chain(members) => members.len(),
    };
    f.debug_struct("Stage")
      .field("name", &self.name)
      .field("members", &members)
      .finish()
  }
}
