// dataruns/src/pipeline/builder.rs

//! Implements `PipelineBuilder`, the mutable accumulator that produces pipelines.

use crate::core::stage::Stage;
use crate::error::{DatarunsError, DatarunsResult};
use crate::pipeline::definition::Pipeline;
use std::fmt;
use tracing::{event, Level};

#[derive(Clone)]
enum PendingEntry {
  Single(Stage),
  /// Stages added together in one `add` call; spliced one level deep on build.
  Group(Vec<Stage>),
}

/// Collects stages and produces immutable [`Pipeline`] snapshots.
///
/// ```
/// use dataruns::{PipelineBuilder, Stage, Value};
///
/// # fn main() -> dataruns::DatarunsResult<()> {
/// let double = |v: Value| -> anyhow::Result<Value> { Ok(Value::Int(v.as_i64().unwrap_or(0) * 2)) };
/// let pipeline = PipelineBuilder::new()
///   .add([Stage::from_fn(double), Stage::from_fn(double)])?
///   .add_stage(Stage::from_fn(double))
///   .build();
/// assert_eq!(pipeline.run(Value::Int(1))?, Value::Int(8));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct PipelineBuilder {
  entries: Vec<PendingEntry>,
}

impl PipelineBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds one or more stages.
  ///
  /// A single stage is stored as one entry; several stages are stored together as
  /// a group entry. Fails with `NoStageProvided` when `stages` is empty, leaving
  /// the builder unchanged.
  pub fn add<I, S>(&mut self, stages: I) -> DatarunsResult<&mut Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<Stage>,
  {
    let mut stages: Vec<Stage> = stages.into_iter().map(Into::into).collect();
    let entry = match stages.len() {
      0 => return Err(DatarunsError::NoStageProvided),
      1 => PendingEntry::Single(stages.remove(0)),
      _ => PendingEntry::Group(stages),
    };
    self.entries.push(entry);
    Ok(self)
  }

  /// Adds exactly one stage.
  pub fn add_stage<S: Into<Stage>>(&mut self, stage: S) -> &mut Self {
    self.entries.push(PendingEntry::Single(stage.into()));
    self
  }

  /// Number of pending entries. A group counts as one entry.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Produces a fresh pipeline from the current entries.
  ///
  /// Group entries are flattened exactly one level, preserving order. The builder
  /// keeps its entries and can be extended and built again.
  pub fn build(&self) -> Pipeline {
    let mut stages = Vec::new();
    for entry in &self.entries {
      match entry {
        PendingEntry::Single(stage) => stages.push(stage.clone()),
        PendingEntry::Group(group) => stages.extend(group.iter().cloned()),
      }
    }
    event!(Level::DEBUG, num_entries = self.entries.len(), num_stages = stages.len(), "Built pipeline.");
    Pipeline { stages }
  }
}

impl fmt::Display for PipelineBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered: Vec<String> = self
      .entries
      .iter()
      .map(|entry| match entry {
        PendingEntry::Single(stage) => stage.to_string(),
        PendingEntry::Group(group) => {
          let inner: Vec<String> = group.iter().map(Stage::to_string).collect();
          format!("[{}]", inner.join(", "))
        }
      })
      .collect();
    write!(f, "PipelineBuilder([{}])", rendered.join(", "))
  }
}

impl fmt::Debug for PipelineBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipelineBuilder")
      .field("entries", &self.entries.len())
      .finish()
  }
}
