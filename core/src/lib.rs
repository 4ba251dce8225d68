// dataruns/src/lib.rs

//! Dataruns: composable data-transformation pipelines for Rust.
//!
//! Dataruns lets you chain transforms into reusable pipelines with features like:
//!  - A single-argument `Transform` contract satisfied by plain closures and fn items.
//!  - Immutable, ordered `Pipeline`s with input validation and list coercion.
//!  - An incremental `PipelineBuilder` that groups stages and flattens them on build.
//!  - A transparent memoizing wrapper (`Memoized`) for single stages or whole
//!    pipelines, with hit-rate bookkeeping and slow-call diagnostics.

pub mod core;
pub mod error;
pub mod memo;
pub mod pipeline;

// --- Re-exports for the Public API ---

pub use crate::core::stage::{SharedTransform, Stage};
pub use crate::core::transform::Transform;
pub use crate::core::value::{Opaque, Table, Value};

pub use crate::pipeline::builder::PipelineBuilder;
pub use crate::pipeline::definition::Pipeline;

pub use crate::memo::config::MemoConfig;
pub use crate::memo::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use crate::memo::key::Arguments;
pub use crate::memo::wrapper::{CacheStats, Memoized, MemoizedFunction, MemoizedPipeline};

pub use crate::error::{DatarunsError, DatarunsResult};

/*
    Core Workflow:
    1. Write transforms as `fn(Value) -> anyhow::Result<Value>` (or implement `Transform`).
    2. Collect them with `PipelineBuilder::add()` / `add_stage()`, then `build()`.
    3. Run the pipeline with `pipeline.run(value)`.
    4. Optionally wrap it: `Memoized::wrap(pipeline)` caches every stage individually.
*/
