// dataruns/src/pipeline/mod.rs

//! Defines the `Pipeline` struct, its construction, execution logic, and the
//! `PipelineBuilder` that produces it.

pub mod builder;
pub mod definition;
pub mod execution;

// Re-export the main Pipeline struct
pub use builder::PipelineBuilder;
pub use definition::Pipeline;
