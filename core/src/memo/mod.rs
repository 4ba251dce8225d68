// dataruns/src/memo/mod.rs

//! Memoizing execution wrapper, cache-key derivation and slow-call diagnostics.

pub mod config;
pub mod diagnostics;
pub mod key;
pub mod wrapper;

pub use config::MemoConfig;
pub use diagnostics::{Diagnostic, DiagnosticSink, SharedSink, TracingSink};
pub use key::{derive_key, Arguments, CacheKey, KeyPart};
pub use wrapper::{CacheStats, Memoized, MemoizedFunction, MemoizedPipeline, WrapTarget};
