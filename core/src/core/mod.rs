pub mod stage;
pub mod transform;
pub mod value;

// Re-export key types for easier access from other dataruns modules (and lib.rs)
pub use stage::{SharedTransform, Stage};
pub use transform::Transform;
pub use value::{Opaque, Table, Value};
