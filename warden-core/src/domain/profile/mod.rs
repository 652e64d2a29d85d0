// warden-core/src/domain/profile/mod.rs

pub mod column;
pub mod dimension;
pub mod profiler;

// Re-exports
pub use column::{ColumnProfile, InferredType, NumericStats, conforms_to_type, parse_datetime};
pub use dimension::{Dimension, DimensionScore};
pub use profiler::{Profiler, ProfilingReport};
