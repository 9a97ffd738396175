//! Composition and execution of multi-step degradation pipelines.

pub mod cache;
pub mod compose;
pub mod control;
pub mod dispatch;
pub mod executor;
pub mod spec;
pub mod stage;

pub use cache::{CacheKey, CacheStats, ResultCache, StepSignature};
pub use compose::{Composer, ParamDefaults, PipelineStep};
pub use control::{CancelToken, RunControl};
pub use dispatch::Dispatcher;
pub use executor::{Executor, RunOutput, RunStats};
pub use spec::{PipelineSpec, StepSpec};
pub use stage::{canonical_order, group_by_tier};
