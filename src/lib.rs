#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Ordered degradation pipelines for images and video.
//!
//! Operations are self-describing transforms held in an [`OperationRegistry`]. A
//! [`PipelineSpec`] is composed into validated, tier-ordered [`PipelineStep`]s and run by the
//! executor, which caches every intermediate result under a content fingerprint plus step prefix.
//! [`DegradeEngine`] bundles all of it behind one entry point.

mod foundation;

pub mod config;
pub mod engine;
pub mod media;
pub mod ops;
pub mod pipeline;
pub mod registry;
pub mod request;

pub use config::{CacheConfig, DegradeConfig, PipelineConfig, WorkerConfig};
pub use engine::{DegradeEngine, DegradeOutcome};
pub use foundation::core::{Fps, MediaType};
pub use foundation::error::{
    DegradeError, DegradeResult, ErrorReport, FieldViolation, ViolationReason,
};
pub use media::fingerprint::{Fingerprint, fingerprint_payload};
pub use media::frame::{AudioRef, Frame, MediaPayload, PixelFormat, VideoClip};
pub use media::info::MediaInfo;
pub use ops::schema::{ParamSet, ParamValue, RawParams};
pub use ops::{
    FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier, builtin_operations,
};
pub use pipeline::{
    CacheStats, CancelToken, Composer, Executor, PipelineSpec, PipelineStep, ResultCache,
    RunControl, RunStats, StepSpec,
};
pub use registry::OperationRegistry;
pub use request::{DegradeRequest, NamedConfig};
