//! The operation contract and the built-in degradations.

use crate::foundation::core::{Fps, MediaType};
use crate::foundation::error::DegradeResult;
use crate::media::frame::{Frame, VideoClip};

use self::schema::{ParamSchema, ParamSet, RawParams};

pub(crate) mod kernels;
pub mod schema;

mod aliasing;
mod blur;
mod compression;
mod dirt;
mod edge_artifact;
mod flicker;
mod interlace;
mod motion_blur;
mod noise;
mod resample;
mod scratch;
mod shake;

pub use aliasing::Aliasing;
pub use blur::Blur;
pub use compression::Compression;
pub use dirt::Dirt;
pub use edge_artifact::EdgeArtifact;
pub use flicker::Flicker;
pub use interlace::Interlace;
pub use motion_blur::MotionBlur;
pub use noise::Noise;
pub use resample::Resample;
pub use scratch::Scratch;
pub use shake::Shake;

/// Complexity tier; pipelines run lower tiers first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StageTier {
    /// Single-pass pixel degradations.
    Basic,
    /// Structural and geometric artifacts.
    Intermediate,
    /// Film damage and temporal effects.
    Advanced,
}

impl StageTier {
    /// Every tier, in execution order.
    pub const ALL: [StageTier; 3] = [
        StageTier::Basic,
        StageTier::Intermediate,
        StageTier::Advanced,
    ];

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for StageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageTier {
    type Err = crate::foundation::error::DegradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(crate::foundation::error::DegradeError::config(format!(
                "unknown stage tier '{other}'"
            ))),
        }
    }
}

/// What an operation may do to frame dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeEffect {
    /// Output frames have the input's dimensions and format.
    Preserve,
    /// Output frames may have new dimensions (uniform across a video).
    Resize,
}

/// Immutable metadata describing one registered operation.
#[derive(Clone, Debug, serde::Serialize)]
pub struct OperationDescriptor {
    /// Unique, stable identifier used in requests.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Bumped when the output for given parameters changes.
    pub version: u32,
    /// Media types the operation accepts.
    pub supported_media_types: Vec<MediaType>,
    /// Tier used for canonical ordering.
    pub stage_tier: StageTier,
    /// Widest shape effect any parameterization can have.
    pub shape_effect: ShapeEffect,
    /// Declared parameters and cross-field rules.
    pub parameter_schema: ParamSchema,
}

impl OperationDescriptor {
    /// Whether `media_type` is accepted.
    pub fn supports(&self, media_type: MediaType) -> bool {
        self.supported_media_types.contains(&media_type)
    }
}

/// Position of the frame being degraded within its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameContext {
    /// Frame index, 0 for a still.
    pub index: usize,
    /// Frames in the payload.
    pub count: usize,
    /// Frame rate of a video; `None` for a still.
    pub fps: Option<Fps>,
}

impl FrameContext {
    /// Context for a still image.
    pub fn still() -> Self {
        Self {
            index: 0,
            count: 1,
            fps: None,
        }
    }

    /// Presentation time of this frame in seconds (0 for stills).
    pub fn time_secs(&self) -> f64 {
        self.fps
            .map(|fps| fps.frames_to_secs(self.index as u64))
            .unwrap_or(0.0)
    }
}

/// A degradation: validated parameters in, one frame out.
///
/// `apply` must be a pure function of `(frame, params, ctx)`. Randomized operations derive their
/// randomness from a `seed` parameter and `ctx.index`.
pub trait Operation: Send + Sync {
    /// Static metadata for this operation.
    fn descriptor(&self) -> &OperationDescriptor;

    /// Registry id.
    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    /// Whether `media_type` is accepted.
    fn supports(&self, media_type: MediaType) -> bool {
        self.descriptor().supports(media_type)
    }

    /// Validate raw parameters, layering configured `defaults` beneath them.
    fn validate(&self, raw: &RawParams, defaults: Option<&RawParams>) -> DegradeResult<ParamSet> {
        let d = self.descriptor();
        d.parameter_schema.validate(d.id, raw, defaults)
    }

    /// Shape effect for this particular parameterization; defaults to the declared one.
    fn shape_effect(&self, _params: &ParamSet) -> ShapeEffect {
        self.descriptor().shape_effect
    }

    /// Degrade one frame.
    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame>;

    /// Whole-clip transform for parameterizations whose codec spans frames.
    ///
    /// `None` (the default) means the clip is processed frame by frame through [`Self::apply`].
    /// When `Some`, the result must hold one frame per input frame.
    fn apply_clip(
        &self,
        _clip: &VideoClip,
        _params: &ParamSet,
    ) -> Option<DegradeResult<Vec<Frame>>> {
        None
    }
}

impl std::fmt::Debug for dyn Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation").field("id", &self.id()).finish()
    }
}

/// Every built-in operation, in registration (discovery) order.
pub fn builtin_operations() -> Vec<Box<dyn Operation>> {
    vec![
        Box::new(Blur::new()),
        Box::new(Noise::new()),
        Box::new(Resample::new()),
        Box::new(Compression::new()),
        Box::new(Aliasing::new()),
        Box::new(Interlace::new()),
        Box::new(EdgeArtifact::new()),
        Box::new(MotionBlur::new()),
        Box::new(Scratch::new()),
        Box::new(Dirt::new()),
        Box::new(Flicker::new()),
        Box::new(Shake::new()),
    ]
}

/// Cross rule shared by every kernel-based operation.
pub(crate) fn odd_kernel_size(set: &ParamSet) -> Result<(), crate::FieldViolation> {
    match set.get("kernel_size") {
        Some(schema::ParamValue::Int(k)) if *k > 0 && k % 2 == 1 => Ok(()),
        _ => Err(crate::FieldViolation::out_of_range("kernel_size")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/mod.rs"]
mod tests;
