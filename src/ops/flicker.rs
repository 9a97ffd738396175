use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::foundation::rng::Rng64;
use crate::media::frame::Frame;
use crate::ops::kernels::{clamp_u8, map_color};
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Frame rate assumed when a frame carries no timing.
const FALLBACK_FPS: f64 = 30.0;

/// Brightness flicker over time.
///
/// `random` mode picks a gain in `[1 - amplitude, 1 + amplitude]` on every `fps / frequency`-th
/// frame and leaves the rest untouched. `sine` mode modulates every frame with a sine wave of
/// `frequency` Hz.
pub struct Flicker {
    descriptor: OperationDescriptor,
}

impl Flicker {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "flicker",
                display_name: "Flicker",
                version: 1,
                supported_media_types: vec![MediaType::Video],
                stage_tier: StageTier::Advanced,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::choice("mode", &["random", "sine"]).default("random"),
                    ParamSpec::float("amplitude").default(0.3).range(0.0, 1.0),
                    ParamSpec::float("frequency")
                        .default(5.0)
                        .min(Bound::Exclusive(0.0))
                        .max(Bound::Inclusive(120.0)),
                    ParamSpec::int("seed").default(0).min(Bound::Inclusive(0.0)),
                ]),
            },
        }
    }
}

impl Default for Flicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Flicker {
    fn gain(params: &ParamSet, ctx: FrameContext) -> DegradeResult<f64> {
        let amplitude = params.float("amplitude")?;
        let frequency = params.float("frequency")?;
        let fps = ctx.fps.map_or(FALLBACK_FPS, |f| f.as_f64());
        if params.text("mode")? == "sine" {
            let t = ctx.index as f64 / fps;
            return Ok(1.0 + amplitude * (std::f64::consts::TAU * frequency * t).sin());
        }
        let interval = ((fps / frequency).round() as usize).max(1);
        if ctx.index % interval != 0 {
            return Ok(1.0);
        }
        let mut rng = Rng64::for_frame(params.seed()?, ctx.index);
        Ok(1.0 - amplitude + 2.0 * amplitude * rng.next_f64_01())
    }
}

impl Operation for Flicker {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        let gain = Self::gain(params, ctx)?;
        if gain == 1.0 {
            return Ok(frame.clone());
        }
        map_color(frame, |_, _, v| clamp_u8(f64::from(v) * gain))
    }
}
