use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::foundation::rng::Rng64;
use crate::media::frame::Frame;
use crate::ops::kernels::clamp_u8;
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Camera shake: each frame is translated by a random offset (wrapping at the borders) and mixed
/// with the untouched frame, `mix_weight` being the original's share.
///
/// `hold` keeps one offset for that many consecutive frames.
pub struct Shake {
    descriptor: OperationDescriptor,
}

impl Shake {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "shake",
                display_name: "Shake",
                version: 1,
                supported_media_types: vec![MediaType::Video],
                stage_tier: StageTier::Advanced,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::int("max_offset").default(5).range(0.0, 64.0),
                    ParamSpec::float("mix_weight").default(0.5).range(0.0, 1.0),
                    ParamSpec::int("hold").default(1).range(1.0, 1000.0),
                    ParamSpec::int("seed").default(0).min(Bound::Inclusive(0.0)),
                ]),
            },
        }
    }
}

impl Default for Shake {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Shake {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        let max = params.int("max_offset")?;
        let mix = params.float("mix_weight")?;
        let hold = params.int("hold")? as usize;
        let mut rng = Rng64::for_frame(params.seed()?, ctx.index / hold);
        let dx = rng.range_i64(-max, max);
        let dy = rng.range_i64(-max, max);
        if (dx, dy) == (0, 0) {
            return Ok(frame.clone());
        }

        let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));
        let ch = frame.channels();
        let color = frame.format().color_channels();
        let src = frame.data();
        let mut out = src.to_vec();
        for y in 0..h {
            let sy = (y - dy).rem_euclid(h);
            for x in 0..w {
                let sx = (x - dx).rem_euclid(w);
                let dst = ((y * w + x) as usize) * ch;
                let from = ((sy * w + sx) as usize) * ch;
                for c in 0..color {
                    let v = mix * f64::from(src[dst + c]) + (1.0 - mix) * f64::from(src[from + c]);
                    out[dst + c] = clamp_u8(v);
                }
            }
        }
        frame.with_data(out)
    }
}
