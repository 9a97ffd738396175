use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::foundation::rng::Rng64;
use crate::media::frame::Frame;
use crate::ops::kernels::blend_pixel;
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Film scratches: random straight strokes blended toward `brightness`.
pub struct Scratch {
    descriptor: OperationDescriptor,
}

impl Scratch {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "scratch",
                display_name: "Scratch",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Advanced,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::int("count").default(10).range(0.0, 500.0),
                    ParamSpec::int("line_width").default(1).range(1.0, 20.0),
                    ParamSpec::int("brightness").default(230).range(0.0, 255.0),
                    ParamSpec::float("opacity").default(0.8).range(0.0, 1.0),
                    ParamSpec::int("seed").default(0).min(Bound::Inclusive(0.0)),
                ]),
            },
        }
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Scratch {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        let mut rng = Rng64::for_frame(params.seed()?, ctx.index);
        let count = params.int("count")?;
        let width = params.int("line_width")?;
        let value = params.float("brightness")?;
        let opacity = params.float("opacity")?;
        let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));

        let mut data = frame.data().to_vec();
        for _ in 0..count {
            let start = (rng.range_i64(0, w - 1), rng.range_i64(0, h - 1));
            let end = (rng.range_i64(0, w - 1), rng.range_i64(0, h - 1));
            stroke(start, end, width, |x, y| {
                blend_pixel(&mut data, frame, x, y, value, opacity);
            });
        }
        frame.with_data(data)
    }
}

/// Visit every pixel covered by a square brush of side `width` moved from `a` to `b`.
///
/// Overlapping brush positions are visited once so opacity does not compound along the stroke.
fn stroke(a: (i64, i64), b: (i64, i64), width: i64, mut plot: impl FnMut(i64, i64)) {
    let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).max(1);
    let lo = -(width - 1) / 2;
    let hi = lo + width - 1;
    let mut seen = std::collections::HashSet::new();
    for i in 0..=steps {
        let x = a.0 + (b.0 - a.0) * i / steps;
        let y = a.1 + (b.1 - a.1) * i / steps;
        for dy in lo..=hi {
            for dx in lo..=hi {
                if seen.insert((x + dx, y + dy)) {
                    plot(x + dx, y + dy);
                }
            }
        }
    }
}
