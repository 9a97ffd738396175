use crate::foundation::core::MediaType;
use crate::foundation::error::{DegradeResult, FieldViolation};
use crate::foundation::rng::Rng64;
use crate::media::frame::Frame;
use crate::ops::kernels::blend_pixel;
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec, ParamValue};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Dust and dirt: filled discs blended toward `spot_level` with weight `darkness`.
pub struct Dirt {
    descriptor: OperationDescriptor,
}

impl Dirt {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "dirt",
                display_name: "Dirt",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Advanced,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::int("count").default(5).range(0.0, 500.0),
                    ParamSpec::int("min_radius").default(2).range(1.0, 200.0),
                    ParamSpec::int("max_radius").default(10).range(1.0, 200.0),
                    ParamSpec::float("darkness").default(0.6).range(0.0, 1.0),
                    ParamSpec::int("spot_level").default(0).range(0.0, 255.0),
                    ParamSpec::int("seed").default(0).min(Bound::Inclusive(0.0)),
                ])
                .with_rule(radius_order),
            },
        }
    }
}

impl Default for Dirt {
    fn default() -> Self {
        Self::new()
    }
}

fn radius_order(set: &ParamSet) -> Result<(), FieldViolation> {
    match (set.get("min_radius"), set.get("max_radius")) {
        (Some(ParamValue::Int(lo)), Some(ParamValue::Int(hi))) if lo > hi => {
            Err(FieldViolation::out_of_range("min_radius"))
        }
        _ => Ok(()),
    }
}

impl Operation for Dirt {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        let mut rng = Rng64::for_frame(params.seed()?, ctx.index);
        let count = params.int("count")?;
        let (r_lo, r_hi) = (params.int("min_radius")?, params.int("max_radius")?);
        let darkness = params.float("darkness")?;
        let level = params.float("spot_level")?;
        let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));

        let mut data = frame.data().to_vec();
        for _ in 0..count {
            let (cx, cy) = (rng.range_i64(0, w - 1), rng.range_i64(0, h - 1));
            let r = rng.range_i64(r_lo, r_hi);
            for y in (cy - r).max(0)..=(cy + r).min(h - 1) {
                for x in (cx - r).max(0)..=(cx + r).min(w - 1) {
                    if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                        blend_pixel(&mut data, frame, x, y, level, darkness);
                    }
                }
            }
        }
        frame.with_data(data)
    }
}
