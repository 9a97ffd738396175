use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::Frame;
use crate::ops::kernels::{clamp_u8, map_color};
use crate::ops::schema::{ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Comb artifacts: every other row (the chosen field) is darkened by `intensity`.
pub struct Interlace {
    descriptor: OperationDescriptor,
}

impl Interlace {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "interlace",
                display_name: "Interlace",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Intermediate,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::float("intensity").default(0.5).range(0.0, 1.0),
                    ParamSpec::choice("field", &["even", "odd"]).default("odd"),
                ]),
            },
        }
    }
}

impl Default for Interlace {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Interlace {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        let keep = 1.0 - params.float("intensity")?;
        let parity = usize::from(params.text("field")? == "odd");
        let width = frame.width() as usize;
        map_color(frame, |px, _, v| {
            if (px / width) % 2 == parity {
                clamp_u8(f64::from(v) * keep)
            } else {
                v
            }
        })
    }
}
