use image::imageops::FilterType;

use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::Frame;
use crate::ops::kernels::resize;
use crate::ops::resample::scaled;
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Jagged edges from nearest-neighbour down- and up-sampling.
pub struct Aliasing {
    descriptor: OperationDescriptor,
}

impl Aliasing {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "aliasing",
                display_name: "Aliasing",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Intermediate,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::float("scale_factor")
                        .default(0.3)
                        .min(Bound::Exclusive(0.0))
                        .max(Bound::Exclusive(1.0)),
                ]),
            },
        }
    }
}

impl Default for Aliasing {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Aliasing {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        let scale = params.float("scale_factor")?;
        let (w, h) = (frame.width(), frame.height());
        let small = resize(frame, scaled(w, scale), scaled(h, scale), FilterType::Nearest)?;
        resize(&small, w, h, FilterType::Nearest)
    }
}
