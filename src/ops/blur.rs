use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::Frame;
use crate::ops::kernels::{box_kernel_q16, convolve_separable, gaussian_kernel_q16};
use crate::ops::schema::{ParamSchema, ParamSet, ParamSpec};
use crate::ops::{
    FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier, odd_kernel_size,
};

/// Gaussian or box blur with a square, odd-sized kernel.
pub struct Blur {
    descriptor: OperationDescriptor,
}

impl Blur {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "blur",
                display_name: "Blur",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Basic,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::choice("blur_type", &["gaussian", "box"]).default("gaussian"),
                    ParamSpec::int("kernel_size").default(5).range(1.0, 101.0),
                    ParamSpec::float("sigma").default(1.0).range(0.1, 50.0),
                ])
                .with_rule(odd_kernel_size),
            },
        }
    }
}

impl Default for Blur {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Blur {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        let size = params.int("kernel_size")? as usize;
        let kernel = match params.text("blur_type")? {
            "box" => box_kernel_q16(size),
            _ => gaussian_kernel_q16(size, params.float("sigma")?)?,
        };
        convolve_separable(frame, &kernel)
    }
}
