use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::Frame;
use crate::ops::kernels::convolve_2d;
use crate::ops::schema::{ParamSchema, ParamSet, ParamSpec};
use crate::ops::{
    FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier, odd_kernel_size,
};

/// Linear motion blur along `angle` degrees (0 is horizontal, counter-clockwise positive).
pub struct MotionBlur {
    descriptor: OperationDescriptor,
}

impl MotionBlur {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "motion_blur",
                display_name: "Motion Blur",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Intermediate,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::int("kernel_size").default(15).range(1.0, 99.0),
                    ParamSpec::float("angle").default(0.0).range(-360.0, 360.0),
                ])
                .with_rule(odd_kernel_size),
            },
        }
    }
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized line kernel through the center of a `size * size` grid.
pub(crate) fn line_kernel(size: usize, angle_deg: f64) -> Vec<f32> {
    let mut kernel = vec![0f32; size * size];
    let center = (size / 2) as f64;
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    // Oversample so steep angles leave no gaps.
    let steps = size * 4;
    for i in 0..=steps {
        let t = i as f64 / steps as f64 * (size as f64 - 1.0) - center;
        let x = (center + t * cos).round();
        let y = (center - t * sin).round();
        if (0.0..size as f64).contains(&x) && (0.0..size as f64).contains(&y) {
            kernel[y as usize * size + x as usize] = 1.0;
        }
    }
    let sum: f32 = kernel.iter().sum();
    if sum > 0.0 {
        kernel.iter_mut().for_each(|w| *w /= sum);
    }
    kernel
}

impl Operation for MotionBlur {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        let size = params.int("kernel_size")? as usize;
        if size <= 1 {
            return Ok(frame.clone());
        }
        convolve_2d(frame, &line_kernel(size, params.float("angle")?), size)
    }
}
