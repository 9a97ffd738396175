use image::imageops::FilterType;

use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::Frame;
use crate::ops::kernels::resize;
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Downsample by `scale_factor`, then (by default) upsample back to the original size.
///
/// With `restore_size: false` the downsampled frame is the output, so this is the one built-in
/// operation that can change frame dimensions.
pub struct Resample {
    descriptor: OperationDescriptor,
}

impl Resample {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "resample",
                display_name: "Resample",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Basic,
                shape_effect: ShapeEffect::Resize,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::float("scale_factor")
                        .default(0.5)
                        .min(Bound::Exclusive(0.0))
                        .max(Bound::Exclusive(1.0)),
                    ParamSpec::choice(
                        "interpolation",
                        &["nearest", "bilinear", "bicubic", "lanczos"],
                    )
                    .default("bilinear"),
                    ParamSpec::boolean("restore_size").default(true),
                ]),
            },
        }
    }
}

impl Default for Resample {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn filter_type(name: &str) -> FilterType {
    match name {
        "nearest" => FilterType::Nearest,
        "bicubic" => FilterType::CatmullRom,
        "lanczos" => FilterType::Lanczos3,
        _ => FilterType::Triangle,
    }
}

/// `max(1, floor(dim * scale))`.
pub(crate) fn scaled(dim: u32, scale: f64) -> u32 {
    ((f64::from(dim) * scale) as u32).max(1)
}

impl Operation for Resample {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn shape_effect(&self, params: &ParamSet) -> ShapeEffect {
        match params.flag("restore_size") {
            Ok(true) => ShapeEffect::Preserve,
            _ => ShapeEffect::Resize,
        }
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        let scale = params.float("scale_factor")?;
        let filter = filter_type(params.text("interpolation")?);
        let (w, h) = (frame.width(), frame.height());
        let small = resize(frame, scaled(w, scale), scaled(h, scale), filter)?;
        if params.flag("restore_size")? {
            resize(&small, w, h, filter)
        } else {
            Ok(small)
        }
    }
}
