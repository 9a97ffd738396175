use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::foundation::rng::Rng64;
use crate::media::frame::Frame;
use crate::ops::kernels::{clamp_u8, map_color};
use crate::ops::schema::{Bound, ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Additive gaussian, signal-dependent poisson, or salt-and-pepper noise.
///
/// `intensity` is the standard deviation (0-255 scale) for gaussian noise and the photon scale
/// for poisson noise (smaller is noisier). `density` and `salt_ratio` only affect salt-and-pepper.
pub struct Noise {
    descriptor: OperationDescriptor,
}

impl Noise {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "noise",
                display_name: "Noise",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Basic,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::choice("noise_type", &["gaussian", "poisson", "salt_pepper"])
                        .default("gaussian"),
                    ParamSpec::float("intensity").default(5.0).range(0.01, 100.0),
                    ParamSpec::float("density")
                        .default(0.05)
                        .min(Bound::Exclusive(0.0))
                        .max(Bound::Inclusive(0.5)),
                    ParamSpec::float("salt_ratio").default(0.5).range(0.0, 1.0),
                    ParamSpec::int("seed").default(0).min(Bound::Inclusive(0.0)),
                ]),
            },
        }
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Noise {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        let mut rng = Rng64::for_frame(params.seed()?, ctx.index);
        let intensity = params.float("intensity")?;
        match params.text("noise_type")? {
            "poisson" => map_color(frame, |_, _, v| {
                let lambda = f64::from(v) / 255.0 * intensity;
                clamp_u8(rng.next_poisson(lambda) / intensity * 255.0)
            }),
            "salt_pepper" => salt_pepper(
                frame,
                &mut rng,
                params.float("density")?,
                params.float("salt_ratio")?,
            ),
            _ => map_color(frame, |_, _, v| {
                clamp_u8(f64::from(v) + rng.next_gaussian() * intensity)
            }),
        }
    }
}

fn salt_pepper(frame: &Frame, rng: &mut Rng64, density: f64, salt_ratio: f64) -> DegradeResult<Frame> {
    let pixels = frame.width() as usize * frame.height() as usize;
    let hits = (pixels as f64 * density) as usize;
    let salt = (hits as f64 * salt_ratio) as usize;
    let ch = frame.channels();
    let color = frame.format().color_channels();
    let mut data = frame.data().to_vec();
    for i in 0..hits {
        let value = if i < salt { 255 } else { 0 };
        let px = rng.below(pixels);
        data[px * ch..px * ch + color].fill(value);
    }
    frame.with_data(data)
}
