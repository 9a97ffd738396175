use crate::foundation::core::MediaType;
use crate::foundation::error::DegradeResult;
use crate::media::frame::Frame;
use crate::ops::kernels::{clamp_u8, convolve_separable, gaussian_kernel_q16};
use crate::ops::schema::{ParamSchema, ParamSet, ParamSpec};
use crate::ops::{
    FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier, odd_kernel_size,
};

/// Ringing and halos along strong edges.
///
/// Edges are pixels whose Sobel luma gradient exceeds `threshold`. On those pixels the high-pass
/// residual (`frame - blur(frame)`) is amplified by `strength` and added back.
pub struct EdgeArtifact {
    descriptor: OperationDescriptor,
}

impl EdgeArtifact {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "edge_artifact",
                display_name: "Edge Artifact",
                version: 1,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Intermediate,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::float("strength").default(0.5).range(0.0, 5.0),
                    ParamSpec::int("kernel_size").default(3).range(1.0, 31.0),
                    ParamSpec::float("threshold").default(60.0).range(0.0, 1020.0),
                ])
                .with_rule(odd_kernel_size),
            },
        }
    }
}

impl Default for EdgeArtifact {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for EdgeArtifact {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, _ctx: FrameContext) -> DegradeResult<Frame> {
        let strength = params.float("strength")?;
        let size = params.int("kernel_size")? as usize;
        let threshold = params.float("threshold")?;

        let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
        let blurred = convolve_separable(frame, &gaussian_kernel_q16(size, sigma.max(0.1))?)?;
        let edges = edge_mask(frame, threshold);

        let ch = frame.channels();
        let color = frame.format().color_channels();
        let mut out = frame.data().to_vec();
        for (px, is_edge) in edges.iter().enumerate() {
            if !is_edge {
                continue;
            }
            for c in 0..color {
                let i = px * ch + c;
                let v = f64::from(frame.data()[i]);
                let residual = v - f64::from(blurred.data()[i]);
                out[i] = clamp_u8(v + residual * strength);
            }
        }
        frame.with_data(out)
    }
}

fn luma(frame: &Frame) -> Vec<f64> {
    let color = frame.format().color_channels();
    frame
        .data()
        .chunks_exact(frame.channels())
        .map(|px| {
            if color == 1 {
                f64::from(px[0])
            } else {
                0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2])
            }
        })
        .collect()
}

/// Sobel L1 magnitude above `threshold`, with edge clamping.
fn edge_mask(frame: &Frame, threshold: f64) -> Vec<bool> {
    let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));
    let y = luma(frame);
    let at = |x: i64, yy: i64| y[(yy.clamp(0, h - 1) * w + x.clamp(0, w - 1)) as usize];
    let mut mask = Vec::with_capacity(y.len());
    for py in 0..h {
        for px in 0..w {
            let gx = at(px + 1, py - 1) + 2.0 * at(px + 1, py) + at(px + 1, py + 1)
                - at(px - 1, py - 1)
                - 2.0 * at(px - 1, py)
                - at(px - 1, py + 1);
            let gy = at(px - 1, py + 1) + 2.0 * at(px, py + 1) + at(px + 1, py + 1)
                - at(px - 1, py - 1)
                - 2.0 * at(px, py - 1)
                - at(px + 1, py - 1);
            mask.push(gx.abs() + gy.abs() > threshold);
        }
    }
    mask
}
