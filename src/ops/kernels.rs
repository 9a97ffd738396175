//! Pixel kernels shared by the built-in operations.
//!
//! All kernels read and write interleaved 8-bit frames, touch only color channels (alpha is
//! carried through), and clamp sampling at the frame edges.

use crate::foundation::error::{DegradeError, DegradeResult};
use crate::media::frame::Frame;

/// Normalized 1-D Gaussian weights in Q16 fixed point; `size` must be odd.
pub(crate) fn gaussian_kernel_q16(size: usize, sigma: f64) -> DegradeResult<Vec<u32>> {
    if size % 2 == 0 {
        return Err(DegradeError::media("gaussian kernel size must be odd"));
    }
    if size == 1 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(DegradeError::media("gaussian sigma must be > 0"));
    }

    let r = (size / 2) as i64;
    let denom = 2.0 * sigma * sigma;
    let weights_f = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect::<Vec<_>>();
    Ok(quantize_q16(&weights_f))
}

/// Uniform weights in Q16 fixed point.
pub(crate) fn box_kernel_q16(size: usize) -> Vec<u32> {
    quantize_q16(&vec![1.0; size.max(1)])
}

/// Normalize and quantize so the weights sum to exactly `1 << 16`.
fn quantize_q16(weights_f: &[f64]) -> Vec<u32> {
    let sum: f64 = weights_f.iter().sum();
    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }
    weights
}

/// Horizontal then vertical pass with the same 1-D kernel.
pub(crate) fn convolve_separable(frame: &Frame, k: &[u32]) -> DegradeResult<Frame> {
    if k.len() <= 1 {
        return Ok(frame.clone());
    }
    let mut tmp = frame.data().to_vec();
    let mut out = frame.data().to_vec();
    horizontal_pass(frame, frame.data(), &mut tmp, k);
    vertical_pass(frame, &tmp, &mut out, k);
    frame.with_data(out)
}

fn horizontal_pass(frame: &Frame, src: &[u8], dst: &mut [u8], k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));
    let ch = frame.channels();
    let color = frame.format().color_channels();
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * ch;
                for c in 0..color {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * ch;
            for c in 0..color {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(frame: &Frame, src: &[u8], dst: &mut [u8], k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));
    let ch = frame.channels();
    let color = frame.format().color_channels();
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i64 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * ch;
                for c in 0..color {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * ch;
            for c in 0..color {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

/// Dense 2-D convolution with a square `size * size` float kernel (row-major).
pub(crate) fn convolve_2d(frame: &Frame, kernel: &[f32], size: usize) -> DegradeResult<Frame> {
    if kernel.len() != size * size || size % 2 == 0 {
        return Err(DegradeError::media("2-D kernel must be odd-sized and square"));
    }
    let taps = kernel
        .iter()
        .enumerate()
        .filter(|(_, w)| **w != 0.0)
        .map(|(i, w)| ((i % size) as i64, (i / size) as i64, *w))
        .collect::<Vec<_>>();
    let radius = (size / 2) as i64;
    let (w, h) = (i64::from(frame.width()), i64::from(frame.height()));
    let ch = frame.channels();
    let color = frame.format().color_channels();
    let src = frame.data();
    let mut out = src.to_vec();
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for &(kx, ky, kw) in &taps {
                let sx = (x + kx - radius).clamp(0, w - 1);
                let sy = (y + ky - radius).clamp(0, h - 1);
                let idx = ((sy * w + sx) as usize) * ch;
                for c in 0..color {
                    acc[c] += kw * f32::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * ch;
            for c in 0..color {
                out[out_idx + c] = clamp_u8(f64::from(acc[c]));
            }
        }
    }
    frame.with_data(out)
}

/// Rewrite every color sample; `f` receives `(pixel index, channel, value)`.
pub(crate) fn map_color(
    frame: &Frame,
    mut f: impl FnMut(usize, usize, u8) -> u8,
) -> DegradeResult<Frame> {
    let ch = frame.channels();
    let color = frame.format().color_channels();
    let mut out = frame.data().to_vec();
    for (px, chunk) in out.chunks_exact_mut(ch).enumerate() {
        for (c, v) in chunk.iter_mut().take(color).enumerate() {
            *v = f(px, c, *v);
        }
    }
    frame.with_data(out)
}

pub(crate) fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Blend `value` into every color channel of the pixel at `(x, y)` with weight `alpha`.
pub(crate) fn blend_pixel(data: &mut [u8], frame: &Frame, x: i64, y: i64, value: f64, alpha: f64) {
    if x < 0 || y < 0 || x >= i64::from(frame.width()) || y >= i64::from(frame.height()) {
        return;
    }
    let ch = frame.channels();
    let idx = (y as usize * frame.width() as usize + x as usize) * ch;
    for c in 0..frame.format().color_channels() {
        let old = f64::from(data[idx + c]);
        data[idx + c] = clamp_u8(old * (1.0 - alpha) + value * alpha);
    }
}

/// Resize through the `image` crate, keeping the pixel format.
pub(crate) fn resize(
    frame: &Frame,
    width: u32,
    height: u32,
    filter: image::imageops::FilterType,
) -> DegradeResult<Frame> {
    if (width, height) == (frame.width(), frame.height()) {
        return Ok(frame.clone());
    }
    let img = crate::media::io::frame_to_dynamic(frame)?;
    crate::media::io::frame_from_dynamic(img.resize_exact(width, height, filter))
}

#[cfg(test)]
#[path = "../../tests/unit/ops/kernels.rs"]
mod tests;
