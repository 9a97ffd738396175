use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

use crate::foundation::core::{Fps, MediaType};
use crate::foundation::error::{DegradeError, DegradeResult};
use crate::media::ffmpeg::{self, VideoCodec};
use crate::media::frame::{Frame, PixelFormat, VideoClip};
use crate::media::io::strip_alpha;
use crate::ops::schema::{ParamSchema, ParamSet, ParamSpec};
use crate::ops::{FrameContext, Operation, OperationDescriptor, ShapeEffect, StageTier};

/// Rate used to time a still sent through a video codec.
const STILL_FPS: Fps = Fps { num: 30, den: 1 };

/// Encode and decode through an image or video codec.
///
/// `jpeg` and `png` run in-process; PNG is lossless and ignores `quality`. `webp` (per frame),
/// `h264` and `mpeg4` (whole clip, so motion between frames is coded) go through `ffmpeg`, and
/// `bitrate` caps the two video codecs in kbit/s. Alpha is carried around every lossy codec
/// unchanged.
pub struct Compression {
    descriptor: OperationDescriptor,
}

impl Compression {
    /// Operation with its default descriptor.
    pub fn new() -> Self {
        Self {
            descriptor: OperationDescriptor {
                id: "compression",
                display_name: "Compression",
                version: 2,
                supported_media_types: MediaType::ALL.to_vec(),
                stage_tier: StageTier::Basic,
                shape_effect: ShapeEffect::Preserve,
                parameter_schema: ParamSchema::new(vec![
                    ParamSpec::choice("format", &["jpeg", "png", "webp", "h264", "mpeg4"])
                        .default("jpeg"),
                    ParamSpec::int("quality").default(80).range(1.0, 100.0),
                    ParamSpec::int("bitrate").default(2000).range(100.0, 20_000.0),
                ]),
            },
        }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for Compression {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn apply(&self, frame: &Frame, params: &ParamSet, ctx: FrameContext) -> DegradeResult<Frame> {
        let quality = params.int("quality")?.clamp(1, 100) as u8;
        match params.text("format")? {
            "png" => png_round_trip(frame),
            "jpeg" => jpeg_round_trip(frame, quality),
            _ => {
                let codec = video_codec(params)?;
                let fps = ctx.fps.unwrap_or(STILL_FPS);
                ffmpeg::round_trip(std::slice::from_ref(frame), fps, codec)?
                    .pop()
                    .ok_or_else(|| DegradeError::media("codec returned no frames"))
            }
        }
    }

    fn apply_clip(
        &self,
        clip: &VideoClip,
        params: &ParamSet,
    ) -> Option<DegradeResult<Vec<Frame>>> {
        match params.text("format") {
            Ok("h264" | "mpeg4") => Some(
                video_codec(params)
                    .and_then(|codec| ffmpeg::round_trip(clip.frames(), clip.fps(), codec)),
            ),
            _ => None,
        }
    }
}

/// Map `quality` (1 worst, 100 best) onto each codec's own scale.
pub(crate) fn video_codec(params: &ParamSet) -> DegradeResult<VideoCodec> {
    let quality = params.int("quality")?.clamp(1, 100);
    let max_kbps = params.int("bitrate")?.clamp(100, 20_000) as u32;
    let worse = (100 - quality) as f64 / 99.0;
    match params.text("format")? {
        "h264" => Ok(VideoCodec::H264 {
            crf: (worse * 51.0).round() as u8,
            max_kbps,
        }),
        "mpeg4" => Ok(VideoCodec::Mpeg4 {
            qscale: (1.0 + worse * 30.0).round() as u8,
            max_kbps,
        }),
        "webp" => Ok(VideoCodec::Webp {
            quality: quality as u8,
        }),
        other => Err(DegradeError::apply(
            "compression",
            format!("'{other}' is not an ffmpeg codec"),
        )),
    }
}

fn codec_err(stage: &str, e: image::ImageError) -> DegradeError {
    DegradeError::media(format!("{stage}: {e}"))
}

fn jpeg_round_trip(frame: &Frame, quality: u8) -> DegradeResult<Frame> {
    let (w, h) = (frame.width(), frame.height());
    let (color, color_type) = match frame.format() {
        PixelFormat::L8 => (frame.data().to_vec(), ExtendedColorType::L8),
        PixelFormat::Rgb8 => (frame.data().to_vec(), ExtendedColorType::Rgb8),
        PixelFormat::Rgba8 => (strip_alpha(frame), ExtendedColorType::Rgb8),
    };

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode(&color, w, h, color_type)
        .map_err(|e| codec_err("jpeg encode", e))?;
    let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)
        .map_err(|e| codec_err("jpeg decode", e))?;

    let data = match frame.format() {
        PixelFormat::L8 => decoded.to_luma8().into_raw(),
        PixelFormat::Rgb8 => decoded.to_rgb8().into_raw(),
        PixelFormat::Rgba8 => decoded
            .to_rgb8()
            .into_raw()
            .chunks_exact(3)
            .zip(frame.data().chunks_exact(4))
            .flat_map(|(rgb, src)| [rgb[0], rgb[1], rgb[2], src[3]])
            .collect(),
    };
    frame.with_data(data)
}

fn png_round_trip(frame: &Frame) -> DegradeResult<Frame> {
    let mut encoded = Cursor::new(Vec::new());
    PngEncoder::new_with_quality(&mut encoded, CompressionType::Best, PngFilter::Adaptive)
        .write_image(
            frame.data(),
            frame.width(),
            frame.height(),
            crate::media::io::color_type(frame.format()).into(),
        )
        .map_err(|e| codec_err("png encode", e))?;
    let decoded = image::load_from_memory_with_format(encoded.get_ref(), ImageFormat::Png)
        .map_err(|e| codec_err("png decode", e))?;
    frame.with_data(match frame.format() {
        PixelFormat::L8 => decoded.to_luma8().into_raw(),
        PixelFormat::Rgb8 => decoded.to_rgb8().into_raw(),
        PixelFormat::Rgba8 => decoded.to_rgba8().into_raw(),
    })
}
