//! Loading and saving payloads through the `image` crate.
//!
//! Stills are single image files. Videos are either containers (decoded and encoded through
//! `ffmpeg`, see [`crate::media::ffmpeg`]) or directories of numbered still frames (PNG or JPEG)
//! read in file-name order.

use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, ImageFormat};

use crate::foundation::core::{Fps, MediaType};
use crate::foundation::error::{DegradeError, DegradeResult};
use crate::media::ffmpeg::{self, VideoCodec, is_container_path};
use crate::media::frame::{Frame, MediaPayload, PixelFormat, VideoClip};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Convert a decoded image, keeping alpha only when the source has it.
pub fn frame_from_dynamic(img: DynamicImage) -> DegradeResult<Frame> {
    let (w, h) = (img.width(), img.height());
    match img {
        DynamicImage::ImageLuma8(buf) => Frame::new(w, h, PixelFormat::L8, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => Frame::new(w, h, PixelFormat::Rgb8, buf.into_raw()),
        other if other.color().has_alpha() => {
            Frame::new(w, h, PixelFormat::Rgba8, other.to_rgba8().into_raw())
        }
        other if other.color().channel_count() == 1 => {
            Frame::new(w, h, PixelFormat::L8, other.to_luma8().into_raw())
        }
        other => Frame::new(w, h, PixelFormat::Rgb8, other.to_rgb8().into_raw()),
    }
}

/// Copy a frame into the matching `DynamicImage` variant.
pub fn frame_to_dynamic(frame: &Frame) -> DegradeResult<DynamicImage> {
    let (w, h, data) = (frame.width(), frame.height(), frame.data().to_vec());
    let img = match frame.format() {
        PixelFormat::L8 => image::GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        PixelFormat::Rgb8 => image::RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba8 => {
            image::RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8)
        }
    };
    img.ok_or_else(|| DegradeError::media("frame buffer does not match its dimensions"))
}

pub(crate) fn color_type(format: PixelFormat) -> ColorType {
    match format {
        PixelFormat::L8 => ColorType::L8,
        PixelFormat::Rgb8 => ColorType::Rgb8,
        PixelFormat::Rgba8 => ColorType::Rgba8,
    }
}

/// Decode an encoded still from memory.
pub fn decode_image(bytes: &[u8]) -> DegradeResult<Frame> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| DegradeError::media(format!("decode image: {e}")))?;
    frame_from_dynamic(img)
}

/// Decode a still file.
pub fn load_image(path: &Path) -> DegradeResult<Frame> {
    let img = image::open(path)
        .map_err(|e| DegradeError::media(format!("open image '{}': {e}", path.display())))?;
    frame_from_dynamic(img)
}

/// Write a still; the format follows the file extension. JPEG output drops alpha.
pub fn save_image(frame: &Frame, path: &Path) -> DegradeResult<()> {
    let format = ImageFormat::from_path(path)
        .map_err(|e| DegradeError::media(format!("output '{}': {e}", path.display())))?;
    ensure_parent(path)?;

    let result = if format == ImageFormat::Jpeg && frame.format().has_alpha() {
        let rgb = strip_alpha(frame);
        image::save_buffer_with_format(
            path,
            &rgb,
            frame.width(),
            frame.height(),
            ColorType::Rgb8,
            format,
        )
    } else {
        image::save_buffer_with_format(
            path,
            frame.data(),
            frame.width(),
            frame.height(),
            color_type(frame.format()),
            format,
        )
    };
    result.map_err(|e| DegradeError::media(format!("write image '{}': {e}", path.display())))
}

pub(crate) fn strip_alpha(frame: &Frame) -> Vec<u8> {
    frame
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

/// Sorted still-frame files inside `dir`.
pub fn list_frame_files(dir: &Path) -> DegradeResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DegradeError::media(format!("read frame dir '{}': {e}", dir.display())))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| DegradeError::media(format!("read frame dir '{}': {e}", dir.display())))?
            .path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if path.is_file() && is_frame {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load a directory of numbered frames as a clip timed at `fps`.
pub fn load_frame_dir(dir: &Path, fps: Fps) -> DegradeResult<VideoClip> {
    let files = list_frame_files(dir)?;
    if files.is_empty() {
        return Err(DegradeError::media(format!(
            "frame dir '{}' contains no png/jpeg frames",
            dir.display()
        )));
    }
    let frames = files
        .iter()
        .map(|p| load_image(p))
        .collect::<DegradeResult<Vec<_>>>()?;
    VideoClip::new(frames, fps, None)
}

/// Write every frame as `frame_000000.png`, `frame_000001.png`, ...
///
/// Frame files already in `dir` are removed first, so the directory holds exactly this clip.
pub fn save_frame_dir(clip: &VideoClip, dir: &Path) -> DegradeResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| DegradeError::media(format!("create dir '{}': {e}", dir.display())))?;
    for stale in list_frame_files(dir)? {
        std::fs::remove_file(&stale).map_err(|e| {
            DegradeError::media(format!("remove stale frame '{}': {e}", stale.display()))
        })?;
    }
    let mut written = Vec::with_capacity(clip.frame_count());
    for (idx, frame) in clip.frames().iter().enumerate() {
        let path = dir.join(format!("frame_{idx:06}.png"));
        save_image(frame, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Load a still file, a video container, or a frame directory depending on `media_type`.
///
/// `fps` times frame directories and containers that report no frame rate.
pub fn load_media(path: &Path, media_type: MediaType, fps: Fps) -> DegradeResult<MediaPayload> {
    match media_type {
        MediaType::Image => Ok(MediaPayload::Image(load_image(path)?)),
        MediaType::Video if is_container_path(path) => {
            Ok(MediaPayload::Video(ffmpeg::load_container(path, fps)?))
        }
        MediaType::Video => Ok(MediaPayload::Video(load_frame_dir(path, fps)?)),
    }
}

/// Videos go to a container when `path` has a container extension, else to a frame directory.
pub fn save_media(payload: &MediaPayload, path: &Path) -> DegradeResult<()> {
    match payload {
        MediaPayload::Image(frame) => save_image(frame, path),
        MediaPayload::Video(clip) if is_container_path(path) => {
            ffmpeg::save_container(clip, path, VideoCodec::archival())
        }
        MediaPayload::Video(clip) => save_frame_dir(clip, path).map(|_| ()),
    }
}

/// Size of a file, or the summed size of the files directly inside a directory.
pub fn stored_size(path: &Path) -> DegradeResult<u64> {
    let meta = std::fs::metadata(path)
        .map_err(|e| DegradeError::media(format!("stat '{}': {e}", path.display())))?;
    if meta.is_file() {
        return Ok(meta.len());
    }
    let mut total = 0;
    for file in list_frame_files(path)? {
        total += std::fs::metadata(&file)
            .map_err(|e| DegradeError::media(format!("stat '{}': {e}", file.display())))?
            .len();
    }
    Ok(total)
}

fn ensure_parent(path: &Path) -> DegradeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| DegradeError::media(format!("create dir '{}': {e}", parent.display())))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/media/io.rs"]
mod tests;
