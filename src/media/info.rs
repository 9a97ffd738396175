use std::path::Path;

use crate::foundation::core::{Fps, MediaType};
use crate::foundation::error::DegradeResult;
use crate::media::frame::{MediaPayload, PixelFormat};

/// Read-only description of a payload for reporting. Never consulted by the pipeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MediaInfo {
    /// Still or video.
    pub media_type: MediaType,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Number of frames (1 for a still).
    pub frame_count: usize,
    /// Frame rate of a video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Length of a video in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Decoded pixel bytes held in memory.
    pub pixel_bytes: usize,
    /// Encoded size on disk, when the payload came from storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_bytes: Option<u64>,
    /// Whether a video carries an audio reference.
    pub has_audio: bool,
}

impl MediaInfo {
    /// Describe an in-memory payload.
    pub fn of(payload: &MediaPayload) -> Self {
        let (width, height) = payload.dimensions();
        let (fps, duration_secs, has_audio) = match payload {
            MediaPayload::Image(_) => (None, None, false),
            MediaPayload::Video(clip) => (
                Some(clip.fps().as_f64()),
                Some(clip.duration_secs()),
                clip.audio().is_some(),
            ),
        };
        Self {
            media_type: payload.media_type(),
            width,
            height,
            format: payload.format(),
            frame_count: payload.frame_count(),
            fps,
            duration_secs,
            pixel_bytes: payload.byte_len(),
            stored_bytes: None,
            has_audio,
        }
    }

    /// Load `path` and describe it, including its stored size.
    pub fn probe(path: &Path, media_type: MediaType, fps: Fps) -> DegradeResult<Self> {
        let payload = crate::media::io::load_media(path, media_type, fps)?;
        let mut info = Self::of(&payload);
        info.stored_bytes = Some(crate::media::io::stored_size(path)?);
        Ok(info)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/info.rs"]
mod tests;
