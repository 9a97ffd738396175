use std::path::PathBuf;

use crate::foundation::core::{Fps, MediaType};
use crate::foundation::error::{DegradeError, DegradeResult};

/// Interleaved 8-bit pixel layout of a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Single luma channel.
    L8,
    /// Red, green, blue.
    Rgb8,
    /// Red, green, blue, straight alpha.
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            Self::L8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }

    /// Channels carrying color (alpha excluded). Degradations only touch these.
    pub fn color_channels(self) -> usize {
        match self {
            Self::L8 => 1,
            Self::Rgb8 | Self::Rgba8 => 3,
        }
    }

    /// Whether the last channel is alpha.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba8)
    }
}

/// One 2-D pixel buffer in row-major interleaved layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap pixel bytes, checking that `data` matches `width * height * channels`.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> DegradeResult<Self> {
        if width == 0 || height == 0 {
            return Err(DegradeError::media("frame dimensions must be non-zero"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(format.channels()))
            .ok_or_else(|| DegradeError::media("frame buffer size overflow"))?;
        if data.len() != expected {
            return Err(DegradeError::media(format!(
                "frame buffer holds {} bytes, expected {expected} for {width}x{height} {format:?}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Frame where every pixel equals `px` (`px.len()` must equal the channel count).
    pub fn filled(width: u32, height: u32, format: PixelFormat, px: &[u8]) -> DegradeResult<Self> {
        if px.len() != format.channels() {
            return Err(DegradeError::media("fill pixel does not match pixel format"));
        }
        let count = (width as usize).saturating_mul(height as usize);
        Self::new(width, height, format, px.repeat(count))
    }

    /// Same dimensions and format, new pixel bytes.
    pub fn with_data(&self, data: Vec<u8>) -> DegradeResult<Self> {
        Self::new(self.width, self.height, self.format, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Interleaved pixel bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the pixel bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Size of the pixel buffer.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Pixel bytes at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.channels();
        let idx = (y as usize * self.width as usize + x as usize) * ch;
        self.data.get(idx..idx + ch)
    }

    /// Same width, height, and pixel format.
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }
}

/// Pointer to the audio track that travels with a video; never decoded by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AudioRef {
    /// File holding the audio stream.
    pub path: PathBuf,
}

/// Ordered frames sharing dimensions and pixel format, plus timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoClip {
    frames: Vec<Frame>,
    fps: Fps,
    audio: Option<AudioRef>,
}

impl VideoClip {
    /// Build a clip; frames must be non-empty and share dimensions and format.
    pub fn new(frames: Vec<Frame>, fps: Fps, audio: Option<AudioRef>) -> DegradeResult<Self> {
        let Some(first) = frames.first() else {
            return Err(DegradeError::media("video must contain at least one frame"));
        };
        if let Some(idx) = frames.iter().position(|f| !f.same_shape(first)) {
            return Err(DegradeError::media(format!(
                "video frame {idx} does not match the dimensions/format of frame 0"
            )));
        }
        Ok(Self { frames, fps, audio })
    }

    /// Replace the frames, keeping timing and audio.
    pub fn with_frames(&self, frames: Vec<Frame>) -> DegradeResult<Self> {
        Self::new(frames, self.fps, self.audio.clone())
    }

    /// Frames in presentation order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Audio travelling with the clip, if any.
    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frames.len() as u64)
    }
}

/// The subject of a pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaPayload {
    /// A still.
    Image(Frame),
    /// A frame sequence.
    Video(VideoClip),
}

impl MediaPayload {
    /// Media type of this payload.
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Image(_) => MediaType::Image,
            Self::Video(_) => MediaType::Video,
        }
    }

    /// All frames; an image is a one-frame sequence.
    pub fn frames(&self) -> &[Frame] {
        match self {
            Self::Image(frame) => std::slice::from_ref(frame),
            Self::Video(clip) => clip.frames(),
        }
    }

    /// Number of frames (1 for a still).
    pub fn frame_count(&self) -> usize {
        self.frames().len()
    }

    /// Shared `(width, height)` of every frame.
    pub fn dimensions(&self) -> (u32, u32) {
        let first = &self.frames()[0];
        (first.width(), first.height())
    }

    /// Pixel layout shared by every frame.
    pub fn format(&self) -> PixelFormat {
        self.frames()[0].format()
    }

    /// Frame rate of a video; `None` for a still.
    pub fn fps(&self) -> Option<Fps> {
        match self {
            Self::Image(_) => None,
            Self::Video(clip) => Some(clip.fps()),
        }
    }

    /// Raw pixel bytes held in memory, used for cache budgeting.
    pub fn byte_len(&self) -> usize {
        self.frames().iter().map(Frame::byte_len).sum()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/frame.rs"]
mod tests;
