use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{DegradeError, DegradeResult};

/// Kind of media a payload carries and an operation may accept.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A single still frame.
    Image,
    /// An ordered sequence of frames sharing dimensions.
    Video,
}

impl MediaType {
    /// Both media types, in declaration order.
    pub const ALL: [MediaType; 2] = [MediaType::Image, MediaType::Video];

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = DegradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(DegradeError::media(format!(
                "unknown media type '{other}', expected 'image' or 'video'"
            ))),
        }
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> DegradeResult<Self> {
        if den == 0 {
            return Err(DegradeError::media("fps den must be > 0"));
        }
        if num == 0 {
            return Err(DegradeError::media("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Approximate a floating-point rate with millihertz precision.
    pub fn from_f64(fps: f64) -> DegradeResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DegradeError::media("fps must be finite and > 0"));
        }
        if fps.fract() == 0.0 && fps <= f64::from(u32::MAX) {
            return Self::new(fps as u32, 1);
        }
        Self::new((fps * 1000.0).round() as u32, 1000)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
