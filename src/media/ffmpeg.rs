//! Video containers and codec round trips through the system `ffmpeg` and `ffprobe`.
//!
//! Frames cross the process boundary as raw `rgb24` (or `gray` for luma clips). Alpha never
//! reaches a codec; [`round_trip`] reattaches the source alpha afterwards.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Fps;
use crate::foundation::error::{DegradeError, DegradeResult};
use crate::media::frame::{AudioRef, Frame, PixelFormat, VideoClip};
use crate::media::io::strip_alpha;

/// File extensions read and written as video containers.
pub const CONTAINER_EXTENSIONS: [&str; 6] = ["mp4", "m4v", "mov", "mkv", "avi", "webm"];

/// Encoder settings for one ffmpeg encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodec {
    /// libx264 at a constant rate factor (0 best, 51 worst), capped at `max_kbps`.
    H264 {
        /// Constant rate factor.
        crf: u8,
        /// Peak bitrate in kbit/s.
        max_kbps: u32,
    },
    /// MPEG-4 part 2 at a fixed quantizer (1 best, 31 worst), capped at `max_kbps`.
    Mpeg4 {
        /// Fixed quantizer.
        qscale: u8,
        /// Peak bitrate in kbit/s.
        max_kbps: u32,
    },
    /// Lossy WebP still (quality 0 worst, 100 best).
    Webp {
        /// Encoder quality.
        quality: u8,
    },
}

impl VideoCodec {
    /// Settings used when writing a degraded clip to a container.
    pub fn archival() -> Self {
        Self::H264 {
            crf: 16,
            max_kbps: 20_000,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::H264 { .. } | Self::Mpeg4 { .. } => "mp4",
            Self::Webp { .. } => "webp",
        }
    }

    fn push_args(self, cmd: &mut Command) {
        match self {
            Self::H264 { crf, max_kbps } => {
                cmd.args(["-c:v", "libx264", "-preset", "medium", "-crf"])
                    .arg(crf.to_string());
                push_rate_cap(cmd, max_kbps);
                cmd.args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"]);
            }
            Self::Mpeg4 { qscale, max_kbps } => {
                cmd.args(["-c:v", "mpeg4", "-q:v"]).arg(qscale.to_string());
                push_rate_cap(cmd, max_kbps);
                cmd.args(["-pix_fmt", "yuv420p"]);
            }
            Self::Webp { quality } => {
                cmd.args(["-c:v", "libwebp", "-lossless", "0", "-quality"])
                    .arg(quality.to_string())
                    .args(["-frames:v", "1"]);
            }
        }
    }
}

fn push_rate_cap(cmd: &mut Command, max_kbps: u32) {
    cmd.arg("-maxrate")
        .arg(format!("{max_kbps}k"))
        .arg("-bufsize")
        .arg(format!("{}k", u64::from(max_kbps) * 2));
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

/// Return `true` when both `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn ffmpeg_tools_available() -> bool {
    tool_on_path("ffmpeg") && tool_on_path("ffprobe")
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Whether `path` names a file with a video container extension.
pub fn is_container_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONTAINER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Stream facts read by `ffprobe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerProbe {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// `None` when the container reports no usable frame rate.
    pub fps: Option<Fps>,
    /// Whether the container carries an audio stream.
    pub has_audio: bool,
}

/// Read dimensions, frame rate and audio presence with `ffprobe`.
pub fn probe_container(path: &Path) -> DegradeResult<ContainerProbe> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| DegradeError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(DegradeError::media(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| DegradeError::media(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| DegradeError::media(format!("no video stream in '{}'", path.display())))?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err(DegradeError::media("missing video dimensions from ffprobe"));
    };
    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .and_then(|(num, den)| Fps::new(num, den).ok());
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(ContainerProbe {
        width,
        height,
        fps,
        has_audio,
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = s.trim().split_once('/')?;
    Some((num.parse().ok()?, den.parse().ok()?))
}

/// Decode every video frame of a container as RGB.
///
/// `fallback_fps` is used when the container has no frame rate. An audio stream is carried as
/// an [`AudioRef`] to the source file and muxed back by [`save_container`].
pub fn load_container(path: &Path, fallback_fps: Fps) -> DegradeResult<VideoClip> {
    let streams = probe_container(path)?;
    let frames = decode_raw(path, PixelFormat::Rgb8, streams.width, streams.height, false)?;
    let audio = streams.has_audio.then(|| AudioRef {
        path: path.to_path_buf(),
    });
    VideoClip::new(frames, streams.fps.unwrap_or(fallback_fps), audio)
}

/// Encode a clip into the container named by `path`, muxing its audio reference if present.
///
/// yuv420p output needs even dimensions, so odd-sized clips are rejected.
pub fn save_container(clip: &VideoClip, path: &Path, codec: VideoCodec) -> DegradeResult<()> {
    let Some(first) = clip.frames().first() else {
        return Err(DegradeError::media("nothing to encode"));
    };
    if !first.width().is_multiple_of(2) || !first.height().is_multiple_of(2) {
        return Err(DegradeError::media(format!(
            "container output needs even dimensions, got {}x{}",
            first.width(),
            first.height()
        )));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| DegradeError::media(format!("create dir '{}': {e}", parent.display())))?;
    }
    encode(clip.frames(), clip.fps(), codec, path, clip.audio(), false)
}

/// Encode `frames` with `codec` and decode them back, keeping dimensions, pixel format, alpha,
/// and frame count.
pub fn round_trip(frames: &[Frame], fps: Fps, codec: VideoCodec) -> DegradeResult<Vec<Frame>> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };
    let (width, height) = (first.width(), first.height());
    let tmp = TempFile::new(codec.extension());
    encode(frames, fps, codec, &tmp.path, None, true)?;
    let mut decoded = decode_raw(&tmp.path, codec_format(first.format()), width, height, true)?;

    // Codecs may drop or duplicate trailing frames; hold the last one.
    if let Some(last) = decoded.last().cloned() {
        decoded.resize(frames.len(), last);
    }
    decoded
        .into_iter()
        .zip(frames)
        .map(|(coded, source)| restore_alpha(coded, source))
        .collect()
}

fn codec_format(format: PixelFormat) -> PixelFormat {
    match format {
        PixelFormat::L8 => PixelFormat::L8,
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => PixelFormat::Rgb8,
    }
}

fn raw_pix_fmt(format: PixelFormat) -> &'static str {
    match codec_format(format) {
        PixelFormat::L8 => "gray",
        _ => "rgb24",
    }
}

fn restore_alpha(coded: Frame, source: &Frame) -> DegradeResult<Frame> {
    if !source.format().has_alpha() {
        return Ok(coded);
    }
    let data = coded
        .data()
        .chunks_exact(3)
        .zip(source.data().chunks_exact(4))
        .flat_map(|(rgb, src)| [rgb[0], rgb[1], rgb[2], src[3]])
        .collect();
    source.with_data(data)
}

fn encode(
    frames: &[Frame],
    fps: Fps,
    codec: VideoCodec,
    out_path: &Path,
    audio: Option<&AudioRef>,
    pad_even: bool,
) -> DegradeResult<()> {
    let Some(first) = frames.first() else {
        return Err(DegradeError::media("nothing to encode"));
    };

    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    cmd.args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt"])
        .arg(raw_pix_fmt(first.format()))
        .arg("-s")
        .arg(format!("{}x{}", first.width(), first.height()))
        .arg("-r")
        .arg(format!("{}/{}", fps.num, fps.den))
        .args(["-i", "pipe:0"]);
    match audio {
        Some(audio) => {
            cmd.arg("-i")
                .arg(&audio.path)
                .args(["-map", "0:v:0", "-map", "1:a:0?", "-c:a", "aac", "-shortest"]);
        }
        None => {
            cmd.arg("-an");
        }
    }
    if pad_even {
        cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
    }
    codec.push_args(&mut cmd);
    cmd.arg(out_path);

    let mut child = cmd.spawn().map_err(|e| {
        DegradeError::media(format!(
            "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
        ))
    })?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| DegradeError::media("failed to open ffmpeg stdin"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| DegradeError::media("failed to open ffmpeg stderr"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes).map(|_| bytes)
    });

    let written = frames.iter().try_for_each(|frame| match frame.format() {
        PixelFormat::Rgba8 => stdin.write_all(&strip_alpha(frame)),
        _ => stdin.write_all(frame.data()),
    });
    drop(stdin);

    let status = child
        .wait()
        .map_err(|e| DegradeError::media(format!("failed to wait for ffmpeg: {e}")))?;
    let stderr_bytes = stderr_drain
        .join()
        .map_err(|_| DegradeError::media("ffmpeg stderr drain thread panicked"))?
        .map_err(|e| DegradeError::media(format!("ffmpeg stderr read failed: {e}")))?;

    if !status.success() {
        return Err(DegradeError::media(format!(
            "ffmpeg exited with status {status}: {}",
            String::from_utf8_lossy(&stderr_bytes).trim()
        )));
    }
    written.map_err(|e| DegradeError::media(format!("failed to write frames to ffmpeg: {e}")))
}

fn decode_raw(
    input: &Path,
    format: PixelFormat,
    width: u32,
    height: u32,
    crop: bool,
) -> DegradeResult<Vec<Frame>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error", "-i"]).arg(input);
    if crop {
        cmd.arg("-vf").arg(format!("crop={width}:{height}:0:0"));
    }
    cmd.args(["-f", "rawvideo", "-pix_fmt", raw_pix_fmt(format), "pipe:1"]);
    let out = cmd
        .output()
        .map_err(|e| DegradeError::media(format!("failed to run ffmpeg for decode: {e}")))?;
    if !out.status.success() {
        return Err(DegradeError::media(format!(
            "ffmpeg decode failed for '{}': {}",
            input.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = width as usize * height as usize * format.channels();
    if frame_len == 0 || out.stdout.is_empty() || !out.stdout.len().is_multiple_of(frame_len) {
        return Err(DegradeError::media(format!(
            "decoded video has invalid size: got {} bytes, expected multiples of {frame_len}",
            out.stdout.len()
        )));
    }
    out.stdout
        .chunks_exact(frame_len)
        .map(|chunk| Frame::new(width, height, format, chunk.to_vec()))
        .collect()
}

/// Scratch file removed on drop.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(extension: &str) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let path =
            std::env::temp_dir().join(format!("degrade-{}-{n}.{extension}", std::process::id()));
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
