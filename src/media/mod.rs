//! Frames, clips, and the file formats they are loaded from and saved to.

pub mod ffmpeg;
pub(crate) mod fingerprint;
pub(crate) mod frame;
pub(crate) mod info;
pub mod io;
