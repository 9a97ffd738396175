use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::media::frame::{MediaPayload, PixelFormat};

const XXH3_SEED: u64 = 0x3c1d_52a7_9e0b_f486;

/// 128-bit content fingerprint of a media payload.
///
/// Keys the result cache, so two payloads with identical pixels and timing share cached results
/// no matter which file they were loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Fingerprint pixels, dimensions, format, frame count, and frame rate.
///
/// The audio reference is a path, not content, and is left out.
pub fn fingerprint_payload(payload: &MediaPayload) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_u8(match payload {
        MediaPayload::Image(_) => 0,
        MediaPayload::Video(_) => 1,
    });
    if let Some(fps) = payload.fps() {
        h.write_u32(fps.num);
        h.write_u32(fps.den);
    }
    h.write_u64(payload.frame_count() as u64);
    for frame in payload.frames() {
        h.write_u32(frame.width());
        h.write_u32(frame.height());
        h.write_u8(match frame.format() {
            PixelFormat::L8 => 0,
            PixelFormat::Rgb8 => 1,
            PixelFormat::Rgba8 => 2,
        });
        h.write_u64(frame.byte_len() as u64);
        h.write_bytes(frame.data());
    }
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/fingerprint.rs"]
mod tests;
