use super::*;
use crate::foundation::core::Fps;
use crate::media::frame::{Frame, VideoClip};

fn gray(v: u8) -> Frame {
    Frame::filled(4, 4, PixelFormat::L8, &[v]).unwrap()
}

#[test]
fn fingerprint_is_deterministic() {
    let payload = MediaPayload::Image(gray(10));
    assert_eq!(fingerprint_payload(&payload), fingerprint_payload(&payload.clone()));
}

#[test]
fn fingerprint_changes_with_pixels() {
    let a = MediaPayload::Image(gray(10));
    let b = MediaPayload::Image(gray(11));
    assert_ne!(fingerprint_payload(&a), fingerprint_payload(&b));
}

#[test]
fn fingerprint_distinguishes_image_from_one_frame_video() {
    let image = MediaPayload::Image(gray(10));
    let video = MediaPayload::Video(
        VideoClip::new(vec![gray(10)], Fps::new(30, 1).unwrap(), None).unwrap(),
    );
    assert_ne!(fingerprint_payload(&image), fingerprint_payload(&video));
}

#[test]
fn fingerprint_depends_on_frame_rate() {
    let at = |fps| {
        MediaPayload::Video(
            VideoClip::new(vec![gray(1), gray(2)], Fps::new(fps, 1).unwrap(), None).unwrap(),
        )
    };
    assert_ne!(fingerprint_payload(&at(24)), fingerprint_payload(&at(30)));
}

#[test]
fn display_is_32_hex_digits() {
    let s = fingerprint_payload(&MediaPayload::Image(gray(0))).to_string();
    assert_eq!(s.len(), 32);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
}
