use super::*;

fn rgb(w: u32, h: u32, v: u8) -> Frame {
    Frame::filled(w, h, PixelFormat::Rgb8, &[v, v, v]).unwrap()
}

#[test]
fn frame_rejects_mismatched_buffer() {
    assert!(Frame::new(2, 2, PixelFormat::Rgb8, vec![0; 11]).is_err());
    assert!(Frame::new(0, 2, PixelFormat::L8, vec![]).is_err());
    let f = Frame::new(2, 2, PixelFormat::Rgba8, vec![0; 16]).unwrap();
    assert_eq!(f.byte_len(), 16);
    assert_eq!(f.pixel(1, 1).map(<[u8]>::len), Some(4));
}

#[test]
fn filled_repeats_pixel() {
    let f = Frame::filled(3, 2, PixelFormat::Rgb8, &[1, 2, 3]).unwrap();
    assert_eq!(f.pixel(2, 1), Some(&[1u8, 2, 3][..]));
    assert!(Frame::filled(3, 2, PixelFormat::Rgb8, &[1, 2]).is_err());
}

#[test]
fn pixel_outside_the_frame_is_none() {
    let f = Frame::filled(3, 2, PixelFormat::L8, &[7]).unwrap();
    assert_eq!(f.pixel(2, 1), Some(&[7u8][..]));
    assert_eq!(f.pixel(3, 0), None);
    assert_eq!(f.pixel(0, 2), None);
    assert_eq!(f.pixel(u32::MAX, u32::MAX), None);
}

#[test]
fn video_requires_uniform_frames() {
    let fps = Fps::new(30, 1).unwrap();
    assert!(VideoClip::new(vec![], fps, None).is_err());
    assert!(VideoClip::new(vec![rgb(4, 4, 0), rgb(4, 3, 0)], fps, None).is_err());

    let clip = VideoClip::new(vec![rgb(4, 4, 0), rgb(4, 4, 9)], fps, None).unwrap();
    assert_eq!(clip.frame_count(), 2);
    assert!((clip.duration_secs() - 2.0 / 30.0).abs() < 1e-12);
}

#[test]
fn payload_views_image_as_single_frame() {
    let payload = MediaPayload::Image(rgb(5, 3, 1));
    assert_eq!(payload.media_type(), MediaType::Image);
    assert_eq!(payload.frame_count(), 1);
    assert_eq!(payload.dimensions(), (5, 3));
    assert_eq!(payload.byte_len(), 45);
    assert_eq!(payload.fps(), None);
}
