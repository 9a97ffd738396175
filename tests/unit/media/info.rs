use super::*;
use crate::media::frame::{AudioRef, Frame, VideoClip};

#[test]
fn image_info_has_no_timing() {
    let payload =
        MediaPayload::Image(Frame::filled(8, 6, PixelFormat::Rgb8, &[1, 2, 3]).unwrap());
    let info = MediaInfo::of(&payload);
    assert_eq!(info.media_type, MediaType::Image);
    assert_eq!((info.width, info.height), (8, 6));
    assert_eq!(info.frame_count, 1);
    assert_eq!(info.fps, None);
    assert_eq!(info.pixel_bytes, 8 * 6 * 3);
}

#[test]
fn video_info_reports_duration_and_audio() {
    let frames = vec![Frame::filled(2, 2, PixelFormat::L8, &[0]).unwrap(); 50];
    let clip = VideoClip::new(
        frames,
        Fps::new(25, 1).unwrap(),
        Some(AudioRef {
            path: "track.aac".into(),
        }),
    )
    .unwrap();
    let info = MediaInfo::of(&MediaPayload::Video(clip));
    assert_eq!(info.frame_count, 50);
    assert_eq!(info.fps, Some(25.0));
    assert_eq!(info.duration_secs, Some(2.0));
    assert!(info.has_audio);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["media_type"], "video");
    assert!(json.get("stored_bytes").is_none());
}
