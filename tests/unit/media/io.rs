use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("degrade_io_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn gradient(w: u32, h: u32) -> Frame {
    let mut data = Vec::with_capacity((w * h * 3) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 20) as u8, (y * 20) as u8, 128]);
        }
    }
    Frame::new(w, h, PixelFormat::Rgb8, data).unwrap()
}

#[test]
fn png_round_trip_is_lossless() {
    let dir = scratch_dir("png");
    let path = dir.join("still.png");
    let frame = gradient(6, 4);
    save_image(&frame, &path).unwrap();
    assert_eq!(load_image(&path).unwrap(), frame);
}

#[test]
fn jpeg_output_drops_alpha() {
    let dir = scratch_dir("jpeg");
    let path = dir.join("still.jpg");
    let frame = Frame::filled(8, 8, PixelFormat::Rgba8, &[200, 100, 50, 128]).unwrap();
    save_image(&frame, &path).unwrap();
    let back = load_image(&path).unwrap();
    assert_eq!(back.format(), PixelFormat::Rgb8);
    assert_eq!((back.width(), back.height()), (8, 8));
}

#[test]
fn frame_dir_round_trip_preserves_order() {
    let dir = scratch_dir("frames");
    let fps = Fps::new(12, 1).unwrap();
    let frames = (0..3)
        .map(|v| Frame::filled(4, 4, PixelFormat::L8, &[v * 40]).unwrap())
        .collect::<Vec<_>>();
    let clip = VideoClip::new(frames, fps, None).unwrap();

    let written = save_frame_dir(&clip, &dir).unwrap();
    assert_eq!(written.len(), 3);

    let back = load_frame_dir(&dir, fps).unwrap();
    assert_eq!(back, clip);
    assert!(stored_size(&dir).unwrap() > 0);
}

#[test]
fn empty_frame_dir_is_an_error() {
    let dir = scratch_dir("empty");
    let err = load_frame_dir(&dir, Fps::new(30, 1).unwrap()).unwrap_err();
    assert_eq!(err.kind(), "media");
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn saving_over_a_longer_clip_leaves_only_new_frames() {
    let dir = scratch_dir("overwrite");
    let fps = Fps::new(24, 1).unwrap();
    let clip_of = |n: u8| {
        let frames = (0..n)
            .map(|v| Frame::filled(4, 4, PixelFormat::L8, &[v * 30]).unwrap())
            .collect::<Vec<_>>();
        VideoClip::new(frames, fps, None).unwrap()
    };

    save_frame_dir(&clip_of(5), &dir).unwrap();
    let long_size = stored_size(&dir).unwrap();
    // Unrelated files are left alone.
    std::fs::write(dir.join("notes.txt"), b"keep").unwrap();

    let short = clip_of(2);
    save_frame_dir(&short, &dir).unwrap();

    let back = load_media(&dir, MediaType::Video, fps).unwrap();
    assert_eq!(back.frame_count(), 2);
    assert_eq!(back, MediaPayload::Video(short));
    assert!(stored_size(&dir).unwrap() < long_size);
    assert!(dir.join("notes.txt").exists());
}
