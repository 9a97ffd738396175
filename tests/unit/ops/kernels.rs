use super::*;
use crate::media::frame::PixelFormat;

#[test]
fn kernels_sum_to_one_in_q16() {
    for size in [1usize, 3, 5, 9] {
        let g = gaussian_kernel_q16(size, 1.5).unwrap();
        assert_eq!(g.len(), size);
        assert_eq!(g.iter().sum::<u32>(), 1 << 16);
        let b = box_kernel_q16(size);
        assert_eq!(b.iter().sum::<u32>(), 1 << 16);
    }
    assert!(gaussian_kernel_q16(4, 1.0).is_err());
}

#[test]
fn blur_constant_image_is_identity() {
    let src = Frame::filled(4, 3, PixelFormat::Rgb8, &[10, 20, 30]).unwrap();
    let k = gaussian_kernel_q16(5, 2.0).unwrap();
    assert_eq!(convolve_separable(&src, &k).unwrap(), src);
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let mut data = vec![0u8; 5 * 5];
    data[2 * 5 + 2] = 255;
    let src = Frame::new(5, 5, PixelFormat::L8, data).unwrap();

    let out = convolve_separable(&src, &gaussian_kernel_q16(5, 1.2).unwrap()).unwrap();
    let nonzero = out.data().iter().filter(|v| **v != 0).count();
    assert!(nonzero > 1);
    let sum: i32 = out.data().iter().map(|v| i32::from(*v)).sum();
    assert!((sum - 255).abs() <= 6);
}

#[test]
fn alpha_is_carried_through() {
    let mut data = Vec::new();
    for i in 0..9u8 {
        data.extend_from_slice(&[i * 20, 0, 0, 77]);
    }
    let src = Frame::new(3, 3, PixelFormat::Rgba8, data).unwrap();
    let out = convolve_separable(&src, &box_kernel_q16(3)).unwrap();
    assert!(out.data().chunks_exact(4).all(|px| px[3] == 77));
    let mapped = map_color(&src, |_, _, _| 0).unwrap();
    assert!(mapped.data().chunks_exact(4).all(|px| px[..3] == [0, 0, 0] && px[3] == 77));
}

#[test]
fn identity_2d_kernel_is_identity() {
    let src = Frame::new(3, 2, PixelFormat::L8, vec![1, 2, 3, 4, 5, 6]).unwrap();
    let kernel = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    assert_eq!(convolve_2d(&src, &kernel, 3).unwrap(), src);
    assert!(convolve_2d(&src, &kernel[..4], 2).is_err());
}

#[test]
fn resize_keeps_format() {
    let src = Frame::filled(8, 8, PixelFormat::Rgba8, &[9, 9, 9, 200]).unwrap();
    let out = resize(&src, 4, 2, image::imageops::FilterType::Nearest).unwrap();
    assert_eq!((out.width(), out.height()), (4, 2));
    assert_eq!(out.format(), PixelFormat::Rgba8);
    assert_eq!(out.pixel(0, 0), Some(&[9u8, 9, 9, 200][..]));
}

#[test]
fn blend_pixel_ignores_out_of_bounds() {
    let frame = Frame::filled(2, 2, PixelFormat::L8, &[100]).unwrap();
    let mut data = frame.data().to_vec();
    blend_pixel(&mut data, &frame, -1, 0, 0.0, 1.0);
    blend_pixel(&mut data, &frame, 2, 0, 0.0, 1.0);
    assert_eq!(data, frame.data());
    blend_pixel(&mut data, &frame, 1, 1, 0.0, 0.5);
    assert_eq!(data[3], 50);
}
