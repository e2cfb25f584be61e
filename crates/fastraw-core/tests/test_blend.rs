#[allow(dead_code)]
mod common;

use fastraw_core::blend::blend;
use fastraw_core::error::ViewerError;
use fastraw_core::frame::DecodedImage;

use common::{gradient_rgb, solid_rgb, solid_rgba};

#[test]
fn test_blend_endpoints() {
    let from = solid_rgb(8, 8, [10, 20, 30]);
    let to = DecodedImage::from_rgb8(gradient_rgb(8, 8));

    assert!(blend(&from, &to, 0.0).expect("blend").same_pixels(&from));
    assert!(blend(&from, &to, 1.0).expect("blend").same_pixels(&to));
}

#[test]
fn test_blend_midpoint_rounds() {
    let from = solid_rgb(4, 4, [0, 0, 255]);
    let to = solid_rgb(4, 4, [255, 1, 0]);
    let out = blend(&from, &to, 0.5).expect("blend");
    // 127.5 and 0.5 round away from zero.
    assert_eq!(&out.as_raw()[..3], &[128, 1, 128]);
}

#[test]
fn test_blend_clamps_alpha() {
    let from = solid_rgb(2, 2, [0, 0, 0]);
    let to = solid_rgb(2, 2, [100, 100, 100]);
    assert!(blend(&from, &to, 3.0).expect("blend").same_pixels(&to));
    assert!(blend(&from, &to, -1.0).expect("blend").same_pixels(&from));
}

#[test]
fn test_blend_mixed_layouts_become_rgba() {
    let from = solid_rgb(3, 3, [0, 0, 0]);
    let to = solid_rgba(3, 3, [200, 200, 200, 0]);
    let out = blend(&from, &to, 0.25).expect("blend");
    assert!(out.has_alpha());
    assert_eq!(&out.as_raw()[..4], &[50, 50, 50, 191]);
}

#[test]
fn test_blend_large_image_matches_small_path() {
    // Big enough to take the parallel path.
    let from = DecodedImage::from_rgb8(gradient_rgb(512, 256));
    let to = solid_rgb(512, 256, [255, 255, 255]);
    let out = blend(&from, &to, 0.3).expect("blend");
    let expected: Vec<u8> = from
        .as_raw()
        .iter()
        .map(|&x| (x as f32 + (255.0 - x as f32) * 0.3).round() as u8)
        .collect();
    assert_eq!(out.as_raw(), expected.as_slice());
}

#[test]
fn test_blend_rejects_mismatched_sizes() {
    let from = solid_rgb(4, 4, [0, 0, 0]);
    let to = solid_rgb(4, 5, [0, 0, 0]);
    match blend(&from, &to, 0.5) {
        Err(ViewerError::BlendDimensionMismatch { left, right }) => {
            assert_eq!(left, (4, 4));
            assert_eq!(right, (4, 5));
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}
