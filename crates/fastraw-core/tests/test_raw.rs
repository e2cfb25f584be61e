#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use fastraw_core::error::ViewerError;
use fastraw_core::pipeline::{run_stages, PipelineEvent, PipelineStage, PreviewSource};
use fastraw_core::raw::debayer::{debayer, superpixel, Cfa, DebayerMethod};
use fastraw_core::raw::thumbnail::largest_embedded_jpeg;
use fastraw_core::raw::{
    bt709_oetf, truncate_to_8bit, FastDecodeOptions, RawBitmap, RawDecoder, RawloaderDecoder,
    Thumbnail,
};
use fastraw_core::session::Generation;

use common::{jpeg_bytes, solid_rgb16, RecordingSink};

// ---------------------------------------------------------------------------
// Helper: synthetic mosaics
// ---------------------------------------------------------------------------

/// Flat colour field sampled through `cfa`.
fn mosaic(cfa: &Cfa, h: usize, w: usize, rgb: [f32; 3]) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(row, col)| rgb[cfa.color_at(row, col) as usize])
}

fn xtrans() -> Cfa {
    const PATTERN: [&str; 6] = ["GGRGGB", "GGBGGR", "BRGRBG", "GGBGGR", "GGRGGB", "RBGBRG"];
    Cfa::from_fn(6, 6, |r, c| match PATTERN[r].as_bytes()[c] {
        b'R' => 0,
        b'B' => 2,
        _ => 1,
    })
}

// ---------------------------------------------------------------------------
// CFA
// ---------------------------------------------------------------------------

#[test]
fn test_cfa_parsing() {
    assert!(Cfa::bayer("RGGB").expect("rggb").is_bayer());
    assert!(Cfa::bayer("bggr").is_some());
    for name in ["GRBG", "GBRG"] {
        assert!(Cfa::bayer(name).is_some(), "{name}");
    }
    // Two greens in one column or one row are not a Bayer cell.
    for name in ["RGBG", "GRGB", "GGRB", "RBGG"] {
        assert!(Cfa::bayer(name).is_none(), "{name}");
    }
    assert!(Cfa::bayer("RRGB").is_none());
    assert!(Cfa::bayer("RGB").is_none());
    assert!(!xtrans().is_bayer());

    // A 6x6 tile that repeats a Bayer cell is still Bayer.
    let tiled = Cfa::from_fn(6, 6, |r, c| [[0, 1], [1, 2]][r % 2][c % 2]);
    assert!(tiled.is_bayer());
    let striped = Cfa::from_fn(6, 6, |r, c| [[0, 1], [2, 1]][r % 2][c % 2]);
    assert!(!striped.is_bayer());
}

// ---------------------------------------------------------------------------
// Demosaic
// ---------------------------------------------------------------------------

#[test]
fn test_flat_field_is_reconstructed() {
    let rgb = [0.8, 0.5, 0.2];
    for name in ["RGGB", "BGGR", "GRBG", "GBRG"] {
        let cfa = Cfa::bayer(name).expect("bayer");
        let raw = mosaic(&cfa, 16, 16, rgb);
        for method in [DebayerMethod::Bilinear, DebayerMethod::MalvarHeCutler] {
            let planes = debayer(&raw, &cfa, method);
            assert_eq!(planes.dim(), (16, 16));
            for row in 2..14 {
                for col in 2..14 {
                    assert_abs_diff_eq!(planes.red[[row, col]], rgb[0], epsilon = 1e-4);
                    assert_abs_diff_eq!(planes.green[[row, col]], rgb[1], epsilon = 1e-4);
                    assert_abs_diff_eq!(planes.blue[[row, col]], rgb[2], epsilon = 1e-4);
                }
            }
        }
    }
}

#[test]
fn test_non_bayer_cfa_uses_neighbourhood() {
    // Greens stacked in one column pass the 1R/2G/1B count but are not Bayer.
    let striped = Cfa::from_fn(2, 2, |r, c| [[0, 1], [2, 1]][r][c]);
    let rgb = [0.3, 0.6, 0.9];
    for cfa in [xtrans(), striped] {
        for method in [DebayerMethod::Bilinear, DebayerMethod::MalvarHeCutler] {
            let planes = debayer(&mosaic(&cfa, 18, 18, rgb), &cfa, method);
            for row in 0..18 {
                for col in 0..18 {
                    assert_abs_diff_eq!(planes.red[[row, col]], rgb[0], epsilon = 1e-5);
                    assert_abs_diff_eq!(planes.green[[row, col]], rgb[1], epsilon = 1e-5);
                    assert_abs_diff_eq!(planes.blue[[row, col]], rgb[2], epsilon = 1e-5);
                }
            }
        }
    }
}

#[test]
fn test_superpixel_halves_size() {
    let cfa = Cfa::bayer("RGGB").expect("bayer");
    let planes = superpixel(&mosaic(&cfa, 10, 14, [0.1, 0.4, 0.7]), &cfa);
    assert_eq!(planes.dim(), (5, 7));
    assert!(planes.red.iter().all(|&v| (v - 0.1).abs() < 1e-6));
    assert!(planes.green.iter().all(|&v| (v - 0.4).abs() < 1e-6));
    assert!(planes.blue.iter().all(|&v| (v - 0.7).abs() < 1e-6));

    let xt = xtrans();
    let planes = superpixel(&mosaic(&xt, 12, 12, [0.1, 0.4, 0.7]), &xt);
    assert_eq!(planes.dim(), (6, 6));
    assert!(planes.blue.iter().all(|&v| (v - 0.7).abs() < 1e-6));
}

#[test]
fn test_superpixel_tiny_input() {
    let cfa = Cfa::bayer("RGGB").expect("bayer");
    let planes = superpixel(&Array2::from_elem((1, 1), 0.5), &cfa);
    assert_eq!(planes.dim(), (1, 1));
    assert_abs_diff_eq!(planes.red[[0, 0]], 0.5);
}

// ---------------------------------------------------------------------------
// Tone and depth
// ---------------------------------------------------------------------------

#[test]
fn test_bt709_curve() {
    assert_abs_diff_eq!(bt709_oetf(0.0), 0.0);
    assert_abs_diff_eq!(bt709_oetf(0.01), 0.045, epsilon = 1e-6);
    assert_abs_diff_eq!(bt709_oetf(1.0), 1.0, epsilon = 1e-5);
    // Continuous at the end of the linear toe.
    assert_abs_diff_eq!(bt709_oetf(0.018), 0.081, epsilon = 1e-3);
}

#[test]
fn test_16_to_8_bit_truncates() {
    let img = solid_rgb16(2, 1, 0x01FF);
    let out = truncate_to_8bit(&img).expect("convert");
    // 511 / 256 = 1, not 2.
    assert!(out.as_raw().iter().all(|&v| v == 1));

    let bright = truncate_to_8bit(&solid_rgb16(1, 1, u16::MAX)).expect("convert");
    assert_eq!(bright.as_raw().as_slice(), &[255u8, 255, 255]);

    let display = RawBitmap::Rgb16(solid_rgb16(3, 2, 0x00FF))
        .into_display()
        .expect("display");
    assert_eq!(display.dimensions(), (3, 2));
    assert!(display.as_raw().iter().all(|&v| v == 0));
}

// ---------------------------------------------------------------------------
// Container access
// ---------------------------------------------------------------------------

#[test]
fn test_finds_real_jpeg_inside_container() {
    let jpeg = jpeg_bytes(32, 24, [200, 10, 10]);
    let mut file = b"II*\0 fake tiff header".to_vec();
    file.extend_from_slice(&jpeg);
    file.extend_from_slice(&[0u8; 64]);

    let found = largest_embedded_jpeg(&file).expect("jpeg found");
    assert_eq!(found, jpeg.as_slice());
    let img = image::load_from_memory(found).expect("decodes");
    assert_eq!((img.width(), img.height()), (32, 24));
}

/// A lossless-JPEG (SOF3) stream like the sensor strip in CR2 and DNG files.
fn lossless_jpeg_stream(payload_len: usize) -> Vec<u8> {
    let mut buf = vec![0xFF, 0xD8];
    buf.extend_from_slice(&[0xFF, 0xC3, 0x00, 0x0B, 14, 0, 64, 0, 64, 1, 1, 0x11, 0]);
    buf.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x05, 0x00, 0x00, 0x00]);
    buf.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 1, 1, 0x00, 1, 0, 0]);
    buf.extend((0..payload_len).map(|i| (i % 0xFE) as u8));
    buf.extend_from_slice(&[0xFF, 0xD9]);
    buf
}

#[test]
fn test_lossless_sensor_stream_is_not_a_preview() {
    let preview = jpeg_bytes(16, 12, [20, 120, 220]);
    let sensor = lossless_jpeg_stream(8192);
    assert!(sensor.len() > preview.len());

    let mut file = b"II*\0 fake tiff header".to_vec();
    file.extend_from_slice(&preview);
    file.extend_from_slice(&sensor);
    assert_eq!(largest_embedded_jpeg(&file), Some(preview.as_slice()));

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("IMG_0001.CR2");
    std::fs::write(&path, &file).expect("write");

    let decoder = RawloaderDecoder::new();
    match decoder.extract_thumbnail(&path).expect("thumbnail") {
        Some(Thumbnail::Jpeg(bytes)) => assert_eq!(bytes, preview),
        other => panic!("expected the embedded preview, got {other:?}"),
    }

    // The preview comes from the thumbnail; only the full decode fails.
    let sink = RecordingSink::default();
    run_stages(&decoder, &path, Generation::default().next(), &sink);
    let events = sink.events();
    match events.first() {
        Some(PipelineEvent::Preview { image, source, .. }) => {
            assert_eq!(*source, PreviewSource::EmbeddedThumbnail);
            assert_eq!(image.dimensions(), (16, 12));
        }
        other => panic!("expected a preview first, got {other:?}"),
    }
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::Failed {
            stage: PipelineStage::Full,
            ..
        })
    ));
}

#[test]
fn test_rawloader_missing_file() {
    let decoder = RawloaderDecoder::new();
    let path = std::path::Path::new("/no/such/file.nef");
    assert!(matches!(
        decoder.extract_thumbnail(path),
        Err(ViewerError::FileNotFound(_))
    ));
    assert!(matches!(
        decoder.decode_fast(path, &FastDecodeOptions::default()),
        Err(ViewerError::FileNotFound(_))
    ));
}

#[test]
fn test_rawloader_rejects_garbage() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("garbage.cr2");
    std::fs::write(&path, vec![0x42u8; 4096]).expect("write");

    let decoder = RawloaderDecoder::new();
    assert!(matches!(decoder.extract_thumbnail(&path), Ok(None)));
    match decoder.decode_fast(&path, &FastDecodeOptions::default()) {
        Err(ViewerError::Decode(message)) => assert!(message.starts_with("Failed to decode RAW")),
        other => panic!("expected a decode error, got {other:?}"),
    }
}
