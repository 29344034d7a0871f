// tests/edge_cases.rs
//
// Boundary and failure-path tests: tiny images, bad inputs, format
// switches, and resize extremes.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imgcast::error::{ConvertError, LoadError, SaveError};
use imgcast::{ConversionEngine, ConversionRequest, OutputFormat};
use std::io::Cursor;
use std::path::PathBuf;

fn write_image(
    dir: &tempfile::TempDir,
    name: &str,
    img: &DynamicImage,
    format: ImageFormat,
) -> PathBuf {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, buf).unwrap();
    path
}

fn rgb_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

#[test]
fn test_load_missing_file() {
    let mut engine = ConversionEngine::new();
    let err = engine.load("/no/such/file.png").unwrap_err();
    assert!(matches!(err, LoadError::Unreadable { .. }));
    assert!(engine.metadata().is_none());
}

#[test]
fn test_load_undecodable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_an_image.png");
    std::fs::write(&path, b"this is definitely not image data").unwrap();

    let mut engine = ConversionEngine::new();
    let err = engine.load(&path).unwrap_err();
    assert!(matches!(err, LoadError::Undecodable { .. }));
}

#[test]
fn test_failed_load_keeps_previous_image() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_image(&dir, "good.png", &rgb_image(10, 10), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&good).unwrap();
    assert!(engine.load("/no/such/file.png").is_err());
    // The previous source survives a failed load attempt
    assert!(engine.metadata().is_some());
}

#[test]
fn test_one_by_one_pixel_to_every_format() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "dot.png", &rgb_image(1, 1), ImageFormat::Png);

    for format in [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::WebP,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
    ] {
        let mut engine = ConversionEngine::new();
        engine.load(&source).unwrap();
        let report = engine.convert(&ConversionRequest::new(format)).unwrap();
        assert_eq!((report.width, report.height), (1, 1), "{format}");
    }
}

#[test]
fn test_target_size_equal_to_source_skips_resize() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "source.png", &rgb_image(40, 30), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let report = engine
        .convert(&ConversionRequest::new(OutputFormat::Png).target_size(40, 30))
        .unwrap();
    assert_eq!((report.width, report.height), (40, 30));
}

#[test]
fn test_aspect_preserving_resize_of_4_3_source_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "source.png", &rgb_image(400, 300), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let report = engine
        .convert(
            &ConversionRequest::new(OutputFormat::Jpeg)
                .target_size(80, 60)
                .preserve_aspect(true),
        )
        .unwrap();
    assert_eq!((report.width, report.height), (80, 60));
}

#[test]
fn test_aspect_preserving_resize_shrinks_to_fit() {
    let dir = tempfile::tempdir().unwrap();
    // 2:1 source into a square box: width binds
    let source = write_image(&dir, "wide.png", &rgb_image(200, 100), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let report = engine
        .convert(
            &ConversionRequest::new(OutputFormat::Png)
                .target_size(50, 50)
                .preserve_aspect(true),
        )
        .unwrap();
    assert_eq!((report.width, report.height), (50, 25));
}

#[test]
fn test_forced_resize_distorts_to_exact_target() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "square.png", &rgb_image(100, 100), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let report = engine
        .convert(
            &ConversionRequest::new(OutputFormat::Png)
                .target_size(60, 20)
                .preserve_aspect(false),
        )
        .unwrap();
    assert_eq!((report.width, report.height), (60, 20));
}

#[test]
fn test_aspect_preserving_never_upscales() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "small.png", &rgb_image(30, 20), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let report = engine
        .convert(
            &ConversionRequest::new(OutputFormat::Png)
                .target_size(300, 300)
                .preserve_aspect(true),
        )
        .unwrap();
    assert_eq!((report.width, report.height), (30, 20));
}

#[test]
fn test_grayscale_source_metadata_and_jpeg_convert() {
    let dir = tempfile::tempdir().unwrap();
    let gray = DynamicImage::ImageLuma8(GrayImage::from_fn(20, 20, |x, _| Luma([(x * 12) as u8])));
    let source = write_image(&dir, "gray.png", &gray, ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    let meta = engine.load(&source).unwrap();
    assert_eq!(meta.color_mode, "Grayscale");

    let report = engine
        .convert(&ConversionRequest::new(OutputFormat::Jpeg))
        .unwrap();
    assert!(!report.alpha_dropped);
}

#[test]
fn test_zero_width_target_is_rejected_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "source.png", &rgb_image(10, 10), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let err = engine
        .convert(&ConversionRequest::new(OutputFormat::Png).target_size(10, 0))
        .unwrap_err();
    assert!(matches!(err, ConvertError::InvalidDimensions { .. }));
    // The failed convert must not leave a processed image behind
    assert!(engine.processed().is_none());
}

#[test]
fn test_save_to_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "source.png", &rgb_image(10, 10), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    engine
        .convert(&ConversionRequest::new(OutputFormat::Png))
        .unwrap();

    let err = engine
        .save(dir.path().join("missing_dir/out.png"), None, None)
        .unwrap_err();
    assert!(matches!(err, SaveError::WriteFailed { .. }));
}

#[test]
fn test_quality_is_clamped_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "source.png", &rgb_image(16, 16), ImageFormat::Png);

    let mut engine = ConversionEngine::new();
    engine.load(&source).unwrap();
    let report = engine
        .convert(&ConversionRequest::new(OutputFormat::Jpeg).quality(0))
        .unwrap();
    assert_eq!(report.quality, 1);
    assert_eq!(engine.current_quality(), 1);

    let report = engine
        .convert(&ConversionRequest::new(OutputFormat::Jpeg).quality(200))
        .unwrap();
    assert_eq!(report.quality, 100);
}

#[test]
fn test_webp_source_loads_and_converts() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_image(&dir, "source.webp", &rgb_image(25, 25), ImageFormat::WebP);

    let mut engine = ConversionEngine::new();
    let meta = engine.load(&source).unwrap();
    assert_eq!(meta.format.as_deref(), Some("WEBP"));

    let report = engine
        .convert(&ConversionRequest::new(OutputFormat::Bmp))
        .unwrap();
    assert_eq!((report.width, report.height), (25, 25));
}
