// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg), WebP (libwebp), PNG (image + oxipng),
// BMP/TIFF (image crate). Quality applies to JPEG and WebP only.

use crate::error::CodecError;
use crate::ops::OutputFormat;
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::Cursor;

use crate::engine::MAX_DIMENSION;

type EncoderResult<T> = std::result::Result<T, CodecError>;

/// Clamp a caller-supplied quality to the meaningful 1-100 range.
pub(crate) fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

/// Encode to any supported output format with the given quality.
/// Quality is ignored for lossless formats (PNG, BMP, TIFF).
pub fn encode_to_format(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> EncoderResult<Vec<u8>> {
    match format {
        OutputFormat::Jpeg => encode_jpeg(img, quality),
        OutputFormat::WebP => encode_webp(img, quality),
        OutputFormat::Png => encode_png(img),
        OutputFormat::Bmp => encode_with_image_crate(img, ImageFormat::Bmp, "bmp"),
        OutputFormat::Tiff => encode_with_image_crate(img, ImageFormat::Tiff, "tiff"),
    }
}

/// Encode to JPEG using mozjpeg with optimized coding enabled.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    let quality = clamp_quality(quality);

    // Zero-copy when already RGB8; JPEG has no alpha, so everything else flattens
    let rgb: Cow<'_, image::RgbImage> = match img {
        DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
        _ => Cow::Owned(img.to_rgb8()),
    };
    let (w, h) = rgb.dimensions();
    let pixels: &[u8] = rgb.as_raw();

    if w == 0 || h == 0 {
        return Err(CodecError::encode_failed(
            "jpeg",
            "invalid image dimensions: width or height is zero",
        ));
    }
    if w > MAX_DIMENSION || h > MAX_DIMENSION {
        return Err(CodecError::dimension_exceeds_limit(w.max(h), MAX_DIMENSION));
    }

    let expected_len = (w as usize) * (h as usize) * 3;
    if pixels.len() != expected_len {
        return Err(CodecError::encode_failed("jpeg", "corrupted pixel buffer"));
    }

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(w as usize, h as usize);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_quality(quality as f32);

    // Encoder-level optimization: optimized entropy coding and scan ordering
    comp.set_optimize_coding(true);
    comp.set_optimize_scans(true);
    comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);

    let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
    let mut output = Vec::with_capacity(estimated_size);

    let mut writer = comp.start_compress(&mut output).map_err(|e| {
        CodecError::encode_failed("jpeg", format!("mozjpeg: failed to start compress: {e:?}"))
    })?;

    let stride = w as usize * 3;
    for row in pixels.chunks(stride) {
        writer.write_scanlines(row).map_err(|e| {
            CodecError::encode_failed("jpeg", format!("mozjpeg: failed to write scanlines: {e:?}"))
        })?;
    }

    writer.finish().map_err(|e| {
        CodecError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
    })?;

    Ok(output)
}

/// Encode to WebP at maximum compression effort (method 6).
/// Alpha is preserved for RGBA sources.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    let quality = clamp_quality(quality);

    let has_alpha = img.color().has_alpha();
    let encoder_input: Cow<'_, DynamicImage>;
    let encoder = if has_alpha {
        encoder_input = match img {
            DynamicImage::ImageRgba8(_) => Cow::Borrowed(img),
            _ => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
        };
        let rgba = encoder_input.as_rgba8().ok_or_else(|| {
            CodecError::encode_failed("webp", "failed to obtain RGBA pixel buffer")
        })?;
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
    } else {
        encoder_input = match img {
            DynamicImage::ImageRgb8(_) => Cow::Borrowed(img),
            _ => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        };
        let rgb = encoder_input.as_rgb8().ok_or_else(|| {
            CodecError::encode_failed("webp", "failed to obtain RGB pixel buffer")
        })?;
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
    };

    let mut config = webp::WebPConfig::new()
        .map_err(|_| CodecError::encode_failed("webp", "failed to create WebPConfig"))?;
    config.quality = quality as f32;
    // Slowest, best-compressing method; the session trades speed for bytes here
    config.method = 6;

    let mem = encoder
        .encode_advanced(&config)
        .map_err(|e| CodecError::encode_failed("webp", format!("WebP encode failed: {e:?}")))?;

    Ok(mem.to_vec())
}

/// Encode to PNG using the image crate, then recompress losslessly with oxipng.
pub fn encode_png(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CodecError::encode_failed("png", format!("PNG encode failed: {e}")))?;

    let options = oxipng::Options::from_preset(2);
    let optimized = oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
        CodecError::encode_failed("png", format!("oxipng optimization failed: {e}"))
    })?;

    Ok(optimized)
}

/// Plain image-crate encode for formats without quality-dependent options.
fn encode_with_image_crate(
    img: &DynamicImage,
    format: ImageFormat,
    name: &'static str,
) -> EncoderResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| CodecError::encode_failed(name, format!("encode failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{RgbImage, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn create_test_image_rgba(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        }))
    }

    #[test]
    fn test_encode_jpeg_produces_valid_jpeg() {
        let img = create_test_image(100, 100);
        let result = encode_jpeg(&img, 80).unwrap();
        assert_eq!(&result[0..2], &[0xFF, 0xD8]);
        assert_eq!(&result[result.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let img = create_test_image(200, 200);
        let high_quality = encode_jpeg(&img, 95).unwrap();
        let low_quality = encode_jpeg(&img, 30).unwrap();
        assert!(low_quality.len() < high_quality.len());
    }

    #[test]
    fn test_encode_jpeg_clamps_quality() {
        let img = create_test_image(16, 16);
        // quality 0 and 255 must not panic or error
        assert!(encode_jpeg(&img, 0).is_ok());
        assert!(encode_jpeg(&img, 255).is_ok());
    }

    #[test]
    fn test_encode_png_produces_valid_png() {
        let img = create_test_image(100, 100);
        let result = encode_png(&img).unwrap();
        assert_eq!(
            &result[0..8],
            &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
        );
    }

    #[test]
    fn test_encode_webp_produces_valid_webp() {
        let img = create_test_image(100, 100);
        let result = encode_webp(&img, 80).unwrap();
        assert_eq!(&result[0..4], b"RIFF");
        assert_eq!(&result[8..12], b"WEBP");
    }

    #[test]
    fn test_encode_webp_preserves_alpha() {
        let img = create_test_image_rgba(32, 32);
        let bytes = encode_webp(&img, 90).unwrap();
        let decoded = webp::Decoder::new(&bytes).decode().unwrap().to_image();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_encode_to_format_dispatch() {
        let img = create_test_image(20, 20);

        let bmp = encode_to_format(&img, OutputFormat::Bmp, 85).unwrap();
        assert_eq!(&bmp[0..2], b"BM");

        let tiff = encode_to_format(&img, OutputFormat::Tiff, 85).unwrap();
        // Little-endian or big-endian TIFF header
        assert!(&tiff[0..2] == b"II" || &tiff[0..2] == b"MM");

        let png = encode_to_format(&img, OutputFormat::Png, 85).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_encode_rgba_to_jpeg_flattens() {
        let img = create_test_image_rgba(50, 50);
        let bytes = encode_jpeg(&img, 85).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }
}
