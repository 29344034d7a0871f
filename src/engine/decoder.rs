// src/engine/decoder.rs
//
// Decoder operations: JPEG (mozjpeg), PNG (zune-png), WebP (libwebp),
// BMP/TIFF and everything else via the image crate.

use crate::error::CodecError;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use mozjpeg::Decompress;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

type DecoderResult<T> = std::result::Result<T, CodecError>;

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo).
/// Significantly faster than the image crate's pure Rust decoder.
pub fn decode_jpeg_mozjpeg(data: &[u8]) -> DecoderResult<DynamicImage> {
    if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
        return Err(CodecError::decode_failed("mozjpeg: missing JPEG EOI marker"));
    }

    let decompress = Decompress::new_mem(data).map_err(|e| {
        CodecError::decode_failed(format!("mozjpeg decompress init failed: {e:?}"))
    })?;

    let mut decompress = decompress
        .rgb()
        .map_err(|e| CodecError::decode_failed(format!("mozjpeg rgb conversion failed: {e:?}")))?;

    let width = decompress.width();
    let height = decompress.height();
    if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
        return Err(CodecError::dimension_exceeds_limit(
            width.max(height) as u32,
            MAX_DIMENSION,
        ));
    }
    let width_u32 = width as u32;
    let height_u32 = height as u32;
    check_dimensions(width_u32, height_u32)?;

    let pixels: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
        CodecError::decode_failed(format!("mozjpeg: failed to read scanlines: {e:?}"))
    })?;
    let flat_pixels: Vec<u8> = pixels.into_iter().flatten().collect();

    let rgb_image = RgbImage::from_raw(width_u32, height_u32, flat_pixels).ok_or_else(|| {
        CodecError::decode_failed("mozjpeg: failed to create image from raw data")
    })?;

    Ok(DynamicImage::ImageRgb8(rgb_image))
}

/// Decode PNG using zune-png. 16-bit input is downsampled to 8-bit.
pub fn decode_png_zune(data: &[u8]) -> DecoderResult<DynamicImage> {
    let options = DecoderOptions::default().png_set_strip_to_8bit(true);
    let mut decoder = PngDecoder::new_with_options(data, options);
    let pixels = decoder
        .decode()
        .map_err(|e| CodecError::decode_failed(format!("png: decode failed: {e}")))?;

    let info = decoder
        .get_info()
        .ok_or_else(|| CodecError::decode_failed("png: missing header info"))?;

    let width = info.width as u32;
    let height = info.height as u32;
    check_dimensions(width, height)?;

    let buf = match pixels {
        zune_core::result::DecodingResult::U8(v) => v,
        _ => {
            return Err(CodecError::decode_failed(
                "png: unexpected non-U8 pixel buffer",
            ))
        }
    };

    let colorspace = decoder
        .get_colorspace()
        .ok_or_else(|| CodecError::decode_failed("png: missing colorspace"))?;

    // Palette PNGs arrive here already expanded to RGB/RGBA by the decoder.
    let img = match colorspace {
        ColorSpace::RGB => RgbImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| CodecError::decode_failed("png: failed to build RGB image"))?,
        ColorSpace::RGBA | ColorSpace::YCbCr | ColorSpace::BGRA | ColorSpace::ARGB => {
            RgbaImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| CodecError::decode_failed("png: failed to build RGBA image"))?
        }
        ColorSpace::Luma => GrayImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| CodecError::decode_failed("png: failed to build Luma image"))?,
        ColorSpace::LumaA => GrayAlphaImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageLumaA8)
            .ok_or_else(|| CodecError::decode_failed("png: failed to build LumaA image"))?,
        other => {
            return Err(CodecError::decode_failed(format!(
                "png: unsupported colorspace {:?}",
                other
            )))
        }
    };

    Ok(img)
}

/// Decode WebP using libwebp. Falls back to the image crate for animated WebP.
pub fn decode_webp_libwebp(data: &[u8]) -> DecoderResult<DynamicImage> {
    // Parse header first to avoid allocating huge buffers on malformed files
    let features = webp::BitstreamFeatures::new(data)
        .ok_or_else(|| CodecError::decode_failed("webp: failed to read bitstream features"))?;

    if features.has_animation() {
        // The simple libwebp decoder does not support animation
        return image::load_from_memory(data)
            .map_err(|e| CodecError::decode_failed(format!("webp (animated) decode failed: {e}")));
    }

    check_dimensions(features.width(), features.height())?;

    let decoded = webp::Decoder::new(data)
        .decode()
        .ok_or_else(|| CodecError::decode_failed("webp: decode failed"))?;

    check_dimensions(decoded.width(), decoded.height())?;

    Ok(decoded.to_image())
}

/// Decode BMP, TIFF and other containers using the image crate.
pub fn decode_with_image_crate(data: &[u8]) -> DecoderResult<DynamicImage> {
    let img = image::load_from_memory(data)
        .map_err(|e| CodecError::decode_failed(format!("decode failed: {e}")))?;
    check_dimensions(img.width(), img.height())?;
    Ok(img)
}

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint:
/// - Detect format once (magic bytes)
/// - Route JPEG/PNG/WebP to their specialized codecs, others to the image crate
/// - Return decoded image and detected format
pub fn decode_image(bytes: &[u8]) -> DecoderResult<(DynamicImage, Option<ImageFormat>)> {
    let detected = detect_format(bytes);
    let img = match detected {
        Some(ImageFormat::Jpeg) => decode_jpeg_mozjpeg(bytes)?,
        Some(ImageFormat::Png) => decode_png_zune(bytes)?,
        Some(ImageFormat::WebP) => decode_webp_libwebp(bytes)?,
        _ => decode_with_image_crate(bytes)?,
    };
    Ok((img, detected))
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CodecError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(CodecError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}
