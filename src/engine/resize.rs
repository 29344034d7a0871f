// src/engine/resize.rs
//
// Lanczos3 resizing via fast_image_resize, plus the shrink-to-fit
// dimension calculation used by convert() and preview thumbnails.

use crate::error::CodecError;
use fast_image_resize as fir;
use fir::{ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{DynamicImage, RgbImage, RgbaImage};

type ResizeResult<T> = std::result::Result<T, CodecError>;

/// Calculate shrink-to-fit dimensions within a bounding box.
///
/// Preserves aspect ratio and never upscales: an image already inside the
/// box keeps its size. Matches thumbnail semantics (both dimensions fit,
/// at least one touches the box edge when shrinking).
pub fn calc_fit_dimensions(
    orig_w: u32,
    orig_h: u32,
    box_w: u32,
    box_h: u32,
) -> (u32, u32) {
    if orig_w == 0 || orig_h == 0 || box_w == 0 || box_h == 0 {
        return (orig_w, orig_h);
    }

    let scale_w = box_w as f64 / orig_w as f64;
    let scale_h = box_h as f64 / orig_h as f64;
    let scale = scale_w.min(scale_h);
    if scale >= 1.0 {
        // Already fits; shrink-to-fit never enlarges
        return (orig_w, orig_h);
    }

    let fit_w = ((orig_w as f64 * scale).round() as u32).max(1);
    let fit_h = ((orig_h as f64 * scale).round() as u32).max(1);
    (fit_w.min(box_w), fit_h.min(box_h))
}

fn lanczos_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// High-quality resize taking ownership of the source image.
/// Zero-copy for RGB8/RGBA8; other layouts are converted to RGBA first.
pub fn fast_resize_owned(
    img: DynamicImage,
    dst_width: u32,
    dst_height: u32,
) -> ResizeResult<DynamicImage> {
    let src_width = img.width();
    let src_height = img.height();

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(CodecError::resize_failed(
            (src_width, src_height),
            (dst_width, dst_height),
            "invalid dimensions for resize",
        ));
    }

    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other => {
            let rgba = other.to_rgba8();
            (PixelType::U8x4, rgba.into_raw())
        }
    };

    resize_pixels(
        src_width, src_height, src_pixels, pixel_type, dst_width, dst_height,
    )
    .map_err(|reason| {
        CodecError::resize_failed((src_width, src_height), (dst_width, dst_height), reason)
    })
}

fn resize_pixels(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let pixel_count = (src_width as usize)
        .checked_mul(src_height as usize)
        .ok_or_else(|| "image dimensions overflow during resize".to_string())?;
    let required_bytes = pixel_count
        .checked_mul(pixel_type.size())
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "source buffer too small: expected {required_bytes} bytes, got {}",
            src_pixels.len()
        ));
    }

    let src_image = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => src_image,
        Err(ImageBufferError::InvalidBufferAlignment) => {
            // Vec<u8> alignment can miss fir's requirement; copy into an owned image
            let mut aligned = fir::images::Image::new(src_width, src_height, pixel_type);
            aligned
                .buffer_mut()
                .copy_from_slice(&src_pixels[..required_bytes]);
            return resize_with_source(aligned, pixel_type, dst_width, dst_height);
        }
        Err(other) => return Err(format!("fir source image error: {other:?}")),
    };

    resize_with_source(src_image, pixel_type, dst_width, dst_height)
}

fn resize_with_source(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    // Alpha must be premultiplied before convolution and divided back after,
    // or edge pixels bleed background color
    let needs_premultiply = pixel_type == PixelType::U8x4;
    let mul_div = MulDiv::default();

    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &lanczos_options())
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => RgbImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "failed to create rgb image from resized data".to_string()),
        PixelType::U8x4 => RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| "failed to create rgba image from resized data".to_string()),
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_calc_fit_shrinks_wide_image_to_width() {
        assert_eq!(calc_fit_dimensions(4000, 3000, 800, 600), (800, 600));
        assert_eq!(calc_fit_dimensions(1000, 500, 300, 300), (300, 150));
    }

    #[test]
    fn test_calc_fit_shrinks_tall_image_to_height() {
        assert_eq!(calc_fit_dimensions(500, 1000, 300, 300), (150, 300));
    }

    #[test]
    fn test_calc_fit_never_upscales() {
        assert_eq!(calc_fit_dimensions(100, 80, 300, 300), (100, 80));
        assert_eq!(calc_fit_dimensions(1, 1, 300, 300), (1, 1));
    }

    #[test]
    fn test_calc_fit_degenerate_box_is_identity() {
        assert_eq!(calc_fit_dimensions(100, 80, 0, 300), (100, 80));
        assert_eq!(calc_fit_dimensions(100, 80, 300, 0), (100, 80));
    }

    #[test]
    fn test_resize_rgb_exact_dimensions() {
        let img = create_test_image(64, 48);
        let resized = fast_resize_owned(img, 32, 24).unwrap();
        assert_eq!(resized.dimensions(), (32, 24));
        assert!(matches!(resized, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_resize_rgba_preserves_layout() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            40,
            40,
            image::Rgba([10, 20, 30, 128]),
        ));
        let resized = fast_resize_owned(img, 20, 20).unwrap();
        assert_eq!(resized.dimensions(), (20, 20));
        assert!(matches!(resized, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_resize_grayscale_goes_through_rgba() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(30, 30, image::Luma([99])));
        let resized = fast_resize_owned(img, 10, 10).unwrap();
        assert_eq!(resized.dimensions(), (10, 10));
    }

    #[test]
    fn test_resize_rejects_zero_dimensions() {
        let img = create_test_image(10, 10);
        let err = fast_resize_owned(img, 0, 5).unwrap_err();
        assert!(matches!(err, CodecError::ResizeFailed { .. }));
    }

    #[test]
    fn test_resize_can_distort_aspect() {
        let img = create_test_image(64, 64);
        let resized = fast_resize_owned(img, 64, 16).unwrap();
        assert_eq!(resized.dimensions(), (64, 16));
    }
}
