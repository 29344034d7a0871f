// src/engine/session.rs
//
// ConversionEngine: the single-session state machine with two image slots.
//
// `original` is replaced by load(); `processed` is replaced by convert()
// and cleared by load(). Every processed image has been through a real
// encode + decode-back round trip, so previews and size estimates show
// the actual compression artifacts that save() will put on disk.

use crate::engine::decoder::decode_image;
use crate::engine::encoder::{clamp_quality, encode_to_format};
use crate::engine::resize::{calc_fit_dimensions, fast_resize_owned};
use crate::error::{ConvertError, LoadError, SaveError};
use crate::ops::{ConversionRequest, OutputFormat};
use image::{ColorType, DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Default bounding box for preview thumbnails.
pub const DEFAULT_PREVIEW_BOX: (u32, u32) = (300, 300);

/// Decoded source image plus its origin tag (path and on-disk byte size).
#[derive(Debug, Clone)]
struct LoadedImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
    path: PathBuf,
    byte_len: u64,
}

/// Read-only snapshot of the loaded source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Detected container format (e.g. "JPEG"), None if sniffing failed.
    pub format: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Color mode name: "RGB", "RGBA", "Grayscale", ...
    pub color_mode: String,
    /// On-disk size as "{kb:.1} KB".
    pub file_size: String,
    /// Basename of the source path.
    pub filename: String,
}

/// Result of a successful convert() call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub format: OutputFormat,
    /// Effective (clamped) quality the encoder ran with.
    pub quality: u8,
    /// Dimensions of the processed image after any resize.
    pub width: u32,
    pub height: u32,
    /// True when flattening to JPEG discarded an alpha channel.
    /// Callers must surface this: transparency is lost, not composited.
    pub alpha_dropped: bool,
    /// Size of the in-memory encoded result.
    pub encoded_bytes: usize,
}

/// Single-session image conversion engine.
///
/// Holds at most one source image and one processed image. Operations are
/// synchronous and blocking; one engine per logical editing session, with
/// callers serializing access themselves.
#[derive(Debug)]
pub struct ConversionEngine {
    original: Option<LoadedImage>,
    processed: Option<DynamicImage>,
    current_quality: u8,
    current_format: OutputFormat,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionEngine {
    pub fn new() -> Self {
        Self {
            original: None,
            processed: None,
            current_quality: 85,
            current_format: OutputFormat::Jpeg,
        }
    }

    /// Decode the file at `path`, replacing the source slot and clearing any
    /// previous processed image. Leaves current format/quality untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<ImageMetadata, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| LoadError::unreadable(path.display().to_string(), e))?;

        let (image, format) = decode_image(&bytes)
            .map_err(|e| LoadError::undecodable(path.display().to_string(), e.to_string()))?;

        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            format = ?format,
            "loaded source image"
        );

        let loaded = LoadedImage {
            image,
            format,
            path: path.to_path_buf(),
            byte_len: bytes.len() as u64,
        };
        let metadata = metadata_of(&loaded);
        self.original = Some(loaded);
        // A stale processed image must never outlive a fresh source
        self.processed = None;
        Ok(metadata)
    }

    /// Read-only snapshot of the loaded source, or None before any load.
    pub fn metadata(&self) -> Option<ImageMetadata> {
        self.original.as_ref().map(metadata_of)
    }

    /// Run the conversion pipeline: copy the source, resize if requested,
    /// canonicalize the color mode for the destination format, encode to an
    /// in-memory buffer, then decode that buffer back as the new processed
    /// image. The decode-back is mandatory: it makes preview() and
    /// estimate_size() reflect the actual lossy artifacts, not the
    /// pre-compression pixels.
    pub fn convert(&mut self, request: &ConversionRequest) -> Result<ConversionReport, ConvertError> {
        let original = self.original.as_ref().ok_or(ConvertError::NoImage)?;
        let quality = clamp_quality(request.quality);

        let mut working = original.image.clone();

        if let Some((target_w, target_h)) = request.target_size {
            if target_w == 0 || target_h == 0 {
                return Err(ConvertError::invalid_dimensions(target_w, target_h));
            }
            if (target_w, target_h) != (working.width(), working.height()) {
                let (dst_w, dst_h) = if request.preserve_aspect {
                    calc_fit_dimensions(working.width(), working.height(), target_w, target_h)
                } else {
                    (target_w, target_h)
                };
                if (dst_w, dst_h) != (working.width(), working.height()) {
                    working = fast_resize_owned(working, dst_w, dst_h).map_err(|e| {
                        ConvertError::encode_failed(request.format.as_str(), e.to_string())
                    })?;
                }
            }
        }

        let (working, alpha_dropped) = canonicalize_for_format(working, request.format);

        let encoded = encode_to_format(&working, request.format, quality)
            .map_err(|e| ConvertError::encode_failed(request.format.as_str(), e.to_string()))?;

        // Decode-back failure means step 4 produced malformed bytes; surface
        // it as an encode failure
        let (processed, _) = decode_image(&encoded).map_err(|e| {
            ConvertError::encode_failed(
                request.format.as_str(),
                format!("decode-back failed: {e}"),
            )
        })?;

        debug!(
            format = %request.format,
            quality,
            width = processed.width(),
            height = processed.height(),
            bytes = encoded.len(),
            alpha_dropped,
            "converted image"
        );

        let report = ConversionReport {
            format: request.format,
            quality,
            width: processed.width(),
            height: processed.height(),
            alpha_dropped,
            encoded_bytes: encoded.len(),
        };

        self.processed = Some(processed);
        self.current_format = request.format;
        self.current_quality = quality;
        Ok(report)
    }

    /// Encode the processed image to `path`. Format and quality default to
    /// the values of the last convert() call.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        format: Option<OutputFormat>,
        quality: Option<u8>,
    ) -> Result<(), SaveError> {
        let path = path.as_ref();
        let processed = self.processed.as_ref().ok_or(SaveError::NothingToSave)?;
        let format = format.unwrap_or(self.current_format);
        let quality = clamp_quality(quality.unwrap_or(self.current_quality));

        // The stored processed image may carry alpha while the caller now
        // wants JPEG; re-apply the same canonicalization as convert()
        let canonical: Cow<'_, DynamicImage> =
            if format == OutputFormat::Jpeg && processed.color().has_alpha() {
                Cow::Owned(DynamicImage::ImageRgb8(processed.to_rgb8()))
            } else {
                Cow::Borrowed(processed)
            };

        let encoded = encode_to_format(&canonical, format, quality)
            .map_err(|e| SaveError::encode_failed(format.as_str(), e.to_string()))?;

        std::fs::write(path, &encoded)
            .map_err(|e| SaveError::write_failed(path.display().to_string(), e))?;

        debug!(
            path = %path.display(),
            format = %format,
            quality,
            bytes = encoded.len(),
            "saved processed image"
        );
        Ok(())
    }

    /// Thumbnails of the source and processed images fitting `max_box`,
    /// aspect preserved, never upscaled. Operates on copies; the stored
    /// slots are never mutated. Returns (None, None) before any load.
    pub fn preview(&self, max_box: (u32, u32)) -> (Option<DynamicImage>, Option<DynamicImage>) {
        let original = self
            .original
            .as_ref()
            .map(|loaded| thumbnail(&loaded.image, max_box));
        let processed = self.processed.as_ref().map(|img| thumbnail(img, max_box));
        (original, processed)
    }

    /// Best-effort size estimate of the processed image encoded with the
    /// given (or current) settings, as "{kb:.1} KB". Returns "N/A" when
    /// nothing is processed or on any encode failure: this feeds a UI hint,
    /// not a correctness-critical path.
    pub fn estimate_size(&self, format: Option<OutputFormat>, quality: Option<u8>) -> String {
        let Some(processed) = self.processed.as_ref() else {
            return "N/A".to_string();
        };
        let format = format.unwrap_or(self.current_format);
        let quality = clamp_quality(quality.unwrap_or(self.current_quality));

        let canonical: Cow<'_, DynamicImage> =
            if format == OutputFormat::Jpeg && processed.color().has_alpha() {
                Cow::Owned(DynamicImage::ImageRgb8(processed.to_rgb8()))
            } else {
                Cow::Borrowed(processed)
            };

        match encode_to_format(&canonical, format, quality) {
            Ok(bytes) => {
                trace!(format = %format, quality, bytes = bytes.len(), "estimated output size");
                kb_string(bytes.len() as u64)
            }
            Err(_) => "N/A".to_string(),
        }
    }

    /// The decoded source image, if loaded.
    pub fn original(&self) -> Option<&DynamicImage> {
        self.original.as_ref().map(|loaded| &loaded.image)
    }

    /// The decoded-back processed image from the last convert().
    pub fn processed(&self) -> Option<&DynamicImage> {
        self.processed.as_ref()
    }

    pub fn current_format(&self) -> OutputFormat {
        self.current_format
    }

    pub fn current_quality(&self) -> u8 {
        self.current_quality
    }
}

/// Flatten the working copy when the destination format cannot carry its
/// color mode. JPEG has no alpha: RGBA (and grayscale-alpha) flatten to RGB
/// with the alpha channel dropped, not composited onto a background.
fn canonicalize_for_format(img: DynamicImage, format: OutputFormat) -> (DynamicImage, bool) {
    if format == OutputFormat::Jpeg && img.color().has_alpha() {
        (DynamicImage::ImageRgb8(img.to_rgb8()), true)
    } else {
        (img, false)
    }
}

/// Shrink-to-fit copy for preview display. Resize failures degrade to an
/// unscaled copy: preview is display-only and must not error.
fn thumbnail(img: &DynamicImage, (box_w, box_h): (u32, u32)) -> DynamicImage {
    let (fit_w, fit_h) = calc_fit_dimensions(img.width(), img.height(), box_w, box_h);
    if (fit_w, fit_h) == (img.width(), img.height()) {
        return img.clone();
    }
    fast_resize_owned(img.clone(), fit_w, fit_h).unwrap_or_else(|_| img.clone())
}

fn metadata_of(loaded: &LoadedImage) -> ImageMetadata {
    ImageMetadata {
        format: loaded.format.map(format_name),
        width: loaded.image.width(),
        height: loaded.image.height(),
        color_mode: color_mode_name(loaded.image.color()).to_string(),
        file_size: kb_string(loaded.byte_len),
        filename: loaded
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

fn color_mode_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "Grayscale",
        ColorType::La8 | ColorType::La16 => "GrayscaleAlpha",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "Other",
    }
}

fn kb_string(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
