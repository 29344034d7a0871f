// src/engine.rs
//
// The core of imgcast. A single-session conversion engine that:
// 1. Decodes a source image once
// 2. Converts on demand (resize, canonicalize, re-encode, decode back)
// 3. Serves previews and size estimates from the decoded-back result
//
// This file is a facade over the decomposed modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

mod decoder;
mod encoder;
mod resize;
mod session;

pub use decoder::{check_dimensions, decode_image, detect_format};
pub use encoder::{encode_jpeg, encode_png, encode_to_format, encode_webp};
pub use resize::{calc_fit_dimensions, fast_resize_owned};
pub use session::{ConversionEngine, ConversionReport, ImageMetadata, DEFAULT_PREVIEW_BOX};
