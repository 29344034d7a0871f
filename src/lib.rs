// lib.rs
//
// imgcast: an image format conversion engine with compression-accurate
// previews.
//
// Design goals:
// - One session, one engine: a source slot and a processed slot
// - Previews show real codec output, not pre-compression pixels
//   (convert() encodes, then decodes its own buffer back)
// - Typed errors per operation, no panics on bad input
// - Synchronous and blocking; callers own threading

pub mod engine;
pub mod error;
pub mod ops;

pub use engine::{ConversionEngine, ConversionReport, ImageMetadata, DEFAULT_PREVIEW_BOX};
pub use error::{ConvertError, LoadError, SaveError};
pub use ops::{ConversionRequest, OutputFormat};

/// Crate version, as reported to hosts embedding the engine.
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Formats the engine can decode from disk.
pub fn supported_input_formats() -> Vec<String> {
    vec![
        "jpeg".to_string(),
        "jpg".to_string(),
        "png".to_string(),
        "webp".to_string(),
        "bmp".to_string(),
        "tiff".to_string(),
    ]
}

/// Formats the engine can encode to.
pub fn supported_output_formats() -> Vec<String> {
    vec![
        "jpeg".to_string(),
        "jpg".to_string(),
        "png".to_string(),
        "webp".to_string(),
        "bmp".to_string(),
        "tiff".to_string(),
    ]
}
