// src/error.rs
//
// Error taxonomy for imgcast.
// Uses thiserror for simple, type-safe error handling.
//
// One error enum per engine operation so callers branch on error kind
// instead of parsing message strings:
// - LoadError: the file could not be read or decoded
// - ConvertError: nothing loaded, bad target dimensions, or encode failure
// - SaveError: nothing processed, encode failure, or write failure
// - CodecError: internal, shared by the decoder/encoder modules and mapped
//   into the per-operation types at the session boundary

use std::borrow::Cow;
use thiserror::Error;

/// Internal codec-layer errors shared by the decoder and encoder modules.
///
/// These never escape the engine directly; `ConversionEngine` maps them into
/// the per-operation error types below.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    #[error("resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },
}

impl CodecError {
    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }
}

/// Errors from `ConversionEngine::load`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Unreadable {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode '{path}': {reason}")]
    Undecodable {
        path: Cow<'static, str>,
        reason: Cow<'static, str>,
    },
}

impl LoadError {
    pub fn unreadable(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub fn undecodable(
        path: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Undecodable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from `ConversionEngine::convert`.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    #[error("no image loaded")]
    NoImage,

    #[error("invalid target dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to encode as {format}: {reason}")]
    EncodeFailed {
        format: Cow<'static, str>,
        reason: Cow<'static, str>,
    },
}

impl ConvertError {
    pub fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from `ConversionEngine::save`.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("no processed image to save")]
    NothingToSave,

    #[error("failed to encode as {format}: {reason}")]
    EncodeFailed {
        format: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },
}

impl SaveError {
    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            reason: reason.into(),
        }
    }

    pub fn write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }
}
