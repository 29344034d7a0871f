// src/ops.rs
//
// Conversion request vocabulary: output formats and per-call settings.
// These are cheap to create and store - the expensive work happens in
// ConversionEngine::convert().

/// Output format for encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub fn from_str(format: &str) -> Result<Self, String> {
        match format.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "bmp" => Ok(Self::Bmp),
            "tiff" | "tif" => Ok(Self::Tiff),
            other => Err(format!("unsupported format: {other}")),
        }
    }

    /// Uppercase display name, as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WEBP",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
        }
    }

    /// Preferred file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// Whether the quality setting has any effect for this format.
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call settings for `ConversionEngine::convert`.
///
/// Not persisted: construct one per call. Quality is only meaningful for
/// lossy formats (JPEG, WEBP) and is ignored otherwise.
#[derive(Clone, Debug)]
pub struct ConversionRequest {
    pub format: OutputFormat,
    /// Quality 1-100; out-of-range values are clamped.
    pub quality: u8,
    /// Target dimensions; None leaves the image at its decoded size.
    pub target_size: Option<(u32, u32)>,
    /// Shrink-to-fit within target_size when true, force exact size when false.
    pub preserve_aspect: bool,
}

impl ConversionRequest {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            quality: 85,
            target_size: None,
            preserve_aspect: true,
        }
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn target_size(mut self, width: u32, height: u32) -> Self {
        self.target_size = Some((width, height));
        self
    }

    pub fn preserve_aspect(mut self, preserve: bool) -> Self {
        self.preserve_aspect = preserve;
        self
    }
}
