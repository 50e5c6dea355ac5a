// shrinkray/src/core/mod.rs
pub mod processor;

use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Which format tag goes on the envelope when an unrecognised source was
/// converted to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackLabel {
    /// Label the payload with what it actually is (`jpeg`).
    #[default]
    Encoded,
    /// Label the payload with the detected source format, even though the
    /// bytes are JPEG. Kept for clients that depend on the old behaviour.
    Detected,
}

#[derive(Debug, Clone)]
pub struct CompressConfig {
    pub max_file_size: u64,
    pub default_quality: u8,
    pub fallback_label: FallbackLabel,
    pub max_dimensions: Option<(u32, u32)>,
    pub png_preset: u8,
    pub webp_method: u8,
    pub avif_speed: u8,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            default_quality: DEFAULT_QUALITY,
            fallback_label: FallbackLabel::Encoded,
            max_dimensions: Some((MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION)),
            png_preset: 6,
            webp_method: 6,
            avif_speed: 6,
        }
    }
}

impl CompressConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::InvalidParameter(
                "Maximum file size must be greater than zero".to_string(),
            ));
        }

        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.default_quality) {
            return Err(ConfigError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        if let Some((width, height)) = self.max_dimensions {
            if width == 0 || height == 0 {
                return Err(ConfigError::InvalidParameter(
                    "Maximum dimensions must be non-zero".to_string(),
                ));
            }
        }

        if self.png_preset > 6 {
            return Err(ConfigError::InvalidParameter(
                "PNG preset must be between 0 and 6".to_string(),
            ));
        }

        if self.webp_method > 6 {
            return Err(ConfigError::InvalidParameter(
                "WebP method must be between 0 and 6".to_string(),
            ));
        }

        if !(1..=10).contains(&self.avif_speed) {
            return Err(ConfigError::InvalidParameter(
                "AVIF speed must be between 1 and 10".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_concurrent_requests: usize,
    pub compress: CompressConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_concurrent_requests: 4,
            compress: CompressConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidParameter(
                "At least one concurrent request must be allowed".to_string(),
            ));
        }
        self.compress.validate()
    }
}

/// Source container format as reported by the codec probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    WebP,
    Jpeg,
    Avif,
    /// Recognised by the probe but without a dedicated profile. Holds the
    /// lowercased tag.
    Other(String),
}

impl SourceFormat {
    /// Case-insensitive. Returns `None` for a blank tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        let format = match tag.as_str() {
            "" => return None,
            "png" => Self::Png,
            "webp" => Self::WebP,
            "jpeg" | "jpg" => Self::Jpeg,
            "avif" => Self::Avif,
            _ => Self::Other(tag),
        };
        Some(format)
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Jpeg => "jpeg",
            Self::Avif => "avif",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Encoder settings chosen for one detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeProfile {
    /// Lossless; `quality` is carried but has no effect on the output.
    Png { quality: u8, preset: u8 },
    WebP { quality: u8, method: u8 },
    Jpeg { quality: u8 },
    Avif { quality: u8, speed: u8 },
    /// Any other recognised format is converted to JPEG.
    JpegFallback { quality: u8, source: String },
}

impl EncodeProfile {
    pub fn select(format: &SourceFormat, quality: u8, config: &CompressConfig) -> Self {
        match format {
            SourceFormat::Png => Self::Png {
                quality,
                preset: config.png_preset,
            },
            SourceFormat::WebP => Self::WebP {
                quality,
                method: config.webp_method,
            },
            SourceFormat::Jpeg => Self::Jpeg { quality },
            SourceFormat::Avif => Self::Avif {
                quality,
                speed: config.avif_speed,
            },
            SourceFormat::Other(tag) => Self::JpegFallback {
                quality,
                source: tag.clone(),
            },
        }
    }

    pub fn quality(&self) -> u8 {
        match self {
            Self::Png { quality, .. }
            | Self::WebP { quality, .. }
            | Self::Jpeg { quality }
            | Self::Avif { quality, .. }
            | Self::JpegFallback { quality, .. } => *quality,
        }
    }

    /// Tag of the bytes this profile produces.
    pub fn output_tag(&self) -> &'static str {
        match self {
            Self::Png { .. } => "png",
            Self::WebP { .. } => "webp",
            Self::Jpeg { .. } | Self::JpegFallback { .. } => "jpeg",
            Self::Avif { .. } => "avif",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::JpegFallback { .. })
    }
}

impl fmt::Display for EncodeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png { preset, .. } => write!(f, "PNG (lossless, oxipng preset {})", preset),
            Self::WebP { quality, method } => {
                write!(f, "WebP (quality {}, method {})", quality, method)
            }
            Self::Jpeg { quality } => write!(f, "JPEG (quality {})", quality),
            Self::Avif { quality, speed } => {
                write!(f, "AVIF (quality {}, speed {})", quality, speed)
            }
            Self::JpegFallback { quality, source } => {
                write!(f, "JPEG (quality {}, converted from {})", quality, source)
            }
        }
    }
}

/// Caller-supplied quality. Anything unusable resolves to the configured
/// default instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityHint(Option<u8>);

impl QualityHint {
    pub fn parse(raw: Option<&str>) -> Self {
        let value = raw
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map(f64::round)
            .filter(|value| (MIN_QUALITY as f64..=MAX_QUALITY as f64).contains(value))
            .map(|value| value as u8);
        Self(value)
    }

    pub fn exact(quality: u8) -> Self {
        Self(Some(quality).filter(|q| (MIN_QUALITY..=MAX_QUALITY).contains(q)))
    }

    pub fn resolve(self, default: u8) -> u8 {
        self.0.unwrap_or(default)
    }
}

/// One submitted file.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub format: SourceFormat,
    pub profile: EncodeProfile,
    /// Format tag placed on the envelope.
    pub label: String,
    pub output: Vec<u8>,
    pub original_size: u64,
    pub output_size: u64,
    /// False when the encoder could not beat the input and the original
    /// bytes were returned instead.
    pub was_optimized: bool,
}

impl CompressionResult {
    pub fn data_uri(&self) -> String {
        crate::envelope::data_uri(&self.label, &self.output)
    }

    pub fn savings_percent(&self) -> f64 {
        crate::utils::calculate_savings(self.original_size, self.output_size)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Failure of the detection stage.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("no known image signature in {0} bytes")]
    Unrecognized(usize),
}

/// Failure of the encode stage.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image dimensions {width}x{height} exceed maximum {max_width}x{max_height}")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG optimization failed: {0}")]
    Png(#[from] oxipng::PngError),

    #[error("{format} encoder failed: {message}")]
    Encoder {
        format: &'static str,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("no image provided")]
    MissingInput,

    #[error("upload exceeds the {limit} byte limit")]
    SizeLimitExceeded { limit: u64 },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(#[from] DetectError),

    #[error("failed to compress {format} image: {source}")]
    CompressionFailed {
        format: String,
        #[source]
        source: EncodeError,
    },

    #[error("failed to process image: {0}")]
    ProcessingFailed(String),
}

impl CompressError {
    /// Invalid input as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput | Self::SizeLimitExceeded { .. } | Self::UnsupportedFormat(_)
        )
    }

    /// Message safe to hand back to the uploader.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingInput => "No image file provided".to_string(),
            Self::SizeLimitExceeded { limit } => format!(
                "File size exceeds {} limit",
                crate::utils::format_size_limit(*limit)
            ),
            Self::UnsupportedFormat(_) => "Unsupported image format".to_string(),
            Self::CompressionFailed { .. } => "Failed to compress image".to_string(),
            Self::ProcessingFailed(_) => "Failed to process image".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
