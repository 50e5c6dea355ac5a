// shrinkray/src/envelope.rs
//! The JSON bodies returned to uploaders and the `data:` URI carrying the
//! image bytes.

use crate::core::CompressionResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ALREADY_OPTIMIZED: &str = "Image already optimized";

pub fn data_uri(label: &str, bytes: &[u8]) -> String {
    format!("data:image/{};base64,{}", label, STANDARD.encode(bytes))
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("not an image data URI")]
    NotImageUri,

    #[error("data URI is not base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Splits `data:image/<label>;base64,<payload>` back into label and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), EnvelopeError> {
    let rest = uri
        .strip_prefix("data:image/")
        .ok_or(EnvelopeError::NotImageUri)?;
    let (label, payload) = rest
        .split_once(";base64,")
        .ok_or(EnvelopeError::NotBase64)?;

    Ok((label.to_string(), STANDARD.decode(payload)?))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressResponse {
    pub success: bool,
    pub data: String,
    pub original_size: u64,
    pub compressed_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&CompressionResult> for CompressResponse {
    fn from(result: &CompressionResult) -> Self {
        Self {
            success: true,
            data: result.data_uri(),
            original_size: result.original_size,
            compressed_size: result.output_size,
            message: (!result.was_optimized).then(|| ALREADY_OPTIMIZED.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
