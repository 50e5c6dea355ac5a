// shrinkray/src/processors/mod.rs
mod encoder;
mod loader;

pub use encoder::Encoder;
pub use loader::Loader;

use crate::core::{CompressConfig, EncodeError, EncodeProfile};

/// Format probing and quality-parameterised encoding.
pub trait Codec: Send + Sync {
    /// Format tag read from the byte signature, `None` when unrecognised.
    fn probe(&self, bytes: &[u8]) -> Option<String>;

    fn encode(&self, bytes: &[u8], profile: &EncodeProfile) -> Result<Vec<u8>, EncodeError>;
}

/// Production codec backed by `image`, `oxipng` and `webp`.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    loader: Loader,
    encoder: Encoder,
}

impl ImageCodec {
    pub fn new(config: &CompressConfig) -> Self {
        let loader = match config.max_dimensions {
            Some((width, height)) => Loader::new().with_max_dimensions(width, height),
            None => Loader::new().without_dimension_limit(),
        };

        Self {
            encoder: Encoder::new(loader.clone()),
            loader,
        }
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(&CompressConfig::default())
    }
}

impl Codec for ImageCodec {
    fn probe(&self, bytes: &[u8]) -> Option<String> {
        self.loader.probe_tag(bytes)
    }

    fn encode(&self, bytes: &[u8], profile: &EncodeProfile) -> Result<Vec<u8>, EncodeError> {
        self.encoder.encode(bytes, profile)
    }
}
