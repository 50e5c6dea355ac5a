// shrinkray/src/core/processor.rs
use super::{
    CompressConfig, CompressError, CompressionResult, DetectError, EncodeProfile, FallbackLabel,
    QualityHint, Result, SourceFormat, UploadedImage,
};
use crate::processors::{Codec, ImageCodec};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Runs one upload through validate, detect, select, encode and the
/// never-bigger guard.
pub struct Compressor<C = ImageCodec> {
    config: CompressConfig,
    codec: C,
}

impl Compressor<ImageCodec> {
    pub fn new(config: CompressConfig) -> Self {
        let codec = ImageCodec::new(&config);
        Self { config, codec }
    }
}

impl<C: Codec> Compressor<C> {
    pub fn with_codec(config: CompressConfig, codec: C) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &CompressConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn compress(&self, bytes: &[u8], quality_hint: Option<&str>) -> Result<CompressionResult> {
        self.run(bytes, QualityHint::parse(quality_hint))
    }

    pub fn compress_upload(
        &self,
        upload: &UploadedImage,
        quality: QualityHint,
    ) -> Result<CompressionResult> {
        self.run(upload.bytes(), quality)
    }

    /// Validation, detection and profile selection without encoding.
    pub fn plan(
        &self,
        bytes: &[u8],
        quality: QualityHint,
    ) -> Result<(SourceFormat, EncodeProfile)> {
        self.validate(bytes)?;
        let format = self.detect(bytes)?;
        let profile = self.select_profile(&format, quality);
        Ok((format, profile))
    }

    fn run(&self, bytes: &[u8], quality: QualityHint) -> Result<CompressionResult> {
        let (format, profile) = self.plan(bytes, quality)?;

        let candidate = self
            .codec
            .encode(bytes, &profile)
            .map_err(|source| CompressError::CompressionFailed {
                format: format.tag().to_string(),
                source,
            })?;

        Ok(self.guard(bytes, format, profile, candidate))
    }

    pub fn validate(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(CompressError::MissingInput);
        }

        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            log::warn!(
                "Rejecting upload of {} bytes (limit {})",
                size,
                self.config.max_file_size
            );
            return Err(CompressError::SizeLimitExceeded {
                limit: self.config.max_file_size,
            });
        }

        Ok(())
    }

    pub fn detect(&self, bytes: &[u8]) -> std::result::Result<SourceFormat, DetectError> {
        let format = self
            .codec
            .probe(bytes)
            .and_then(|tag| SourceFormat::from_tag(&tag))
            .ok_or(DetectError::Unrecognized(bytes.len()))?;

        log::debug!("Detected {} input ({} bytes)", format, bytes.len());
        Ok(format)
    }

    pub fn select_profile(&self, format: &SourceFormat, quality: QualityHint) -> EncodeProfile {
        let quality = quality.resolve(self.config.default_quality);
        let profile = EncodeProfile::select(format, quality, &self.config);
        log::debug!("Selected profile {} for {}", profile, format);
        profile
    }

    fn guard(
        &self,
        original: &[u8],
        format: SourceFormat,
        profile: EncodeProfile,
        candidate: Vec<u8>,
    ) -> CompressionResult {
        let original_size = original.len() as u64;

        if candidate.len() >= original.len() {
            log::debug!(
                "Encoded {} bytes is not smaller than {} bytes, keeping original",
                candidate.len(),
                original.len()
            );
            return CompressionResult {
                label: format.tag().to_string(),
                format,
                profile,
                output: original.to_vec(),
                original_size,
                output_size: original_size,
                was_optimized: false,
            };
        }

        let label = match (self.config.fallback_label, profile.is_fallback()) {
            (FallbackLabel::Encoded, true) => profile.output_tag().to_string(),
            _ => format.tag().to_string(),
        };

        log::debug!(
            "Encoded {} -> {} bytes as {}",
            original.len(),
            candidate.len(),
            label
        );

        CompressionResult {
            format,
            profile,
            label,
            output_size: candidate.len() as u64,
            output: candidate,
            original_size,
            was_optimized: true,
        }
    }

    /// Compresses a file on disk and writes the returned bytes next to it
    /// unless an explicit output path is given.
    pub fn compress_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        quality: QualityHint,
    ) -> std::result::Result<(CompressionResult, PathBuf), FileError> {
        let bytes = std::fs::read(input)?;
        let result = self.compress_upload(&UploadedImage::new(bytes), quality)?;

        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => crate::utils::generate_output_path(
                input,
                "compressed",
                crate::utils::extension_for_tag(&result.label),
            ),
        };

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&output_path, &result.output)?;

        log::info!(
            "Saved image: {} ({} bytes)",
            output_path.display(),
            result.output_size
        );

        Ok((result, output_path))
    }
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Compress(#[from] CompressError),
}
