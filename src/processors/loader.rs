// shrinkray/src/processors/loader.rs
use crate::core::{EncodeError, MAX_IMAGE_DIMENSION};
use crate::utils::image_format_to_tag;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

#[derive(Debug, Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn without_dimension_limit(mut self) -> Self {
        self.max_dimensions = None;
        self
    }

    /// Reads only the signature; nothing is decoded.
    pub fn probe(&self, data: &[u8]) -> Option<ImageFormat> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?
            .format()
    }

    pub fn probe_tag(&self, data: &[u8]) -> Option<String> {
        self.probe(data).map(image_format_to_tag)
    }

    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage, EncodeError> {
        self.check_dimensions(data)?;

        let image = reader(data)?.decode().map_err(EncodeError::Decode)?;

        log::debug!(
            "Decoded image: {}x{} pixels, color: {:?}",
            image.width(),
            image.height(),
            image.color()
        );

        Ok(image)
    }

    pub fn check_dimensions(&self, data: &[u8]) -> Result<(), EncodeError> {
        let Some((max_width, max_height)) = self.max_dimensions else {
            return Ok(());
        };

        let (width, height) = reader(data)?
            .into_dimensions()
            .map_err(EncodeError::Decode)?;

        if width > max_width || height > max_height {
            return Err(EncodeError::DimensionsTooLarge {
                width,
                height,
                max_width,
                max_height,
            });
        }

        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, EncodeError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| EncodeError::Decode(image::ImageError::IoError(e)))
}
