// shrinkray/src/processors/encoder.rs
use super::Loader;
use crate::core::{EncodeError, EncodeProfile};
use image::codecs::avif::AvifEncoder;
use image::DynamicImage;
use mozjpeg::{ColorSpace, Compress};
use oxipng::{optimize_from_memory, Options};
use std::panic::{self, AssertUnwindSafe};

/// Executes an [`EncodeProfile`] against raw source bytes.
#[derive(Debug, Clone)]
pub struct Encoder {
    loader: Loader,
}

impl Encoder {
    pub fn new(loader: Loader) -> Self {
        Self { loader }
    }

    pub fn encode(&self, data: &[u8], profile: &EncodeProfile) -> Result<Vec<u8>, EncodeError> {
        log::debug!("Encoding {} bytes with {}", data.len(), profile);

        let encoded = match profile {
            EncodeProfile::Png { preset, .. } => self.encode_png(data, *preset)?,
            EncodeProfile::WebP { quality, method } => {
                let image = self.loader.decode(data)?;
                self.encode_webp(&image, *quality, *method)?
            }
            EncodeProfile::Jpeg { quality } | EncodeProfile::JpegFallback { quality, .. } => {
                let image = self.loader.decode(data)?;
                self.encode_jpeg(&image, *quality)?
            }
            EncodeProfile::Avif { quality, speed } => {
                let image = self.loader.decode(data)?;
                self.encode_avif(&image, *quality, *speed)?
            }
        };

        log::debug!(
            "Encoded {} bytes as {}",
            encoded.len(),
            profile.output_tag()
        );

        Ok(encoded)
    }

    fn encode_png(&self, data: &[u8], preset: u8) -> Result<Vec<u8>, EncodeError> {
        // oxipng works on the PNG stream directly, but the pixel limit still
        // applies to what it will inflate.
        self.loader.check_dimensions(data)?;

        let options = Options::from_preset(preset);
        Ok(optimize_from_memory(data, &options)?)
    }

    fn encode_webp(
        &self,
        image: &DynamicImage,
        quality: u8,
        method: u8,
    ) -> Result<Vec<u8>, EncodeError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);

        let mut config = webp::WebPConfig::new().map_err(|_| EncodeError::Encoder {
            format: "webp",
            message: "could not initialise encoder config".to_string(),
        })?;
        config.lossless = 0;
        config.quality = f32::from(quality);
        config.method = i32::from(method);

        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| EncodeError::Encoder {
                format: "webp",
                message: format!("{:?}", e),
            })?;

        Ok(memory.to_vec())
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        // JPEG has no alpha channel.
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        // libjpeg reports fatal errors by unwinding.
        let encoded = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
            let mut compress = Compress::new(ColorSpace::JCS_RGB);
            compress.set_size(width as usize, height as usize);
            compress.set_quality(f32::from(quality));
            compress.set_optimize_coding(true);
            compress.set_progressive_mode();

            let mut started = compress.start_compress(Vec::new())?;
            started.write_scanlines(rgb.as_raw())?;
            started.finish()
        }));

        match encoded {
            Ok(Ok(buffer)) => Ok(buffer),
            Ok(Err(e)) => Err(EncodeError::Encoder {
                format: "jpeg",
                message: e.to_string(),
            }),
            Err(_) => Err(EncodeError::Encoder {
                format: "jpeg",
                message: "libjpeg aborted".to_string(),
            }),
        }
    }

    fn encode_avif(
        &self,
        image: &DynamicImage,
        quality: u8,
        speed: u8,
    ) -> Result<Vec<u8>, EncodeError> {
        let pixels = if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.to_rgb8())
        };

        let mut buffer = Vec::new();
        pixels.write_with_encoder(AvifEncoder::new_with_speed_quality(
            &mut buffer,
            speed,
            quality,
        ))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    fn noise(width: u32, height: u32) -> RgbImage {
        let mut state = 0x2545_f491_u32;
        RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            image::Rgb([r, g, b])
        })
    }

    fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_jpeg_profile_produces_jpeg() {
        let source = encoded(DynamicImage::ImageRgb8(noise(32, 32)), ImageFormat::Png);
        let output = Encoder::new(Loader::new())
            .encode(&source, &EncodeProfile::Jpeg { quality: 70 })
            .unwrap();
        assert_eq!(&output[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_jpeg_is_progressive() {
        let source = encoded(DynamicImage::ImageRgb8(noise(64, 64)), ImageFormat::Png);
        let output = Encoder::new(Loader::new())
            .encode(&source, &EncodeProfile::Jpeg { quality: 80 })
            .unwrap();

        // SOF2 marks a progressive frame.
        assert!(output.windows(2).any(|w| w == [0xFF, 0xC2]));
    }

    #[test]
    fn test_fallback_flattens_alpha() {
        let rgba = RgbaImage::from_pixel(16, 16, image::Rgba([10, 20, 30, 128]));
        let source = encoded(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let output = Encoder::new(Loader::new())
            .encode(
                &source,
                &EncodeProfile::JpegFallback {
                    quality: 80,
                    source: "png".to_string(),
                },
            )
            .unwrap();
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_webp_profile_produces_webp() {
        let source = encoded(DynamicImage::ImageRgb8(noise(32, 32)), ImageFormat::Png);
        let output = Encoder::new(Loader::new())
            .encode(&source, &EncodeProfile::WebP { quality: 60, method: 4 })
            .unwrap();
        assert_eq!(&output[..4], b"RIFF");
        assert_eq!(&output[8..12], b"WEBP");
    }

    #[test]
    fn test_png_profile_stays_png() {
        let source = encoded(DynamicImage::ImageRgb8(RgbImage::new(24, 24)), ImageFormat::Png);
        let output = Encoder::new(Loader::new())
            .encode(&source, &EncodeProfile::Png { quality: 80, preset: 2 })
            .unwrap();
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_avif_profile_produces_avif() {
        let source = encoded(DynamicImage::ImageRgb8(noise(32, 32)), ImageFormat::Png);
        let output = Encoder::new(Loader::new())
            .encode(&source, &EncodeProfile::Avif { quality: 60, speed: 10 })
            .unwrap();
        assert!(output.windows(8).any(|w| w == b"ftypavif"));
    }

    #[test]
    fn test_corrupt_input_fails() {
        let mut source = encoded(DynamicImage::ImageRgb8(noise(16, 16)), ImageFormat::Png);
        source.truncate(source.len() / 2);
        let result =
            Encoder::new(Loader::new()).encode(&source, &EncodeProfile::Jpeg { quality: 80 });
        assert!(result.is_err());
    }
}
