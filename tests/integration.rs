mod common;

use common::{encode, gradient, jpeg, noise};
use image::{ImageFormat, RgbImage};
use shrinkray::{
    decode_data_uri, CompressConfig, CompressError, CompressResponse, Compressor, FallbackLabel,
    QualityHint, SourceFormat,
};

#[test]
fn test_minimal_png_is_left_alone() {
    let compressor = Compressor::new(CompressConfig::default());
    let raw = encode(&RgbImage::new(1, 1), ImageFormat::Png);
    let png = oxipng::optimize_from_memory(&raw, &oxipng::Options::from_preset(6)).unwrap();

    let result = compressor.compress(&png, Some("80")).unwrap();
    assert_eq!(result.format, SourceFormat::Png);
    assert!(!result.was_optimized);
    assert_eq!(result.output_size, result.original_size);
    assert_eq!(result.output, png);

    let body = CompressResponse::from(&result);
    assert_eq!(body.compressed_size, body.original_size);
    assert_eq!(body.message.as_deref(), Some("Image already optimized"));
}

#[test]
fn test_unoptimized_png_follows_guard_exactly() {
    let compressor = Compressor::new(CompressConfig::default());
    let png = encode(&RgbImage::new(1, 1), ImageFormat::Png);

    let result = compressor.compress(&png, Some("80")).unwrap();
    if result.was_optimized {
        assert!(result.output_size < result.original_size);
        assert_eq!(image::guess_format(&result.output).unwrap(), ImageFormat::Png);
    } else {
        assert_eq!(result.output, png);
        assert_eq!(result.output_size, result.original_size);
    }
}

#[cfg(feature = "avif-decode")]
#[test]
fn test_avif_upload_is_reencoded() {
    let mut avif = Vec::new();
    image::DynamicImage::ImageRgb8(noise(48, 48))
        .write_with_encoder(image::codecs::avif::AvifEncoder::new_with_speed_quality(
            &mut avif, 10, 100,
        ))
        .unwrap();

    let result = Compressor::new(CompressConfig::default())
        .compress(&avif, Some("40"))
        .unwrap();
    assert_eq!(result.format, SourceFormat::Avif);
    assert_eq!(result.label, "avif");
    assert!(result.output_size <= result.original_size);
    assert!(result.output.windows(8).any(|w| w == b"ftypavif"));
}

#[test]
fn test_unprofiled_format_is_converted_to_jpeg() {
    let bmp = encode(&gradient(64, 64), ImageFormat::Bmp);
    let compressor = Compressor::new(CompressConfig::default());

    let result = compressor.compress(&bmp, None).unwrap();
    assert!(result.was_optimized);
    assert!(result.output_size < result.original_size);
    assert_eq!(result.format, SourceFormat::Other("bmp".to_string()));
    assert_eq!(image::guess_format(&result.output).unwrap(), ImageFormat::Jpeg);
    assert!(result.data_uri().starts_with("data:image/jpeg;base64,"));
}

#[test]
fn test_legacy_label_keeps_detected_format_on_jpeg_bytes() {
    let bmp = encode(&gradient(64, 64), ImageFormat::Bmp);
    let config = CompressConfig {
        fallback_label: FallbackLabel::Detected,
        ..Default::default()
    };
    let result = Compressor::new(config).compress(&bmp, None).unwrap();

    let (label, bytes) = decode_data_uri(&result.data_uri()).unwrap();
    assert!(result.was_optimized);
    assert_eq!(label, "bmp");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_limit_plus_one_byte_is_rejected() {
    let config = CompressConfig {
        max_file_size: 1024,
        ..Default::default()
    };
    let compressor = Compressor::new(config);

    let err = compressor.compress(&vec![0u8; 1025], None).unwrap_err();
    assert!(matches!(err, CompressError::SizeLimitExceeded { limit: 1024 }));
    assert!(err.is_client_error());
}

#[test]
fn test_garbage_is_unsupported() {
    let compressor = Compressor::new(CompressConfig::default());
    let err = compressor
        .compress(b"this is not an image, just some text", None)
        .unwrap_err();
    assert!(matches!(err, CompressError::UnsupportedFormat(_)));
    assert_eq!(err.public_message(), "Unsupported image format");
}

#[test]
fn test_corrupt_jpeg_fails_compression() {
    let mut data = jpeg(&noise(64, 64), 90);
    data.truncate(200);

    let err = Compressor::new(CompressConfig::default())
        .compress(&data, None)
        .unwrap_err();
    assert!(matches!(err, CompressError::CompressionFailed { .. }));
    assert!(!err.is_client_error());
}

#[test]
fn test_high_quality_jpeg_shrinks() {
    let data = jpeg(&noise(96, 96), 100);
    let result = Compressor::new(CompressConfig::default())
        .compress(&data, Some("40"))
        .unwrap();

    assert!(result.was_optimized);
    assert_eq!(result.format, SourceFormat::Jpeg);
    assert_eq!(result.label, "jpeg");
    assert!(result.savings_percent() > 0.0);
}

#[test]
fn test_lossless_webp_shrinks_with_lossy_profile() {
    let data = encode(&noise(64, 64), ImageFormat::WebP);
    let result = Compressor::new(CompressConfig::default())
        .compress(&data, Some("50"))
        .unwrap();

    assert!(result.was_optimized);
    assert_eq!(result.label, "webp");
    assert_eq!(&result.output[8..12], b"WEBP");
}

#[test]
fn test_output_never_grows() {
    let compressor = Compressor::new(CompressConfig::default());
    let inputs = [
        encode(&gradient(32, 32), ImageFormat::Png),
        encode(&noise(32, 32), ImageFormat::Png),
        jpeg(&gradient(32, 32), 30),
        jpeg(&noise(32, 32), 95),
        encode(&noise(16, 16), ImageFormat::Gif),
    ];

    for input in &inputs {
        let result = compressor
            .compress_upload(&shrinkray::UploadedImage::new(input.clone()), QualityHint::exact(90))
            .unwrap();
        assert!(result.output_size <= result.original_size);
        assert_eq!(result.output_size, result.output.len() as u64);
        if !result.was_optimized {
            assert_eq!(&result.output, input);
        }

        let (_, decoded) = decode_data_uri(&result.data_uri()).unwrap();
        assert_eq!(decoded, result.output);
    }
}
