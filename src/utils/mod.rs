// shrinkray/src/utils/mod.rs
use std::path::{Path, PathBuf};

/// `<stem>_<suffix>.<extension>` beside the input, with a counter appended
/// instead of overwriting an existing file.
pub fn generate_output_path(input_path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    let mut candidate = input_path.with_file_name(format!("{}_{}.{}", stem, suffix, extension));
    let mut counter = 1;

    while candidate.exists() {
        candidate =
            input_path.with_file_name(format!("{}_{}_{}.{}", stem, suffix, counter, extension));
        counter += 1;
    }

    candidate
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

/// Whole mebibyte limits read as `10MB`, anything else falls back to
/// [`format_file_size`].
pub fn format_size_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;

    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format_file_size(bytes)
    }
}

pub fn calculate_savings(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }

    let savings = (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0;
    savings.clamp(0.0, 100.0)
}

/// Lowercase tag for a detected container, as used on data URIs.
pub fn image_format_to_tag(format: image::ImageFormat) -> String {
    use image::ImageFormat;

    let tag = match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Pnm => "pnm",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Tga => "tga",
        ImageFormat::Dds => "dds",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        ImageFormat::Hdr => "hdr",
        ImageFormat::OpenExr => "exr",
        ImageFormat::Farbfeld => "farbfeld",
        ImageFormat::Avif => "avif",
        ImageFormat::Qoi => "qoi",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    };

    tag.to_string()
}

pub fn extension_for_tag(tag: &str) -> &str {
    match tag {
        "jpeg" => "jpg",
        other => other,
    }
}
