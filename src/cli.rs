// shrinkray/src/cli.rs
use crate::core::{
    CompressConfig, FallbackLabel, ServerConfig, DEFAULT_MAX_FILE_SIZE, MAX_IMAGE_DIMENSION,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shrinkray", version, about = "Re-encode images without ever making them bigger")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP compression service
    Serve {
        #[arg(long, env = "SHRINKRAY_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        /// Uploads encoded at the same time
        #[arg(long, env = "SHRINKRAY_MAX_CONCURRENT", default_value_t = 4)]
        max_concurrent: usize,

        #[command(flatten)]
        settings: CompressArgs,
    },

    /// Compress a single file on disk
    Compress {
        input: PathBuf,

        /// Defaults to <stem>_compressed.<ext> beside the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quality hint (1-100); anything else uses the default
        #[arg(short, long)]
        quality: Option<String>,

        /// Print the HTTP response body instead of a summary
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: CompressArgs,
    },

    /// Show the detected format and the profile that would be used
    Info {
        input: PathBuf,

        #[arg(short, long)]
        quality: Option<String>,

        #[command(flatten)]
        settings: CompressArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CompressArgs {
    /// Largest accepted upload in bytes
    #[arg(long, env = "SHRINKRAY_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    #[arg(long, env = "SHRINKRAY_DEFAULT_QUALITY", default_value_t = 80)]
    pub default_quality: u8,

    /// Label used for formats converted to JPEG
    #[arg(
        long,
        env = "SHRINKRAY_FALLBACK_LABEL",
        value_enum,
        default_value_t = FallbackLabelArg::Encoded
    )]
    pub fallback_label: FallbackLabelArg,

    /// oxipng preset for PNG input (0-6)
    #[arg(long, env = "SHRINKRAY_PNG_PRESET", default_value_t = 6)]
    pub png_preset: u8,

    /// libwebp method for WebP input (0-6, slower is smaller)
    #[arg(long, env = "SHRINKRAY_WEBP_METHOD", default_value_t = 6)]
    pub webp_method: u8,

    #[arg(long, env = "SHRINKRAY_AVIF_SPEED", default_value_t = 6)]
    pub avif_speed: u8,

    /// Largest width or height decoded; 0 disables the check
    #[arg(long, env = "SHRINKRAY_MAX_DIMENSION", default_value_t = MAX_IMAGE_DIMENSION)]
    pub max_dimension: u32,
}

impl CompressArgs {
    pub fn to_config(&self) -> CompressConfig {
        CompressConfig {
            max_file_size: self.max_file_size,
            default_quality: self.default_quality,
            fallback_label: self.fallback_label.into(),
            max_dimensions: (self.max_dimension > 0)
                .then_some((self.max_dimension, self.max_dimension)),
            png_preset: self.png_preset,
            webp_method: self.webp_method,
            avif_speed: self.avif_speed,
        }
    }

    pub fn to_server_config(&self, bind: SocketAddr, max_concurrent: usize) -> ServerConfig {
        ServerConfig {
            bind,
            max_concurrent_requests: max_concurrent,
            compress: self.to_config(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackLabelArg {
    /// Label converted output as jpeg
    Encoded,
    /// Keep the detected source format on the label
    Detected,
}

impl From<FallbackLabelArg> for FallbackLabel {
    fn from(arg: FallbackLabelArg) -> Self {
        match arg {
            FallbackLabelArg::Encoded => FallbackLabel::Encoded,
            FallbackLabelArg::Detected => FallbackLabel::Detected,
        }
    }
}
