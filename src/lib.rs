pub mod cli;
pub mod core;
pub mod envelope;
pub mod processors;
pub mod server;
pub mod utils;

pub use cli::{Cli, Commands, CompressArgs, FallbackLabelArg};
pub use core::processor::{Compressor, FileError};
pub use core::{
    CompressConfig, CompressError, CompressionResult, ConfigError, DetectError, EncodeError,
    EncodeProfile, FallbackLabel, QualityHint, Result, ServerConfig, SourceFormat, UploadedImage,
};
pub use envelope::{data_uri, decode_data_uri, CompressResponse, ErrorResponse};
pub use processors::{Codec, Encoder, ImageCodec, Loader};
pub use utils::{calculate_savings, format_file_size, generate_output_path};
