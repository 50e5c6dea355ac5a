use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use shrinkray::utils::format_file_size;
use shrinkray::{Cli, Commands, CompressArgs, CompressResponse, Compressor, QualityHint};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still overrides per module
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Serve {
            bind,
            max_concurrent,
            settings,
        } => process_serve(settings, bind, max_concurrent),
        Commands::Compress {
            input,
            output,
            quality,
            json,
            settings,
        } => process_compress(input, output, quality, json, settings),
        Commands::Info {
            input,
            quality,
            settings,
        } => process_info(input, quality, settings),
    }
}

fn process_serve(
    settings: CompressArgs,
    bind: std::net::SocketAddr,
    max_concurrent: usize,
) -> anyhow::Result<()> {
    let config = settings.to_server_config(bind, max_concurrent);
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(shrinkray::server::serve(config))
        .context("Webserver failed")?;

    Ok(())
}

fn process_compress(
    input: PathBuf,
    output: Option<PathBuf>,
    quality: Option<String>,
    json: bool,
    settings: CompressArgs,
) -> anyhow::Result<()> {
    let config = settings.to_config();
    config.validate()?;

    let compressor = Compressor::new(config);
    let (result, output_path) = compressor
        .compress_file(
            &input,
            output.as_deref(),
            QualityHint::parse(quality.as_deref()),
        )
        .with_context(|| format!("Failed to compress {}", input.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&CompressResponse::from(&result))?
        );
        return Ok(());
    }

    println!("Format: {} ({})", result.format, result.profile);
    println!("Original: {}", format_file_size(result.original_size));
    println!("Compressed: {}", format_file_size(result.output_size));
    if result.was_optimized {
        println!(
            "Saved: {} ({:.1}%)",
            format_file_size(result.original_size - result.output_size),
            result.savings_percent()
        );
    } else {
        println!("Image already optimized");
    }
    println!("Written to: {}", output_path.display());

    Ok(())
}

fn process_info(
    input: PathBuf,
    quality: Option<String>,
    settings: CompressArgs,
) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!("File does not exist: {}", input.display());
    }

    let config = settings.to_config();
    config.validate()?;

    let bytes = std::fs::read(&input)?;
    let compressor = Compressor::new(config);
    let (format, profile) = compressor.plan(&bytes, QualityHint::parse(quality.as_deref()))?;

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(bytes.len() as u64));
    println!("Format: {}", format);
    println!("Profile: {}", profile);
    if profile.is_fallback() {
        println!("Note: no dedicated profile, output will be JPEG");
    }

    Ok(())
}
