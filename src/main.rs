use anyhow::{bail, Context, Result};
use clap::Parser;
use imgbatch::cli::{Cli, Commands, IoArgs};
use imgbatch::config::Settings;
use imgbatch::processors::{BatchOptions, BatchProcessor, BatchResult, MetadataProcessor, OperationRequest};
use imgbatch::utils::{ensure_no_traversal, format_file_size, single_output_path};
use imgbatch::Quality;
use log::LevelFilter;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides the flag
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match &cli.command {
        Commands::Info { input } => process_info(input),
        Commands::Serve { listen } => {
            let listen = listen.clone().unwrap_or_else(|| settings.server.listen.clone());
            process_serve(settings, &listen)
        }
        command => match command.operation()? {
            Some((io, request)) => process_operation(&settings, io, request),
            None => bail!("Command has no image operation"),
        },
    }
}

fn process_operation(settings: &Settings, io: &IoArgs, request: OperationRequest) -> Result<()> {
    let operation = request.build(settings)?;
    let quality = io.quality.map(Quality::new).unwrap_or(settings.quality);

    if io.input.is_dir() {
        let output = io
            .output
            .as_deref()
            .context("--output is required when the input is a directory")?;

        let processor = BatchProcessor::new(BatchOptions {
            pattern: io.pattern.clone().unwrap_or_else(|| settings.pattern.clone()),
            recursive: io.recursive || settings.recursive,
            threads: io.threads.unwrap_or(settings.threads),
            quality,
            show_progress: true,
        })?;

        let result = processor.run(&io.input, output, operation.as_ref());
        print_batch_summary(operation.name(), output, &result);

        if let Some(message) = result.error_message {
            bail!(message);
        }
        if result.failure_count > 0 {
            bail!(
                "{} of {} files failed",
                result.failure_count,
                result.total_files
            );
        }
        return Ok(());
    }

    ensure_no_traversal(&io.input, "input")?;
    if let Some(output) = &io.output {
        ensure_no_traversal(output, "output")?;
    }
    if !io.input.is_file() {
        bail!("File does not exist: {}", io.input.display());
    }

    let output = single_output_path(operation.as_ref(), &io.input, io.output.as_deref());
    operation
        .process_one(&io.input, &output, quality)
        .with_context(|| format!("{} failed for {}", operation.name(), io.input.display()))?;

    println!("Saved {} result to: {}", operation.name(), output.display());
    Ok(())
}

fn print_batch_summary(name: &str, output: &Path, result: &BatchResult) {
    println!(
        "Batch {} complete: {} files, {} succeeded, {} failed. Output: {}",
        name,
        result.total_files,
        result.success_count,
        result.failure_count,
        output.display()
    );
    for outcome in result.outcomes.iter().filter(|o| !o.success) {
        println!(
            "  failed: {} ({})",
            outcome.source.display(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn process_info(input: &Path) -> Result<()> {
    let metadata = MetadataProcessor::new();
    let info = metadata.describe(input)?;
    let aspect_ratio = info.width as f64 / info.height as f64;

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(info.file_size));
    println!("Dimensions: {} x {} pixels", info.width, info.height);
    println!("Aspect Ratio: {:.2}:1", aspect_ratio);
    println!("Format: {}", info.format);
    println!("Has EXIF metadata: {}", info.has_exif);

    if info.has_exif {
        if let Ok(Some(exif)) = metadata.read_metadata(input) {
            println!("\n=== EXIF Metadata ===");
            for (tag, value) in metadata.extract_common_metadata(&exif) {
                println!("{}: {}", tag, value);
            }
        }
    }

    Ok(())
}

fn process_serve(settings: Settings, listen: &str) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let router = imgbatch::http::build_router(settings);
    runtime.block_on(imgbatch::http::serve(router, listen))?;
    Ok(())
}
