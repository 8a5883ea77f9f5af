//! imgscrub - image cleanup over HTTP
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use imgscrub::{
    exit_codes, pipeline, CliOverrides, Cli, Commands, Config, FilterArgs, FilterKind,
    PipelineError, RemoveBgArgs,
};

#[cfg(feature = "web")]
use imgscrub::{ServeArgs, ServerConfig, WebServer};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Denoise(args) => run_denoise(args),
        Commands::RemoveBg(args) => run_remove_bg(args),
        #[cfg(feature = "web")]
        Commands::Serve(args) => run_serve(args),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<imgscrub::ConfigError>().is_some() {
        return exit_codes::INVALID_ARGS;
    }
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::InputNotFound(_)) => exit_codes::INPUT_NOT_FOUND,
        Some(PipelineError::Codec(imgscrub::CodecError::UnsupportedFormat(_))) => {
            exit_codes::INVALID_ARGS
        }
        Some(_) => exit_codes::PROCESSING_ERROR,
        None => exit_codes::GENERAL_ERROR,
    }
}

/// Load the config file if given, otherwise the default location, then apply CLI flags
fn load_config(path: Option<&Path>, overrides: &CliOverrides) -> anyhow::Result<Config> {
    let file_config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let config = file_config.merge_with_cli(overrides);
    config.validate()?;
    Ok(config)
}

// ============ File Commands ============

fn run_denoise(args: &FilterArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), &args.overrides())?;
    run_file(&args.input, &args.output_path(), FilterKind::Denoise, &config)
}

fn run_remove_bg(args: &RemoveBgArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), &args.overrides())?;
    run_file(&args.input, &args.output_path(), FilterKind::RemoveBackground, &config)
}

fn run_file(input: &Path, output: &Path, kind: FilterKind, config: &Config) -> anyhow::Result<()> {
    let processed = pipeline::process_file(input, output, kind, &config.pipeline_options())
        .with_context(|| format!("{} failed for {}", kind, input.display()))?;

    println!(
        "{}: {} ({}x{}, {} ms)",
        kind,
        output.display(),
        processed.width,
        processed.height,
        processed.elapsed_ms
    );
    Ok(())
}

// ============ Serve Command ============

#[cfg(feature = "web")]
fn run_serve(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), &args.overrides())?;
    let server_config = ServerConfig::from_config(&config);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(server_config.workers.max(1))
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    rt.block_on(async {
        let server = WebServer::with_config(server_config);
        server.run().await.map_err(|e| anyhow::anyhow!(e))
    })
}
