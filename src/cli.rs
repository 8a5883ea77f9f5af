//! Command-line interface definitions

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::CliOverrides;

/// Image cleanup: box-average denoising and threshold background removal
#[derive(Debug, Parser)]
#[command(name = "imgscrub", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Denoise an image file with a box average
    Denoise(FilterArgs),

    /// Remove a bright background from an image file
    #[command(name = "remove-bg")]
    RemoveBg(RemoveBgArgs),

    /// Start the HTTP server
    #[cfg(feature = "web")]
    Serve(ServeArgs),
}

/// Arguments for `denoise`
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Input image (format detected from content)
    pub input: PathBuf,

    /// Output path; its extension (jpg, jpeg, png) picks the format
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Kernel edge length (odd)
    #[arg(long)]
    pub kernel_size: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl FilterArgs {
    /// Output path, defaulting to `<stem>-denoised.jpg` next to the input
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling_path(&self.input, "denoised", "jpg"))
    }

    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            kernel_size: self.kernel_size,
            jpeg_quality: self.quality,
            ..Default::default()
        }
    }
}

/// Arguments for `remove-bg`
#[derive(Debug, Clone, Args)]
pub struct RemoveBgArgs {
    /// Input image (format detected from content)
    pub input: PathBuf,

    /// Output path; use .png to keep transparency
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Channel threshold (0-255); pixels above it on all channels are cleared
    #[arg(short, long)]
    pub threshold: Option<u8>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RemoveBgArgs {
    /// Output path, defaulting to `<stem>-nobg.png` next to the input
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling_path(&self.input, "nobg", "png"))
    }

    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            threshold: self.threshold,
            ..Default::default()
        }
    }
}

/// Arguments for `serve`
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Upload limit in megabytes
    #[arg(long)]
    pub upload_limit: Option<usize>,

    /// Stage uploads in this directory instead of memory
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Default background threshold (0-255)
    #[arg(short, long)]
    pub threshold: Option<u8>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            port: self.port,
            bind: self.bind.clone(),
            upload_limit_mb: self.upload_limit,
            staging_dir: self.staging_dir.clone(),
            threshold: self.threshold,
            ..Default::default()
        }
    }
}

fn sibling_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}-{}.{}", stem, suffix, ext))
}
