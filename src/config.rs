//! Configuration file support
//!
//! Settings are read from a TOML file and then overridden by command-line
//! flags. Every field has a default, so a missing file or a partial file is
//! fine.
//!
//! ```toml
//! [server]
//! port = 8080
//! bind = "127.0.0.1"
//! upload_limit_mb = 50
//! staging_dir = "/var/tmp/imgscrub"
//!
//! [filters]
//! threshold = 180
//! kernel_size = 3
//! jpeg_quality = 75
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::{EncodeOptions, DEFAULT_JPEG_QUALITY};
use crate::filters::{DenoiseOptions, MatteOptions, DEFAULT_KERNEL_SIZE, DEFAULT_THRESHOLD};
use crate::pipeline::PipelineOptions;

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name
pub const APP_DIR_NAME: &str = "imgscrub";

/// Config error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: u16,
    pub bind: String,
    /// Maximum request body in megabytes
    pub upload_limit_mb: usize,
    /// Directory for staged uploads; uploads stay in memory when unset
    pub staging_dir: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: "127.0.0.1".to_string(),
            upload_limit_mb: 50,
            staging_dir: None,
        }
    }
}

/// `[filters]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub threshold: u8,
    pub kernel_size: u32,
    pub jpeg_quality: u8,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            kernel_size: DEFAULT_KERNEL_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub filters: FilterSection,
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub upload_limit_mb: Option<usize>,
    pub staging_dir: Option<PathBuf>,
    pub threshold: Option<u8>,
    pub kernel_size: Option<u32>,
    pub jpeg_quality: Option<u8>,
}

impl Config {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check values serde cannot express
    pub fn validate(&self) -> Result<()> {
        DenoiseOptions {
            kernel_size: self.filters.kernel_size,
        }
        .validate()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !(1..=100).contains(&self.filters.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality {} is outside 1-100",
                self.filters.jpeg_quality
            )));
        }
        if self.server.upload_limit_mb == 0 {
            return Err(ConfigError::Invalid("upload_limit_mb must be positive".to_string()));
        }
        Ok(())
    }

    /// Apply command-line overrides (CLI takes precedence)
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(bind) = &cli.bind {
            self.server.bind = bind.clone();
        }
        if let Some(limit) = cli.upload_limit_mb {
            self.server.upload_limit_mb = limit;
        }
        if let Some(dir) = &cli.staging_dir {
            self.server.staging_dir = Some(dir.clone());
        }
        if let Some(threshold) = cli.threshold {
            self.filters.threshold = threshold;
        }
        if let Some(size) = cli.kernel_size {
            self.filters.kernel_size = size;
        }
        if let Some(quality) = cli.jpeg_quality {
            self.filters.jpeg_quality = quality;
        }
        self
    }

    /// Filter settings as pipeline options
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            denoise: DenoiseOptions {
                kernel_size: self.filters.kernel_size,
            },
            matte: MatteOptions {
                threshold: self.filters.threshold,
            },
            encode: EncodeOptions::default().with_jpeg_quality(self.filters.jpeg_quality),
        }
    }

    /// Upload limit in bytes
    pub fn upload_limit_bytes(&self) -> usize {
        self.server.upload_limit_mb.saturating_mul(1024 * 1024)
    }
}
