//! Common types for the filters module

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Filter error types
///
/// Filters are total over rasters; only option validation can fail.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid kernel size {0}: must be odd and at least 1")]
    InvalidKernelSize(u32),
}

pub type Result<T> = std::result::Result<T, FilterError>;

/// The filter a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// Box-average denoise, encoded as JPEG
    Denoise,
    /// Threshold matte, encoded as PNG
    RemoveBackground,
}

impl FilterKind {
    /// Short name used in logs, metrics and output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Denoise => "denoise",
            FilterKind::RemoveBackground => "remove-background",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
