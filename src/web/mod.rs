//! Web server module for imgscrub
//!
//! Exposes both filters over HTTP.
//!
//! # Endpoints
//!
//! - `POST /api/denoise` - multipart field `image`, answers with a JPEG
//! - `POST /api/remove-background` - multipart field `image` and optional
//!   `threshold`, answers with a PNG
//! - `GET /api/health` - liveness and version
//! - `GET /api/stats` - request counters
//!
//! `POST /upload` and `POST /bg` are kept as aliases of the two filter
//! endpoints for older clients.
//!
//! # Usage
//!
//! ```bash
//! imgscrub serve --port 8080
//! curl -F image=@photo.png http://127.0.0.1:8080/api/remove-background -o cut.png
//! ```

mod metrics;
mod routes;
mod server;
mod staging;

pub use metrics::{ActiveRequest, MetricsCollector, StatsResponse};
pub use routes::{AppError, AppState};
pub use server::{ServerConfig, WebServer};

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default upload limit in bytes (50 MB)
pub const DEFAULT_UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Multipart field carrying an optional matte threshold
pub const THRESHOLD_FIELD: &str = "threshold";
