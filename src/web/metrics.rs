//! Metrics collection for server monitoring
//!
//! Lock-free counters updated by the filter handlers and reported by
//! `GET /api/stats`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::filters::FilterKind;

/// Request statistics
#[derive(Debug, Clone, Serialize)]
pub struct RequestStatistics {
    /// Total filter requests received
    pub total_requests: u64,
    /// Requests answered with an image
    pub completed_requests: u64,
    /// Requests answered with an error
    pub failed_requests: u64,
    /// Requests currently being processed
    pub active_requests: u64,
    /// Average processing time in milliseconds
    pub avg_processing_ms: f64,
    /// Total pixels filtered
    pub total_pixels: u64,
}

/// Per-filter request counts
#[derive(Debug, Clone, Serialize)]
pub struct FilterStatistics {
    pub denoise: u64,
    pub remove_background: u64,
}

/// Server information
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Server start time (ISO 8601)
    pub started_at: String,
}

/// Complete statistics response
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub server: ServerInfo,
    pub requests: RequestStatistics,
    pub filters: FilterStatistics,
}

/// Metrics collector with atomic counters for thread-safe updates
#[derive(Debug)]
pub struct MetricsCollector {
    started_at: Instant,
    started_at_str: String,
    total_requests: AtomicU64,
    completed_requests: AtomicU64,
    failed_requests: AtomicU64,
    active_requests: AtomicU64,
    /// Total processing time of completed requests in milliseconds
    total_processing_ms: AtomicU64,
    total_pixels: AtomicU64,
    denoise_requests: AtomicU64,
    background_requests: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            started_at_str: chrono::Utc::now().to_rfc3339(),
            total_requests: AtomicU64::new(0),
            completed_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            total_processing_ms: AtomicU64::new(0),
            total_pixels: AtomicU64::new(0),
            denoise_requests: AtomicU64::new(0),
            background_requests: AtomicU64::new(0),
        }
    }

    /// Record a request being started
    ///
    /// The request stays active until the returned guard is dropped, so a
    /// handler cancelled by a client disconnect still releases it.
    pub fn record_started(&self, kind: FilterKind) -> ActiveRequest<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        match kind {
            FilterKind::Denoise => self.denoise_requests.fetch_add(1, Ordering::Relaxed),
            FilterKind::RemoveBackground => self.background_requests.fetch_add(1, Ordering::Relaxed),
        };
        ActiveRequest { metrics: self }
    }

    fn record_completed(&self, duration_ms: u64, pixels: u64) {
        self.completed_requests.fetch_add(1, Ordering::Relaxed);
        self.total_processing_ms.fetch_add(duration_ms, Ordering::Relaxed);
        self.total_pixels.fetch_add(pixels, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Seconds since the collector was created
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Snapshot every counter
    pub fn snapshot(&self, version: &str) -> StatsResponse {
        let completed = self.completed_requests.load(Ordering::Relaxed);
        let total_ms = self.total_processing_ms.load(Ordering::Relaxed);
        let avg_processing_ms = if completed > 0 {
            total_ms as f64 / completed as f64
        } else {
            0.0
        };

        StatsResponse {
            server: ServerInfo {
                version: version.to_string(),
                uptime_seconds: self.uptime_seconds(),
                started_at: self.started_at_str.clone(),
            },
            requests: RequestStatistics {
                total_requests: self.total_requests.load(Ordering::Relaxed),
                completed_requests: completed,
                failed_requests: self.failed_requests.load(Ordering::Relaxed),
                active_requests: self.active_requests.load(Ordering::Relaxed),
                avg_processing_ms,
                total_pixels: self.total_pixels.load(Ordering::Relaxed),
            },
            filters: FilterStatistics {
                denoise: self.denoise_requests.load(Ordering::Relaxed),
                remove_background: self.background_requests.load(Ordering::Relaxed),
            },
        }
    }
}

/// An in-flight request; dropping it decrements the active count
#[derive(Debug)]
#[must_use = "the request is counted as active until this guard is dropped"]
pub struct ActiveRequest<'a> {
    metrics: &'a MetricsCollector,
}

impl ActiveRequest<'_> {
    /// Finish with an image
    pub fn completed(self, duration_ms: u64, pixels: u64) {
        self.metrics.record_completed(duration_ms, pixels);
    }

    /// Finish with an error
    pub fn failed(self) {
        self.metrics.record_failed();
    }
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.metrics.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
