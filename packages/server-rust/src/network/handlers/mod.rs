//! HTTP handler definitions for the attempt API server.
//!
//! Defines `AppState` (the shared state carried through axum extractors) and
//! re-exports every handler for router assembly.

pub mod attempt;
pub mod failure;
pub mod health;

pub use attempt::{save_stats_handler, set_workflow_in_attempt_handler};
pub use failure::ErrorResponse;
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::service::{OperationPipeline, ServerConfig};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Everything is behind `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Operation pipeline every attempt endpoint dispatches into.
    pub pipeline: OperationPipeline,
    /// Service-level configuration (availability of unsupported operations).
    pub server_config: Arc<ServerConfig>,
    /// Health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
    call_ids: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(
        pipeline: OperationPipeline,
        server_config: Arc<ServerConfig>,
        shutdown: Arc<ShutdownController>,
    ) -> Self {
        Self {
            pipeline,
            server_config,
            shutdown,
            start_time: Instant::now(),
            call_ids: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns a call id unique within this process.
    pub fn next_call_id(&self) -> u64 {
        self.call_ids.fetch_add(1, Ordering::Relaxed)
    }
}
