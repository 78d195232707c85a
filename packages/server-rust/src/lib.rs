//! Attempt API server: axum endpoints for the attempt resource, dispatched
//! through a route table and the classifying execution wrapper.

pub mod network;
pub mod service;

#[cfg(test)]
mod test_support;

pub use network::{NetworkConfig, NetworkModule};
pub use service::{build_attempt_router, build_operation_pipeline, ServerConfig};
