//! Tower middleware layers for the operation pipeline.
//!
//! - [`metrics`]: Operation timing and outcome via `tracing` spans and `metrics`
//! - [`pipeline`]: Composes the layers around the route table

pub mod metrics;
pub mod pipeline;

pub use metrics::MetricsLayer;
pub use pipeline::{build_operation_pipeline, OperationPipeline};
