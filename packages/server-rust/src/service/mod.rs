//! Operation routing and execution framework.
//!
//! 1. **Operations** (`operation`): typed requests with their call context
//! 2. **Routing** (`router`): route table from operation id to route function
//! 3. **Domain** (`domain`): attempt routes and the in-memory attempt handler
//! 4. **Middleware** (`middleware`): Tower layers around the router (metrics)

pub mod config;
pub mod domain;
pub mod middleware;
pub mod operation;
pub mod router;

// Re-export key types for convenient access.
pub use config::{Availability, ServerConfig};
pub use domain::{build_attempt_router, InMemoryAttemptHandler};
pub use middleware::{build_operation_pipeline, OperationPipeline};
pub use operation::{Operation, OperationContext, OperationResponse};
pub use router::OperationRouter;
