//! Domain routes and handlers.

pub mod attempt;
pub mod memory;

pub use attempt::build_attempt_router;
pub use memory::{AttemptRecord, InMemoryAttemptHandler};
