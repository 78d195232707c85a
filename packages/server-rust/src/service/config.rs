use std::collections::HashMap;

use attempt_api_core::operation_ids;

/// Why an operation is answered with `not_implemented`.
///
/// Drives monitoring: calls to a removed operation are expected noise from
/// old clients, calls to a pending one mean a caller is ahead of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The feature was retired and will not come back.
    Removed,
    /// The feature is planned but not built yet.
    Pending,
}

impl Availability {
    #[must_use]
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// Server-level configuration for the operation routing framework.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Unique identifier for this server node, attached to log output.
    pub node_id: String,
    /// Availability of operations this build does not implement, keyed by
    /// operation id.
    pub unsupported: HashMap<&'static str, Availability>,
}

impl ServerConfig {
    /// Availability recorded for `operation`, if it is known to be unsupported.
    #[must_use]
    pub fn availability(&self, operation: &str) -> Option<Availability> {
        self.unsupported.get(operation).copied()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            unsupported: HashMap::from([(operation_ids::SAVE_STATS, Availability::Removed)]),
        }
    }
}
