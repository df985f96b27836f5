//! Registry configuration

use serde::{Deserialize, Serialize};

/// Tunables for a [`MappingRegistry`](crate::MappingRegistry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reject insertions whose subflow order disagrees with their data order
    ///
    /// Off by default: a subflow emits bytes in increasing order, so the two
    /// orders coincide for well-behaved callers.
    pub enforce_subflow_order: bool,

    /// Log the whole registry when an insertion conflicts
    pub dump_on_conflict: bool,
}

impl RegistryConfig {
    /// Configuration with subflow order enforcement turned on
    #[must_use]
    pub fn strict() -> Self {
        Self {
            enforce_subflow_order: true,
            ..Self::default()
        }
    }
}
