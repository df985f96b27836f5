//! Error types for mapping insertion and registry queries.

use thiserror::Error;

use crate::mapping::SequenceMapping;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MappingError>;

/// Registry errors
///
/// A lookup that finds nothing is not an error: queries return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Candidate range overlaps a stored mapping in either sequence space
    #[error("mapping conflict: {candidate} intersects {existing}")]
    Conflict {
        /// Mapping that was rejected
        candidate: SequenceMapping,
        /// Stored mapping it collides with
        existing: SequenceMapping,
    },

    /// A required collaborator or state is missing
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),

    /// Zero-length mapping handed to insertion
    #[error("mapping is not configured (zero length)")]
    Unconfigured,

    /// Subflow order disagrees with data order (only when order enforcement is on)
    #[error("subflow order violation: {candidate} is out of order with {neighbour}")]
    OrderViolation {
        /// Mapping that was rejected
        candidate: SequenceMapping,
        /// Stored neighbour whose relative order differs between the two spaces
        neighbour: SequenceMapping,
    },
}
