//! # mpseq core
//!
//! Sequence-number reconciliation for multipath reliable byte streams.
//!
//! Every subflow numbers its bytes in its own sequence space, while the
//! application sees a single connection-level data sequence space. This crate
//! keeps the metadata that ties the two together:
//!
//! - [`SeqNum`]: 32-bit wrap-around sequence counter
//! - [`SequenceMapping`]: one contiguous range correspondence between the spaces
//! - [`MappingRegistry`]: the ordered, non-overlapping set of mappings of one subflow
//!
//! No payload bytes live here; the registry only answers translation and
//! membership queries over the mapping metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       MappingRegistry                           │
//! │   (per subflow: strict / auto insertion, translate, discard)    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                       SequenceMapping                           │
//! │   (data head + subflow head + length)                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                           SeqNum                                │
//! │   (RFC 1982 style circular arithmetic)                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use mpseq_core::{MappingRegistry, SeqNum, SequenceMapping};
//!
//! let mut registry = MappingRegistry::new();
//! let mapping = SequenceMapping::with_positions(SeqNum::new(1000), SeqNum::new(1), 10);
//! registry.insert_with_fixed_subflow_position(mapping).unwrap();
//!
//! assert_eq!(registry.translate(SeqNum::new(5)), Some(SeqNum::new(1004)));
//! assert_eq!(registry.translate(SeqNum::new(11)), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod mapping;
pub mod registry;
pub mod seq;

pub use config::RegistryConfig;
pub use error::{MappingError, Result};
pub use mapping::SequenceMapping;
pub use registry::{MappingRegistry, TransmitBuffer};
pub use seq::SeqNum;
