//! Per-subflow registry of sequence mappings.
//!
//! The registry keeps mappings sorted by data head and guarantees that no two
//! of them overlap in either sequence space. It relies on one more property
//! that it does not check unless asked to: sorting by data head and sorting
//! by subflow head give the same order. A subflow sends and receives bytes
//! in increasing subflow order and mappings are assigned in that same order,
//! so this holds for a single subflow. [`RegistryConfig::enforce_subflow_order`]
//! turns the check on.
//!
//! The registry is not synchronized. It belongs to one subflow and must be
//! driven from that subflow's control path; hosts with several threads wrap
//! it in their own lock.

use std::fmt;

use crate::config::RegistryConfig;
use crate::error::{MappingError, Result};
use crate::mapping::SequenceMapping;
use crate::seq::SeqNum;

/// Read-only view of a subflow transmit buffer
///
/// The registry asks for the head position only when it holds no mapping
/// yet, to decide where the first auto-assigned mapping starts.
pub trait TransmitBuffer {
    /// Oldest subflow sequence number not yet retired from the buffer
    fn head_position(&self) -> SeqNum;
}

/// A bare sequence number acts as a buffer whose head never moves.
impl TransmitBuffer for SeqNum {
    fn head_position(&self) -> SeqNum {
        *self
    }
}

/// Ordered, non-overlapping set of mappings for one subflow
///
/// The transmit buffer is borrowed, not owned: it must outlive the registry,
/// which matches a registry living inside its subflow.
///
/// # Example
///
/// ```
/// use mpseq_core::{MappingRegistry, SeqNum, SequenceMapping};
///
/// let tx_head = SeqNum::new(1);
/// let mut registry = MappingRegistry::with_transmit_buffer(&tx_head);
///
/// let mut mapping = SequenceMapping::new();
/// mapping.configure(SeqNum::new(100), 10);
/// let mapping = registry.insert_with_auto_assigned_subflow_position(mapping).unwrap();
///
/// assert_eq!(mapping.subflow_head(), SeqNum::new(1));
/// assert_eq!(registry.next_unmapped_subflow_position().unwrap(), SeqNum::new(11));
/// ```
pub struct MappingRegistry<'a> {
    /// Mappings sorted by data head
    mappings: Vec<SequenceMapping>,
    /// Source of the first unmapped position while the registry is empty
    tx_buffer: Option<&'a dyn TransmitBuffer>,
    /// Registry tunables
    config: RegistryConfig,
}

impl<'a> MappingRegistry<'a> {
    /// Create an empty registry with no transmit buffer bound
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            mappings: Vec::new(),
            tx_buffer: None,
            config,
        }
    }

    /// Create an empty registry bound to a transmit buffer
    #[must_use]
    pub fn with_transmit_buffer(tx_buffer: &'a dyn TransmitBuffer) -> Self {
        let mut registry = Self::new();
        registry.bind_transmit_buffer(tx_buffer);
        registry
    }

    /// Bind the transmit buffer used for auto-assigned insertion
    pub fn bind_transmit_buffer(&mut self, tx_buffer: &'a dyn TransmitBuffer) {
        self.tx_buffer = Some(tx_buffer);
    }

    /// Whether a transmit buffer is bound
    #[must_use]
    pub fn has_transmit_buffer(&self) -> bool {
        self.tx_buffer.is_some()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Insert a mapping whose subflow position is already fixed
    ///
    /// Used when the subflow position is dictated from outside, typically by
    /// a mapping option decoded from received data.
    ///
    /// # Errors
    ///
    /// - [`MappingError::Unconfigured`] if the mapping has zero length
    /// - [`MappingError::Conflict`] if it overlaps a stored mapping in either space
    /// - [`MappingError::OrderViolation`] if order enforcement is on and the
    ///   subflow order disagrees with the data order
    ///
    /// The registry is unchanged on error.
    pub fn insert_with_fixed_subflow_position(&mut self, mapping: SequenceMapping) -> Result<()> {
        if !mapping.is_configured() {
            return Err(MappingError::Unconfigured);
        }

        let conflict = self
            .mappings
            .iter()
            .find(|existing| {
                **existing == mapping || existing.overlaps(&mapping) || mapping.overlaps(existing)
            })
            .copied();

        if let Some(existing) = conflict {
            tracing::warn!("Mapping {} intersects with {}", mapping, existing);
            if self.config.dump_on_conflict {
                self.dump();
            }
            return Err(MappingError::Conflict {
                candidate: mapping,
                existing,
            });
        }

        let index = self
            .mappings
            .partition_point(|m| m.data_head() < mapping.data_head());

        if self.config.enforce_subflow_order {
            self.check_subflow_order(index, &mapping)?;
        }

        self.mappings.insert(index, mapping);
        tracing::debug!("Inserted mapping {} ({} total)", mapping, self.mappings.len());

        Ok(())
    }

    /// Anchor a mapping at the next unmapped subflow position, then insert it
    ///
    /// This is the send path: the data range of freshly queued bytes is known
    /// and the subflow position follows whatever was mapped last. Returns the
    /// mapping with its subflow position filled in.
    ///
    /// # Errors
    ///
    /// - [`MappingError::PreconditionViolation`] if no transmit buffer is bound
    /// - any error of [`insert_with_fixed_subflow_position`](Self::insert_with_fixed_subflow_position)
    pub fn insert_with_auto_assigned_subflow_position(
        &mut self,
        mut mapping: SequenceMapping,
    ) -> Result<SequenceMapping> {
        if self.tx_buffer.is_none() {
            return Err(MappingError::PreconditionViolation("transmit buffer not bound"));
        }

        let subflow_head = self.next_unmapped_subflow_position()?;
        mapping.assign_subflow_position(subflow_head);
        self.insert_with_fixed_subflow_position(mapping)?;

        Ok(mapping)
    }

    /// First subflow sequence number not covered by a mapping yet
    ///
    /// With mappings stored this is one past the subflow tail of the mapping
    /// with the greatest data head. That equals the most recently mapped
    /// subflow byte only while data order and subflow order coincide; the
    /// value is not cross-checked. With no mapping stored, the transmit
    /// buffer head is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::PreconditionViolation`] if the registry is
    /// empty and no transmit buffer is bound.
    pub fn next_unmapped_subflow_position(&self) -> Result<SeqNum> {
        match self.mappings.last() {
            Some(last) => Ok(last.subflow_tail() + 1),
            None => self
                .tx_buffer
                .map(|buffer| buffer.head_position())
                .ok_or(MappingError::PreconditionViolation(
                    "transmit buffer not bound",
                )),
        }
    }

    /// Lowest subflow head among the stored mappings
    #[must_use]
    pub fn first_mapped_subflow_position(&self) -> Option<SeqNum> {
        self.mappings.first().map(SequenceMapping::subflow_head)
    }

    /// Translate a subflow sequence number into the data space
    ///
    /// Returns `None` when no stored mapping covers `ssn`.
    #[must_use]
    pub fn translate(&self, ssn: SeqNum) -> Option<SeqNum> {
        self.find_mapping_for_subflow_position(ssn)
            .and_then(|mapping| mapping.translate(ssn))
    }

    /// Mapping whose subflow range contains `ssn`
    ///
    /// At most one mapping can match since stored ranges never overlap.
    #[must_use]
    pub fn find_mapping_for_subflow_position(&self, ssn: SeqNum) -> Option<&SequenceMapping> {
        self.mappings.iter().find(|m| m.contains_subflow(ssn))
    }

    /// Remove every mapping whose subflow tail is below `watermark`
    ///
    /// Mappings reaching the watermark or beyond are kept. Returns the number
    /// of mappings removed.
    pub fn discard_mappings_below(&mut self, watermark: SeqNum) -> usize {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.subflow_tail() >= watermark);
        let removed = before - self.mappings.len();

        if removed > 0 {
            tracing::debug!(
                "Discarded {} mappings below SSN {} ({} remaining)",
                removed,
                watermark,
                self.mappings.len()
            );
        }

        removed
    }

    /// Remove every mapping whose data tail is below `watermark`
    ///
    /// Data-space counterpart of [`discard_mappings_below`](Self::discard_mappings_below).
    pub fn discard_mappings_below_data(&mut self, watermark: SeqNum) -> usize {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.data_tail() >= watermark);
        let removed = before - self.mappings.len();

        if removed > 0 {
            tracing::debug!(
                "Discarded {} mappings below DSN {} ({} remaining)",
                removed,
                watermark,
                self.mappings.len()
            );
        }

        removed
    }

    /// Drop all mappings
    pub fn clear(&mut self) {
        self.mappings.clear();
    }

    /// Number of stored mappings
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether no mapping is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Stored mappings in data order
    pub fn iter(&self) -> std::slice::Iter<'_, SequenceMapping> {
        self.mappings.iter()
    }

    /// Human-readable listing of all mappings in data order
    ///
    /// The listing is also emitted at debug level.
    pub fn dump(&self) -> String {
        let listing = self.to_string();
        tracing::debug!("{}", listing);
        listing
    }

    fn check_subflow_order(&self, index: usize, candidate: &SequenceMapping) -> Result<()> {
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.mappings.get(i)) {
            if prev.subflow_head() >= candidate.subflow_head() {
                tracing::warn!("Mapping {} is out of subflow order after {}", candidate, prev);
                return Err(MappingError::OrderViolation {
                    candidate: *candidate,
                    neighbour: *prev,
                });
            }
        }

        if let Some(next) = self.mappings.get(index) {
            if next.subflow_head() <= candidate.subflow_head() {
                tracing::warn!("Mapping {} is out of subflow order before {}", candidate, next);
                return Err(MappingError::OrderViolation {
                    candidate: *candidate,
                    neighbour: *next,
                });
            }
        }

        Ok(())
    }
}

impl Default for MappingRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("mappings", &self.mappings)
            .field("tx_buffer_bound", &self.tx_buffer.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl fmt::Display for MappingRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== Dumping list of mappings ====")?;
        for mapping in &self.mappings {
            writeln!(f, "{mapping}")?;
        }
        write!(f, "==== End of dump ====")
    }
}

impl<'r> IntoIterator for &'r MappingRegistry<'_> {
    type Item = &'r SequenceMapping;
    type IntoIter = std::slice::Iter<'r, SequenceMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}
