//! Single range correspondence between subflow and data sequence spaces.
//!
//! A mapping says that `length` consecutive subflow bytes starting at
//! `subflow_head` carry the data bytes starting at `data_head`. The sender
//! fixes the data side first and learns the subflow side when the bytes are
//! queued on a subflow; the receiver decodes both sides from the wire option.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::seq::SeqNum;

/// Correspondence of one contiguous byte range across both sequence spaces
///
/// Equality compares `length` and `data_head` only; ordering compares
/// `data_head` only. The subflow anchor takes part in neither. Two mappings
/// sharing a data head but not a length are unordered.
///
/// # Example
///
/// ```
/// use mpseq_core::{SeqNum, SequenceMapping};
///
/// let mut mapping = SequenceMapping::new();
/// mapping.configure(SeqNum::new(100), 50);
/// mapping.assign_subflow_position(SeqNum::new(1));
///
/// assert_eq!(mapping.data_tail(), SeqNum::new(149));
/// assert_eq!(mapping.translate(SeqNum::new(2)), Some(SeqNum::new(101)));
/// ```
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SequenceMapping {
    /// First data-level sequence number covered
    data_head: SeqNum,
    /// First subflow-level sequence number covered
    subflow_head: SeqNum,
    /// Number of bytes covered (0 = unconfigured)
    length: u16,
}

impl SequenceMapping {
    /// Create an unconfigured mapping
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data_head: SeqNum::new(0),
            subflow_head: SeqNum::new(0),
            length: 0,
        }
    }

    /// Create a mapping with both anchors known
    ///
    /// This is the receive path, where a mapping option decoded from the wire
    /// already carries the subflow position.
    #[must_use]
    pub const fn with_positions(data_head: SeqNum, subflow_head: SeqNum, length: u16) -> Self {
        Self {
            data_head,
            subflow_head,
            length,
        }
    }

    /// Set the data anchor and the size
    ///
    /// Overwrites any previous values. Meant for construction time, not for
    /// reshaping a mapping that is already stored in a registry.
    pub fn configure(&mut self, data_head: SeqNum, length: u16) {
        tracing::trace!(%data_head, length, "configuring mapping");
        self.data_head = data_head;
        self.length = length;
    }

    /// Set the data anchor only
    pub fn set_data_head(&mut self, data_head: SeqNum) {
        tracing::trace!(%data_head, "setting mapping data head");
        self.data_head = data_head;
    }

    /// Set the size only
    pub fn set_length(&mut self, length: u16) {
        tracing::trace!(length, "setting mapping length");
        self.length = length;
    }

    /// Anchor the mapping in the subflow space
    ///
    /// Callers invoke this once, before the mapping is inserted.
    pub fn assign_subflow_position(&mut self, subflow_head: SeqNum) {
        tracing::trace!(%subflow_head, "mapping to subflow position");
        self.subflow_head = subflow_head;
    }

    /// First data-level sequence number
    #[must_use]
    pub const fn data_head(&self) -> SeqNum {
        self.data_head
    }

    /// First subflow-level sequence number
    #[must_use]
    pub const fn subflow_head(&self) -> SeqNum {
        self.subflow_head
    }

    /// Number of bytes covered
    #[must_use]
    pub const fn length(&self) -> u16 {
        self.length
    }

    /// Whether the mapping covers at least one byte
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.length > 0
    }

    /// Last data-level sequence number (inclusive)
    #[must_use]
    pub fn data_tail(&self) -> SeqNum {
        self.data_head + u32::from(self.length) - 1u32
    }

    /// Last subflow-level sequence number (inclusive)
    #[must_use]
    pub fn subflow_tail(&self) -> SeqNum {
        self.subflow_head + u32::from(self.length) - 1u32
    }

    /// Whether `ssn` lies in `[subflow_head, subflow_tail]`
    #[must_use]
    pub fn contains_subflow(&self, ssn: SeqNum) -> bool {
        self.subflow_head <= ssn && self.subflow_tail() >= ssn
    }

    /// Whether `dsn` lies in `[data_head, data_tail]`
    #[must_use]
    pub fn contains_data(&self, dsn: SeqNum) -> bool {
        self.data_head <= dsn && self.data_tail() >= dsn
    }

    /// Translate a subflow sequence number into the data space
    ///
    /// Returns `None` when `ssn` is outside the mapped subflow range. Ranges
    /// may straddle the 2^32 boundary; positions 2^31 or more away from the
    /// head are unordered relative to it and never match.
    #[must_use]
    pub fn translate(&self, ssn: SeqNum) -> Option<SeqNum> {
        if !self.contains_subflow(ssn) {
            return None;
        }

        let offset = ssn.distance_from(self.subflow_head) as u32;
        Some(self.data_head + offset)
    }

    /// Whether any endpoint of `other` falls inside this mapping
    ///
    /// Both spaces are checked independently: a pair that collides in one
    /// space but not in the other is still an overlap.
    #[must_use]
    pub fn overlaps(&self, other: &SequenceMapping) -> bool {
        self.contains_subflow(other.subflow_head)
            || self.contains_subflow(other.subflow_tail())
            || self.contains_data(other.data_head)
            || self.contains_data(other.data_tail())
    }
}

impl PartialEq for SequenceMapping {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.data_head == other.data_head
    }
}

impl Eq for SequenceMapping {}

impl PartialOrd for SequenceMapping {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.data_head.partial_cmp(&other.data_head) {
            // Same head, different length: not equal, so not `Equal` either
            Some(Ordering::Equal) if self.length != other.length => None,
            ordering => ordering,
        }
    }
}

impl fmt::Display for SequenceMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DSN [{}-{}] mapped to SSN [{}-{}]",
            self.data_head,
            self.data_tail(),
            self.subflow_head,
            self.subflow_tail()
        )
    }
}
