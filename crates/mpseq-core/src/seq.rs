//! 32-bit wrap-around sequence numbers.
//!
//! Ordering follows RFC 1982 serial number arithmetic: `a < b` when the
//! signed distance from `a` to `b` is positive. Two values exactly 2^31
//! apart are unordered, which is why [`SeqNum`] implements `PartialOrd`
//! but not `Ord`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Sequence number in a 32-bit circular space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeqNum(u32);

impl SeqNum {
    /// Create a sequence number from its raw value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw 32-bit value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Signed distance from `other` to `self`
    ///
    /// Positive when `self` is ahead of `other` in circular order.
    #[must_use]
    pub const fn distance_from(self, other: SeqNum) -> i32 {
        self.0.wrapping_sub(other.0) as i32
    }
}

impl From<u32> for SeqNum {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<SeqNum> for u32 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl PartialOrd for SeqNum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.distance_from(*other) {
            // Half the space apart: neither value is ahead of the other
            i32::MIN => None,
            distance => Some(distance.cmp(&0)),
        }
    }
}

impl Add<u32> for SeqNum {
    type Output = SeqNum;

    fn add(self, rhs: u32) -> SeqNum {
        SeqNum(self.0.wrapping_add(rhs))
    }
}

impl AddAssign<u32> for SeqNum {
    fn add_assign(&mut self, rhs: u32) {
        self.0 = self.0.wrapping_add(rhs);
    }
}

impl Sub<u32> for SeqNum {
    type Output = SeqNum;

    fn sub(self, rhs: u32) -> SeqNum {
        SeqNum(self.0.wrapping_sub(rhs))
    }
}

impl Sub<SeqNum> for SeqNum {
    type Output = i32;

    fn sub(self, rhs: SeqNum) -> i32 {
        self.distance_from(rhs)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
