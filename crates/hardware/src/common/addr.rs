//! Bus address ranges.
//!
//! This module defines the half-open address interval used by the memory-map
//! composer. It provides the following:
//! 1. **Construction:** From an origin and a size, with overflow detection.
//! 2. **Set Relations:** Overlap and containment tests used by the registry invariants.
//! 3. **Formatting:** Hex display matching the way regions are logged and exported.

use std::fmt;

/// A half-open bus address interval `[start, end)`.
///
/// The end bound is held as `u128` so a region ending exactly at `2^64` is
/// representable and `origin + size` can never wrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddrRange {
    start: u64,
    end: u128,
}

impl AddrRange {
    /// Creates the interval `[origin, origin + size)`.
    ///
    /// # Arguments
    ///
    /// * `origin` - First address of the interval.
    /// * `size` - Length of the interval in bytes.
    #[inline]
    pub const fn new(origin: u64, size: u64) -> Self {
        Self {
            start: origin,
            end: origin as u128 + size as u128,
        }
    }

    /// Returns the first address of the interval.
    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Returns the exclusive end bound of the interval.
    #[inline]
    pub const fn end(&self) -> u128 {
        self.end
    }

    /// Returns the interval length in bytes.
    #[inline]
    pub const fn len(&self) -> u128 {
        self.end - self.start as u128
    }

    /// Returns `true` for a zero-length interval.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the interval ends beyond the 64-bit address space.
    #[inline]
    pub const fn exceeds_address_space(&self) -> bool {
        self.end > u64::MAX as u128 + 1
    }

    /// Returns `true` if both intervals share at least one address.
    ///
    /// Empty intervals never overlap anything.
    ///
    /// # Arguments
    ///
    /// * `other` - The interval to test against.
    pub const fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.start as u128) < other.end
            && (other.start as u128) < self.end
    }

    /// Returns `true` if `other` lies entirely within this interval.
    pub const fn contains_range(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if `addr` lies within this interval.
    pub const fn contains(&self, addr: u64) -> bool {
        self.start <= addr && (addr as u128) < self.end
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#010x}, {:#010x})", self.start, self.end)
    }
}
