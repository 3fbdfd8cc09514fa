//! Bus slave trait for memory-mapped peripherals.
//!
//! This module defines the `BusSlave` trait implemented by every component the
//! composer binds to an address region. It provides:
//! 1. **Identification:** `name` and `kind` for logs and exported maps.
//! 2. **Interface shape:** Data width, used for width-converter bookkeeping.
//! 3. **Capacity:** The number of bytes the slave decodes.
//!
//! All implementors must be `Send + Sync` so a finalized memory map can be shared across threads.

use std::fmt;

/// A peripheral exposing a memory-mapped slave port.
pub trait BusSlave: fmt::Debug + Send + Sync {
    /// Short model name (e.g. `"MT25QL128"`).
    fn name(&self) -> &str;

    /// Peripheral class used in exported maps (e.g. `"spiflash"`, `"lram"`).
    fn kind(&self) -> &'static str;

    /// Data width of the slave port in bits.
    fn data_width(&self) -> u32 {
        32
    }

    /// Bytes decoded by the slave.
    fn size(&self) -> u64;
}
