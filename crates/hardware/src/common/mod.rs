//! Common utilities and types used throughout the bring-up core.
//!
//! This module provides the building blocks shared by the sequencer, the
//! composer and the build/flash path. It includes:
//! 1. **Address Ranges:** Half-open bus intervals with overlap and containment tests.
//! 2. **Constants:** Size units, default flash layout and reset timing.
//! 3. **Error Handling:** The error taxonomy and the crate `Result` alias.

/// Half-open bus address intervals.
pub mod addr;

/// Board-wide constants.
pub mod constants;

/// Error types.
pub mod error;

pub use addr::AddrRange;
pub use constants::{KIB, MIB};
pub use error::{
    CompositionError, ConfigError, Error, FirmwareError, NetlistError, PlatformError,
    ProgrammerError, Result,
};
