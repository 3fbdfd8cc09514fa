//! System-on-Chip memory map.
//!
//! This module organizes the address map of a composed SoC: regions and their
//! attributes, the bus slaves bound to them, the open-phase builder that
//! checks every invariant, and the frozen map handed to the generators.

/// Open-phase registry (`SocBusBuilder`).
pub mod builder;

/// Frozen memory map and address decoding.
pub mod interconnect;

/// Peripheral models bound to the bus.
pub mod peripherals;

/// Region type and access flags.
pub mod region;

/// Bus slave trait.
pub mod traits;

pub use builder::{DEFAULT_IO_REGION, DEFAULT_MEM_MAP, SocBusBuilder};
pub use interconnect::{MemoryMap, NamedRegion, SlaveBinding, WidthConversion};
pub use region::{Mode, SocRegion};
pub use traits::BusSlave;
