//! # SoC Memory Map Tests


/// Frozen map lookups, decoding and export.
pub mod memory_map;

/// Region access flags.
pub mod region;
