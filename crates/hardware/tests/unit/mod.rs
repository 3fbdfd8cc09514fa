//! # Unit Components
//!
//! This module serves as the central hub for the unit tests of the bring-up
//! core, organized the way the crate itself is.


/// Unit tests for the clock/reset sequencer.
///
/// This module aggregates tests for:
/// - Netlist construction and elaboration checks.
/// - Reset synchronizers and PLL planning.
/// - The Nexus and 7-series CRG bring-up sequences.
pub mod clock;


/// Unit tests for configuration parsing and validation.
pub mod config;

/// Unit tests for firmware placement checks.
pub mod firmware;

/// Unit tests for platforms, devices and toolchains.
pub mod platform;

/// Unit tests for the openFPGALoader command contract.
pub mod programmer;

/// Unit tests for the memory-map composer.
///
/// This module organizes tests for region registration, allocation,
/// derivation and the frozen map.
pub mod soc;
