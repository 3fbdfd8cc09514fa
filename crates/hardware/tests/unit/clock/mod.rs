//! # Clock/Reset Tests

/// Nexus and 7-series CRG bring-up.
pub mod crg;
