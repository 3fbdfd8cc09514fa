//! Clock and reset generation.
//!
//! This module models how a raw oscillator becomes a stable system clock. It contains:
//! 1. **Netlist:** Named signals, combinational and synchronous assignments, primitives.
//! 2. **Simulator:** Edge-driven evaluation with atomic per-instant commits.
//! 3. **Primitives:** Oscillators, PLLs and reset synchronizers.
//! 4. **CRG:** The Nexus and 7-series clock/reset generators built from the above.

/// Clock/reset generators of the supported targets.
pub mod crg;

/// Signal graph and elaboration.
pub mod netlist;

/// Oscillator and PLL primitives.
pub mod primitives;

/// Asynchronous-assert, synchronous-release reset synchronizer.
pub mod reset_sync;

/// Cycle-based simulator.
pub mod sim;

pub use crg::{ClockDomain, Crg, CrgKind, CrgOptions};
pub use netlist::{Design, Expr, Netlist};
pub use reset_sync::ResetState;
pub use sim::{Simulator, Transition};
