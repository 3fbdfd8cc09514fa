//! Clocking primitives consumed by the sequencer.

/// Oscillator primitives (NXOSCA, STARTUPE2).
pub mod oscillator;

/// PLL families, divider planning and lock model.
pub mod pll;

pub use oscillator::Oscillator;
pub use pll::{NXPLL, PllFamily, PllPlan, PllState, S7PLL};
