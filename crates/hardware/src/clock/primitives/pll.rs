//! PLL primitive model and divider planning.
//!
//! This module models the two PLLs used by the targets. It provides:
//! 1. **Families:** VCO range and divider limits for the Nexus NXPLL and 7-series S7PLL.
//! 2. **Planning:** A divider search that keeps the VCO in range and the output within 1 %.
//! 3. **Lock model:** A lock counter cleared asynchronously by the PLL reset input.

use serde::Serialize;

use crate::common::ConfigError;

/// Relative output error accepted by [`plan`].
pub const FREQ_TOLERANCE: f64 = 0.01;

/// Divider limits of a PLL family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PllFamily {
    /// Family name for diagnostics.
    pub name: &'static str,
    /// Lowest and highest legal VCO frequency.
    pub vco_hz: (u64, u64),
    /// Legal reference input range.
    pub input_hz: (u64, u64),
    /// Largest reference divider.
    pub max_ref_div: u32,
    /// Smallest and largest feedback multiplier.
    pub fb_mult: (u32, u32),
    /// Largest output divider.
    pub max_out_div: u32,
    /// Reference edges between reset release and lock.
    pub lock_cycles: u32,
}

/// Lattice Nexus NXPLL.
pub const NXPLL: PllFamily = PllFamily {
    name: "NXPLL",
    vco_hz: (800_000_000, 1_600_000_000),
    input_hz: (10_000_000, 500_000_000),
    max_ref_div: 128,
    fb_mult: (1, 128),
    max_out_div: 128,
    lock_cycles: 64,
};

/// Xilinx 7-series PLLE2 (speed grade -1).
pub const S7PLL: PllFamily = PllFamily {
    name: "S7PLL",
    vco_hz: (800_000_000, 1_600_000_000),
    input_hz: (19_000_000, 800_000_000),
    max_ref_div: 56,
    fb_mult: (2, 64),
    max_out_div: 128,
    lock_cycles: 100,
};

/// A chosen divider setting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PllPlan {
    /// Reference frequency.
    pub input_hz: u64,
    /// Reference divider.
    pub ref_div: u32,
    /// Feedback multiplier.
    pub fb_mult: u32,
    /// Output divider.
    pub out_div: u32,
    /// Resulting VCO frequency.
    pub vco_hz: f64,
    /// Resulting output frequency.
    pub output_hz: f64,
}

impl PllPlan {
    /// Output frequency rounded to whole hertz.
    pub fn output_hz_rounded(&self) -> u64 {
        self.output_hz.round() as u64
    }
}

/// Searches divider settings for `requested_hz` from `input_hz`.
///
/// Among settings within [`FREQ_TOLERANCE`], the one with the smallest error
/// wins; ties go to the higher VCO frequency (lower jitter).
///
/// # Errors
///
/// [`ConfigError::UnreachableFrequency`] if the reference is out of range or
/// no setting lands within tolerance.
pub fn plan(family: &PllFamily, input_hz: u64, requested_hz: u64) -> Result<PllPlan, ConfigError> {
    let unreachable = || ConfigError::UnreachableFrequency {
        requested_hz,
        input_hz,
    };
    if requested_hz == 0 || input_hz < family.input_hz.0 || input_hz > family.input_hz.1 {
        return Err(unreachable());
    }

    let target = requested_hz as f64;
    let mut best: Option<(f64, PllPlan)> = None;
    for ref_div in 1..=family.max_ref_div {
        for fb_mult in family.fb_mult.0..=family.fb_mult.1 {
            let vco = input_hz as f64 * f64::from(fb_mult) / f64::from(ref_div);
            if vco < family.vco_hz.0 as f64 || vco > family.vco_hz.1 as f64 {
                continue;
            }
            let out_div = ((vco / target).round() as u32).clamp(1, family.max_out_div);
            let output = vco / f64::from(out_div);
            let err = (output - target).abs() / target;
            if err > FREQ_TOLERANCE {
                continue;
            }
            let candidate = PllPlan {
                input_hz,
                ref_div,
                fb_mult,
                out_div,
                vco_hz: vco,
                output_hz: output,
            };
            let better = match &best {
                None => true,
                Some((best_err, best_plan)) => {
                    err < *best_err || (err == *best_err && vco > best_plan.vco_hz)
                }
            };
            if better {
                best = Some((err, candidate));
            }
        }
    }
    best.map(|(_, p)| p).ok_or_else(unreachable)
}

/// Lock counter of a PLL instance.
#[derive(Clone, Debug, Default)]
pub struct PllState {
    counter: u32,
    locked: bool,
    lock_cycles: u32,
}

impl PllState {
    /// Creates an unlocked PLL that locks `lock_cycles` reference edges after reset release.
    pub const fn new(lock_cycles: u32) -> Self {
        Self {
            counter: 0,
            locked: false,
            lock_cycles,
        }
    }

    /// Asynchronous clear while the reset input is high.
    pub fn clear(&mut self) {
        self.counter = 0;
        self.locked = false;
    }

    /// Advances on a reference-clock edge with the reset input sampled as `reset`.
    pub fn clock_edge(&mut self, reset: bool) {
        if reset {
            self.clear();
        } else if !self.locked {
            self.counter = self.counter.saturating_add(1);
            self.locked = self.counter >= self.lock_cycles;
        }
    }

    /// Lock status.
    pub const fn locked(&self) -> bool {
        self.locked
    }
}
