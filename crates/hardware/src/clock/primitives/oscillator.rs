//! Oscillator primitives.
//!
//! Raw clock sources available before any PLL is locked:
//! 1. **NXOSCA:** The Nexus on-die high-frequency oscillator, `450 MHz / (div + 1)`.
//! 2. **STARTUPE2 CFGMCLK:** The 7-series configuration clock, fixed at about 65 MHz.

use crate::common::ConfigError;

/// NXOSCA high-frequency base clock.
pub const NXOSCA_BASE_HZ: u64 = 450_000_000;

/// Legal NXOSCA `HF_CLK_DIV` settings.
pub const NXOSCA_DIV_RANGE: (u32, u32) = (2, 255);

/// Nominal STARTUPE2 CFGMCLK frequency.
pub const CFGMCLK_HZ: u64 = 65_000_000;

/// A configured free-running oscillator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oscillator {
    /// Primitive name.
    pub primitive: &'static str,
    /// Output frequency.
    pub freq_hz: u64,
    /// Divider setting, when the primitive has one.
    pub divider: Option<u32>,
    /// Start-up delay before the first edge.
    pub startup_ps: u64,
}

impl Oscillator {
    /// Configures the NXOSCA high-frequency output for `requested_hz`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnreachableFrequency`] unless some divider in
    /// [`NXOSCA_DIV_RANGE`] produces `requested_hz` exactly.
    pub fn nxosca_hf(requested_hz: u64) -> Result<Self, ConfigError> {
        let unreachable = ConfigError::UnreachableFrequency {
            requested_hz,
            input_hz: NXOSCA_BASE_HZ,
        };
        if requested_hz == 0 || NXOSCA_BASE_HZ % requested_hz != 0 {
            return Err(unreachable);
        }
        let div = (NXOSCA_BASE_HZ / requested_hz).saturating_sub(1);
        if div < u64::from(NXOSCA_DIV_RANGE.0) || div > u64::from(NXOSCA_DIV_RANGE.1) {
            return Err(unreachable);
        }
        Ok(Self {
            primitive: "NXOSCA",
            freq_hz: requested_hz,
            divider: Some(div as u32),
            startup_ps: 0,
        })
    }

    /// The STARTUPE2 configuration clock.
    pub const fn startupe2_cfgmclk() -> Self {
        Self {
            primitive: "STARTUPE2",
            freq_hz: CFGMCLK_HZ,
            divider: None,
            startup_ps: 0,
        }
    }

    /// Returns the oscillator with a start-up delay before its first edge.
    #[must_use]
    pub const fn with_startup(mut self, startup_ps: u64) -> Self {
        self.startup_ps = startup_ps;
        self
    }
}
