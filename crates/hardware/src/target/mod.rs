//! SoC targets.
//!
//! A target ties a board platform, a clock/reset generator and a memory map
//! together. This module provides:
//! 1. **Composition:** `compose` dispatches on [`TargetKind`] and returns a [`Soc`].
//! 2. **SoC core:** The CSR window and IO region every target starts from.
//! 3. **Boards:** `trenz_cr00103` (Nexus, flash-booted) and `newae_cw305` (7-series).

use std::sync::Arc;

use serde::Serialize;

use crate::clock::{Crg, CrgOptions};
use crate::common::{CompositionError, KIB, Result};
use crate::config::{Config, TargetKind};
use crate::platform::{PadSet, Toolchain};
use crate::soc::peripherals::{CsrBridge, CsrPeripheral};
use crate::soc::{MemoryMap, Mode, SocBusBuilder, SocRegion, builder::default_origin};

/// NewAE CW305 SoC.
pub mod newae_cw305;

/// Trenz CR00103-03-A SoC.
pub mod trenz_cr00103;

/// Size of the CSR window.
pub const CSR_SIZE: u64 = 64 * KIB;

/// A composed SoC, ready for artifact generation.
#[derive(Debug)]
pub struct Soc {
    /// Identification string built into the gateware.
    pub ident: &'static str,
    /// Platform name; bitstreams are named after it.
    pub build_name: &'static str,
    /// Which board this is.
    pub target: TargetKind,
    /// FPGA part number.
    pub device: String,
    /// Synthesis toolchain.
    pub toolchain: Toolchain,
    /// System clock in Hz.
    pub sys_clk_freq: u64,
    /// Clock/reset generator, at power-up.
    pub crg: Crg,
    /// Finalized address map.
    pub memory_map: Arc<MemoryMap>,
    /// CSR-only peripherals.
    pub peripherals: Vec<CsrPeripheral>,
    /// Pads claimed from the platform.
    pub pads: Vec<PadSet>,
    /// Extra constraint-file commands.
    pub platform_commands: Vec<&'static str>,
}

/// Serializable summary of a [`Soc`].
#[derive(Debug, Serialize)]
pub struct SocSummary<'a> {
    /// Identification string.
    pub ident: &'static str,
    /// Board name.
    pub target: &'static str,
    /// FPGA part number.
    pub device: &'a str,
    /// Toolchain name.
    pub toolchain: String,
    /// System clock in Hz.
    pub sys_clk_freq: u64,
    /// CSR-only peripherals.
    pub peripherals: &'a [CsrPeripheral],
    /// The memory map.
    pub memory_map: &'a MemoryMap,
}

impl Soc {
    /// Shares the memory map with a downstream generator.
    pub fn memory_map(&self) -> Arc<MemoryMap> {
        Arc::clone(&self.memory_map)
    }

    /// A serializable view of the SoC.
    pub fn summary(&self) -> SocSummary<'_> {
        SocSummary {
            ident: self.ident,
            target: self.target.name(),
            device: &self.device,
            toolchain: self.toolchain.to_string(),
            sys_clk_freq: self.sys_clk_freq,
            peripherals: &self.peripherals,
            memory_map: &self.memory_map,
        }
    }
}

/// Composes the SoC named by `config.target.kind`.
///
/// # Errors
///
/// Configuration errors (device, toolchain, clocking), composition errors,
/// or platform errors; nothing is partially built.
pub fn compose(config: &Config) -> Result<Soc> {
    tracing::info!(board = %config.target.kind, "composing SoC");
    match config.target.kind {
        TargetKind::TrenzCr00103 => trenz_cr00103::compose(config),
        TargetKind::NewaeCw305 => newae_cw305::compose(config),
    }
}

/// CRG options from the clock configuration.
pub(crate) fn crg_options(config: &Config) -> CrgOptions {
    CrgOptions {
        por_width: config.clock.por_width,
        sync_stages: config.clock.sync_stages,
        osc_startup_ps: config.clock.osc_startup_ps,
    }
}

/// Starts a bus with the default IO region and the CSR window in place.
pub(crate) fn soc_core() -> std::result::Result<SocBusBuilder, CompositionError> {
    let mut bus = SocBusBuilder::with_default_io()?;
    bus.add_slave(
        "csr",
        Arc::new(CsrBridge::new()),
        SocRegion::new(mem_map("csr")?, CSR_SIZE)
            .with_mode(Mode::R | Mode::W)
            .uncached(),
    )?;
    Ok(bus)
}

/// Origin of a standard region.
pub(crate) fn mem_map(name: &str) -> std::result::Result<u64, CompositionError> {
    default_origin(name).ok_or_else(|| CompositionError::UnknownRegion {
        name: name.to_owned(),
    })
}
