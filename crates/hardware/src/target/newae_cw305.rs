//! NewAE CW305 SoC.
//!
//! A 7-series SoC built from the SoC core defaults: integrated ROM and SRAM,
//! a crossover UART reached over the JTAG bridge, and an LED chaser on the
//! user LEDs.

use std::sync::Arc;

use super::{Soc, crg_options, mem_map, soc_core};
use crate::clock::Crg;
use crate::common::{ConfigError, KIB, Result};
use crate::config::{Config, TargetKind};
use crate::platform::{self, Family, Platform, Resource, Toolchain};
use crate::soc::peripherals::{BlockRam, CsrPeripheral};
use crate::soc::{Mode, SocRegion};

/// Identification string.
pub const IDENT: &str = "LiteX SoC on NewAE-CW305";

/// Integrated ROM size.
pub const INTEGRATED_ROM_SIZE: u64 = 128 * KIB;

/// Integrated SRAM size.
pub const INTEGRATED_SRAM_SIZE: u64 = 8 * KIB;

/// Composes the SoC.
///
/// # Errors
///
/// [`ConfigError::InvalidDevice`] if a device other than the board's is
/// requested, [`ConfigError::UnsupportedToolchain`] for anything but Vivado,
/// [`ConfigError::UnreachableFrequency`] if the S7PLL cannot reach the clock.
pub fn compose(config: &Config) -> Result<Soc> {
    let sys_clk_freq = config.sys_clk_freq();
    let default_toolchain = Toolchain::default_for(Family::Series7);
    let toolchain = config.target.toolchain.unwrap_or(default_toolchain);
    let foreign = config
        .target
        .device
        .as_deref()
        .filter(|d| *d != platform::newae_cw305::DEVICE);
    if let Some(device) = foreign {
        return Err(ConfigError::InvalidDevice {
            device: device.to_owned(),
            reason: format!("board carries {}", platform::newae_cw305::DEVICE),
        }
        .into());
    }

    let mut platform = platform::newae_cw305::platform(toolchain)?;
    let crg = Crg::series7(sys_clk_freq, &crg_options(config))?;
    let mut bus = soc_core()?;

    bus.add_slave(
        "rom",
        Arc::new(BlockRam::rom(INTEGRATED_ROM_SIZE)),
        SocRegion::new(mem_map("rom")?, INTEGRATED_ROM_SIZE).with_mode(Mode::R | Mode::X),
    )?;
    let _ = bus.set_reset_address("rom")?;
    bus.add_slave(
        "sram",
        Arc::new(BlockRam::ram(INTEGRATED_SRAM_SIZE)),
        SocRegion::new(mem_map("sram")?, INTEGRATED_SRAM_SIZE),
    )?;

    let mut peripherals = vec![
        CsrPeripheral::Uart { crossover: true },
        CsrPeripheral::JtagBone,
    ];
    let mut pads = Vec::new();
    if config.target.with_led_chaser {
        let leds = platform.request_all(Resource::UserLed)?;
        peripherals.push(CsrPeripheral::LedChaser { count: leds.len() });
        pads.extend(leds);
    }

    Ok(Soc {
        ident: IDENT,
        build_name: platform::newae_cw305::NAME,
        target: TargetKind::NewaeCw305,
        device: platform.device(),
        toolchain,
        sys_clk_freq,
        crg,
        memory_map: Arc::new(bus.finalize()),
        peripherals,
        pads,
        platform_commands: Vec::new(),
    })
}
