//! Trenz CR00103-03-A SoC.
//!
//! The board boots from SPI flash; there is no integrated ROM or SRAM. The
//! composition is:
//! 1. **Flash:** A 16 MiB MT25QL128 (1x mode, 25 MHz) allocated on the bus; the
//!    64 KiB `rom` linker window sits at `bios_flash_offset` inside it and holds
//!    the reset vector.
//! 2. **SRAM:** 128 KiB of Nexus LRAM at the standard `sram` origin.
//! 3. **Main RAM:** 8 MiB HyperRAM at the standard `main_ram` origin.
//! 4. **Firmware hand-off:** `FLASH_BOOT_ADDRESS` points the BIOS at the
//!    application image at `app_flash_offset`.

use std::sync::Arc;

use super::{Soc, crg_options, mem_map, soc_core};
use crate::clock::Crg;
use crate::common::Result;
use crate::common::constants::{MAIN_RAM_SIZE, ROM_SIZE, SRAM_SIZE};
use crate::config::{Config, TargetKind};
use crate::platform::{self, Family, NexusDevice, Platform, Resource, Toolchain};
use crate::soc::peripherals::{CsrPeripheral, HyperRam, Lram, SpiFlash, SpiMode};
use crate::soc::{BusSlave, Mode, SocRegion};

/// Identification string.
pub const IDENT: &str = "LiteX SoC on CR00103-03-A evaluation board";

/// SPI flash clock.
pub const SPI_FLASH_CLK_FREQ: u64 = 25_000_000;

/// LRAM port width.
const LRAM_WIDTH: u32 = 32;

/// Composes the SoC.
///
/// # Errors
///
/// [`ConfigError`](crate::common::ConfigError) for a bad device, toolchain or
/// clock; [`CompositionError`](crate::common::CompositionError) if the flash
/// offsets place `rom` or the boot address outside the flash.
pub fn compose(config: &Config) -> Result<Soc> {
    let sys_clk_freq = config.sys_clk_freq();
    let default_toolchain = Toolchain::default_for(Family::Nexus);
    let toolchain = config.target.toolchain.unwrap_or(default_toolchain);
    let device = config
        .target
        .device
        .clone()
        .unwrap_or_else(|| NexusDevice::DEFAULT.to_string());

    let mut platform = platform::trenz_cr00103::platform(&device, toolchain)?;
    let crg = Crg::nexus(sys_clk_freq, &crg_options(config))?;
    let mut bus = soc_core()?;
    let mut pads = vec![platform.request(Resource::Serial, 0)?];
    let mut peripherals = vec![CsrPeripheral::Uart { crossover: false }];

    // Flash and the BIOS window inside it.
    pads.push(platform.request(Resource::SpiFlash, 0)?);
    let spiflash = bus.alloc_slave(
        "spiflash",
        Arc::new(SpiFlash::mt25ql128(SpiMode::X1, SPI_FLASH_CLK_FREQ)),
        true,
    )?;
    let rom = bus.derive("spiflash", config.flash.bios_flash_offset, ROM_SIZE)?;
    bus.add_region("rom", rom)?;
    let _ = bus.set_reset_address("rom")?;

    bus.add_slave(
        "sram",
        Arc::new(Lram::new(LRAM_WIDTH, SRAM_SIZE)),
        SocRegion::new(mem_map("sram")?, SRAM_SIZE),
    )?;

    pads.push(platform.request(Resource::HyperRam, 0)?);
    let hyperram = HyperRam::new(MAIN_RAM_SIZE, sys_clk_freq);
    bus.add_slave(
        "main_ram",
        Arc::new(hyperram),
        SocRegion::new(mem_map("main_ram")?, MAIN_RAM_SIZE).with_mode(Mode::RWX),
    )?;

    if config.target.with_led_chaser {
        let leds = platform.request_all(Resource::Led)?;
        peripherals.push(CsrPeripheral::LedChaser { count: leds.len() });
        pads.extend(leds);
    }

    // The boot address must fall inside the flash.
    let boot = bus.derive("spiflash", config.flash.app_flash_offset, 1)?;
    bus.add_constant("FLASH_BOOT_ADDRESS", boot.origin)?;
    tracing::debug!(
        spiflash = %spiflash,
        boot = format_args!("{:#x}", boot.origin),
        "flash layout"
    );

    Ok(Soc {
        ident: IDENT,
        build_name: platform::trenz_cr00103::NAME,
        target: TargetKind::TrenzCr00103,
        device: platform.device(),
        toolchain,
        sys_clk_freq,
        crg,
        memory_map: Arc::new(bus.finalize()),
        peripherals,
        pads,
        platform_commands: vec![platform::trenz_cr00103::SYSCONFIG],
    })
}

/// Bytes available to the application image between its offset and the next
/// occupied flash byte: the BIOS when the image sits below it, otherwise the
/// end of flash.
pub fn app_window(config: &Config) -> u64 {
    let f = &config.flash;
    let end = if f.app_flash_offset < f.bios_flash_offset {
        f.bios_flash_offset
    } else {
        SpiFlash::mt25ql128(SpiMode::X1, SPI_FLASH_CLK_FREQ).size()
    };
    end.saturating_sub(f.app_flash_offset)
}
