//! Global Board Constants.
//!
//! This module defines constants shared by the sequencer, the composer and the
//! flashing path. It includes:
//! 1. **Size Units:** `KIB` and `MIB` multipliers used throughout the memory map.
//! 2. **Flash Layout:** Default BIOS/application offsets and window sizes.
//! 3. **Reset Timing:** Power-on-reset counter width and synchronizer depth.
//! 4. **Programmer Constants:** Fixed JTAG frequencies and cable defaults.

/// One kibibyte.
pub const KIB: u64 = 1024;

/// One mebibyte.
pub const MIB: u64 = 1024 * KIB;

/// Default BIOS offset in SPI flash, relative to the bitstream base address.
pub const BIOS_FLASH_OFFSET: u64 = 0x80_0000;

/// Default application offset in SPI flash, relative to the bitstream base address.
pub const APP_FLASH_OFFSET: u64 = 0x84_0000;

/// Size of the ROM (BIOS) window carved out of SPI flash.
pub const ROM_SIZE: u64 = 64 * KIB;

/// Size of the LRAM block used as SRAM.
pub const SRAM_SIZE: u64 = 128 * KIB;

/// Size of the HyperRAM used as main RAM.
pub const MAIN_RAM_SIZE: u64 = 8 * MIB;

/// Width of the power-on-reset down-counter in bits.
pub const POR_WIDTH: u32 = 16;

/// Number of target-domain edges a reset release takes to propagate.
pub const RESET_SYNC_STAGES: u8 = 2;

/// JTAG frequency used when writing SPI flash.
pub const FLASH_JTAG_FREQ: u32 = 10_000_000;

/// JTAG frequency used when loading a bitstream into configuration SRAM.
pub const LOAD_JTAG_FREQ: u32 = 1_000_000;

/// Picoseconds per second; simulator time base.
pub const PS_PER_S: u64 = 1_000_000_000_000;
