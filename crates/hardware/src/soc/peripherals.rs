//! Peripheral models bound to the SoC bus.
//!
//! These are interface-only descriptions of the controllers a target instantiates:
//! 1. **Memories:** SPI NOR flash, Nexus LRAM, HyperRAM and integrated block RAM.
//! 2. **CSR peripherals:** LED chaser, UART and JTAG bridge; these have no bus window of their own.

use serde::Serialize;

use super::traits::BusSlave;
use crate::common::{KIB, MIB};

/// SPI flash bus width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpiMode {
    /// Single data line (`READ_1_1_1`).
    X1,
    /// Four data lines (`READ_1_1_4`).
    X4,
}

/// A SPI NOR flash memory-mapped for reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpiFlash {
    module: &'static str,
    size: u64,
    /// Data lines in use.
    pub mode: SpiMode,
    /// SPI clock frequency.
    pub clk_freq: u64,
}

impl SpiFlash {
    /// Micron MT25QL128: 16 MiB.
    pub const fn mt25ql128(mode: SpiMode, clk_freq: u64) -> Self {
        Self {
            module: "MT25QL128",
            size: 16 * MIB,
            mode,
            clk_freq,
        }
    }
}

impl BusSlave for SpiFlash {
    fn name(&self) -> &str {
        self.module
    }

    fn kind(&self) -> &'static str {
        "spiflash"
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Nexus large RAM blocks used as SRAM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lram {
    width: u32,
    size: u64,
}

impl Lram {
    /// An LRAM array of `size` bytes with a `width`-bit port.
    pub const fn new(width: u32, size: u64) -> Self {
        Self { width, size }
    }
}

impl BusSlave for Lram {
    fn name(&self) -> &str {
        "NXLRAM"
    }

    fn kind(&self) -> &'static str {
        "lram"
    }

    fn data_width(&self) -> u32 {
        self.width
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// HyperBus RAM controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyperRam {
    size: u64,
    /// Controller clock.
    pub sys_clk_freq: u64,
}

impl HyperRam {
    /// A HyperRAM of `size` bytes.
    pub const fn new(size: u64, sys_clk_freq: u64) -> Self {
        Self { size, sys_clk_freq }
    }
}

impl BusSlave for HyperRam {
    fn name(&self) -> &str {
        "HyperRAM"
    }

    fn kind(&self) -> &'static str {
        "hyperram"
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Integrated block RAM (ROM or SRAM inside the SoC).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRam {
    size: u64,
    read_only: bool,
}

impl BlockRam {
    /// An integrated RAM.
    pub const fn ram(size: u64) -> Self {
        Self {
            size,
            read_only: false,
        }
    }

    /// An integrated ROM.
    pub const fn rom(size: u64) -> Self {
        Self {
            size,
            read_only: true,
        }
    }

    /// Whether the block is initialized at build time and never written.
    pub const fn read_only(&self) -> bool {
        self.read_only
    }
}

impl BusSlave for BlockRam {
    fn name(&self) -> &str {
        if self.read_only { "ROM" } else { "SRAM" }
    }

    fn kind(&self) -> &'static str {
        "bram"
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// The CSR bridge: all control/status registers behind one window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrBridge {
    size: u64,
}

impl CsrBridge {
    /// A CSR window of 64 KiB.
    pub const fn new() -> Self {
        Self { size: 64 * KIB }
    }
}

impl Default for CsrBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSlave for CsrBridge {
    fn name(&self) -> &str {
        "CSR"
    }

    fn kind(&self) -> &'static str {
        "csr"
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// A peripheral reached through CSRs only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CsrPeripheral {
    /// LED chaser over `count` LEDs.
    LedChaser {
        /// Number of LEDs driven.
        count: usize,
    },
    /// UART; `crossover` keeps it inside the SoC for a JTAG/bridge terminal.
    Uart {
        /// Whether the UART is a crossover UART.
        crossover: bool,
    },
    /// JTAG-to-bus bridge.
    JtagBone,
}

impl CsrPeripheral {
    /// Name used for the peripheral in CSR maps.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LedChaser { .. } => "leds",
            Self::Uart { .. } => "uart",
            Self::JtagBone => "jtagbone",
        }
    }
}
