//! Configuration system for board bring-up.
//!
//! This module defines the configuration structures used to parameterize a
//! build. It provides:
//! 1. **Defaults:** Baseline flash layout, programmer settings and reset timing.
//! 2. **Structures:** Hierarchical config for the target, clocking, flash, programmer and build output.
//! 3. **Enums:** The supported target boards.
//!
//! Configuration is supplied as JSON (`--config`) or taken from `Config::default()`;
//! command-line flags override individual fields afterwards.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::common::{AddrRange, ConfigError};
use crate::common::constants::{APP_FLASH_OFFSET, BIOS_FLASH_OFFSET, ROM_SIZE};
use crate::platform::Toolchain;

/// Default configuration constants.
///
/// These values describe the CR00103-03-A bring-up flow when not overridden
/// in a JSON configuration file or on the command line.
mod defaults {
    /// Programmer executable.
    pub const PROGRAMMER: &str = "openFPGALoader";

    /// JTAG cable type used for flashing.
    pub const CABLE: &str = "ft2232";

    /// Serial device of the programming cable.
    pub const DEVICE_PATH: &str = "/dev/ttyUSB0";

    /// openFPGALoader board preset used when loading into SRAM.
    pub const LOAD_BOARD: &str = "certusnx_versa_evn";

    /// Upper bound on simulated edges during a bring-up check.
    ///
    /// A 16-bit POR at 50 MHz plus PLL lock needs about 66 000 edge instants.
    pub const MAX_BRINGUP_STEPS: u64 = 1_000_000;

    /// Root directory for generated artifacts.
    pub const OUTPUT_DIR: &str = "build";
}

/// Supported target boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Trenz Electronic CR00103-03-A (Lattice Certus-NX).
    #[default]
    TrenzCr00103,
    /// NewAE CW305 (Xilinx Artix-7).
    NewaeCw305,
}

impl TargetKind {
    /// Name used on the command line and for the build directory.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrenzCr00103 => "trenz_cr00103",
            Self::NewaeCw305 => "newae_cw305",
        }
    }

    /// Default system clock of the target.
    pub const fn default_sys_clk_freq(self) -> u64 {
        match self {
            Self::TrenzCr00103 => 50_000_000,
            Self::NewaeCw305 => 100_000_000,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trenz_cr00103" | "trenz_cr00103_03_a" => Ok(Self::TrenzCr00103),
            "newae_cw305" => Ok(Self::NewaeCw305),
            _ => Err(ConfigError::Invalid {
                detail: format!("unknown target `{s}`"),
            }),
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use socboard_core::config::{Config, TargetKind};
///
/// let json = r#"{
///     "target": { "kind": "trenz_cr00103", "device": "LFD2NX-40-9BG196T" },
///     "flash": { "address": 0 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.target.kind, TargetKind::TrenzCr00103);
/// assert_eq!(config.flash.bios_flash_offset, 0x80_0000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Board, device and SoC options
    #[serde(default)]
    pub target: TargetConfig,
    /// Clock/reset generator options
    #[serde(default)]
    pub clock: ClockConfig,
    /// SPI flash layout
    #[serde(default)]
    pub flash: FlashConfig,
    /// External programmer invocation
    #[serde(default)]
    pub programmer: ProgrammerConfig,
    /// Artifact output
    #[serde(default)]
    pub build: BuildConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed input, [`ConfigError::Invalid`] if
    /// the flash layout is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as [`from_json`](Self::from_json).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the application offset falls inside the
    /// BIOS window or the clock options are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.flash;
        let bios = AddrRange::new(f.bios_flash_offset, ROM_SIZE);
        if bios.contains(f.app_flash_offset) {
            return Err(ConfigError::Invalid {
                detail: format!(
                    "application offset {:#x} falls inside the BIOS window {bios}",
                    f.app_flash_offset
                ),
            });
        }
        if self.clock.sync_stages == 0 {
            return Err(ConfigError::Invalid {
                detail: "reset synchronizer needs at least one stage".to_owned(),
            });
        }
        if self.target.sys_clk_freq == Some(0) {
            return Err(ConfigError::Invalid {
                detail: "system clock frequency must be non-zero".to_owned(),
            });
        }
        Ok(())
    }

    /// System clock of the configured target.
    pub fn sys_clk_freq(&self) -> u64 {
        self.target
            .sys_clk_freq
            .unwrap_or_else(|| self.target.kind.default_sys_clk_freq())
    }
}

/// Board, device and SoC options.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Target board
    #[serde(default)]
    pub kind: TargetKind,

    /// FPGA part number; the board default when unset
    #[serde(default)]
    pub device: Option<String>,

    /// Synthesis toolchain; the family default when unset
    #[serde(default)]
    pub toolchain: Option<Toolchain>,

    /// System clock in Hz; the board default when unset
    #[serde(default)]
    pub sys_clk_freq: Option<u64>,

    /// Instantiate the LED chaser
    #[serde(default = "TargetConfig::default_with_led_chaser")]
    pub with_led_chaser: bool,
}

impl TargetConfig {
    /// LEDs chase by default.
    fn default_with_led_chaser() -> bool {
        true
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            kind: TargetKind::default(),
            device: None,
            toolchain: None,
            sys_clk_freq: None,
            with_led_chaser: Self::default_with_led_chaser(),
        }
    }
}

/// Clock/reset generator options.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    /// Power-on counter width in bits
    #[serde(default = "ClockConfig::default_por_width")]
    pub por_width: u32,

    /// Reset synchronizer depth
    #[serde(default = "ClockConfig::default_sync_stages")]
    pub sync_stages: u8,

    /// Oscillator start-up delay in picoseconds
    #[serde(default)]
    pub osc_startup_ps: u64,

    /// Edge budget for a simulated bring-up
    #[serde(default = "ClockConfig::default_max_bringup_steps")]
    pub max_bringup_steps: u64,
}

impl ClockConfig {
    /// Returns the default POR width.
    fn default_por_width() -> u32 {
        crate::common::constants::POR_WIDTH
    }

    /// Returns the default synchronizer depth.
    fn default_sync_stages() -> u8 {
        crate::common::constants::RESET_SYNC_STAGES
    }

    fn default_max_bringup_steps() -> u64 {
        defaults::MAX_BRINGUP_STEPS
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            por_width: Self::default_por_width(),
            sync_stages: Self::default_sync_stages(),
            osc_startup_ps: 0,
            max_bringup_steps: Self::default_max_bringup_steps(),
        }
    }
}

/// SPI flash layout; offsets are relative to `address`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlashConfig {
    /// Flash address the bitstream is written at
    #[serde(default)]
    pub address: u64,

    /// BIOS offset relative to `address`
    #[serde(default = "FlashConfig::default_bios_flash_offset")]
    pub bios_flash_offset: u64,

    /// Application offset relative to `address`
    #[serde(default = "FlashConfig::default_app_flash_offset")]
    pub app_flash_offset: u64,
}

impl FlashConfig {
    fn default_bios_flash_offset() -> u64 {
        BIOS_FLASH_OFFSET
    }

    fn default_app_flash_offset() -> u64 {
        APP_FLASH_OFFSET
    }
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            address: 0,
            bios_flash_offset: BIOS_FLASH_OFFSET,
            app_flash_offset: APP_FLASH_OFFSET,
        }
    }
}

/// External programmer invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgrammerConfig {
    /// Executable name or path
    #[serde(default = "ProgrammerConfig::default_program")]
    pub program: String,

    /// Cable type for flash writes
    #[serde(default = "ProgrammerConfig::default_cable")]
    pub cable: String,

    /// Serial device of the cable
    #[serde(default = "ProgrammerConfig::default_device_path")]
    pub device_path: String,

    /// JTAG frequency for flash writes
    #[serde(default = "ProgrammerConfig::default_flash_freq")]
    pub flash_freq: u32,

    /// Board preset for SRAM loads
    #[serde(default = "ProgrammerConfig::default_load_board")]
    pub load_board: String,

    /// JTAG frequency for SRAM loads
    #[serde(default = "ProgrammerConfig::default_load_freq")]
    pub load_freq: u32,
}

impl ProgrammerConfig {
    fn default_program() -> String {
        defaults::PROGRAMMER.to_owned()
    }

    fn default_cable() -> String {
        defaults::CABLE.to_owned()
    }

    fn default_device_path() -> String {
        defaults::DEVICE_PATH.to_owned()
    }

    fn default_flash_freq() -> u32 {
        crate::common::constants::FLASH_JTAG_FREQ
    }

    fn default_load_board() -> String {
        defaults::LOAD_BOARD.to_owned()
    }

    fn default_load_freq() -> u32 {
        crate::common::constants::LOAD_JTAG_FREQ
    }
}

impl Default for ProgrammerConfig {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            cable: Self::default_cable(),
            device_path: Self::default_device_path(),
            flash_freq: Self::default_flash_freq(),
            load_board: Self::default_load_board(),
            load_freq: Self::default_load_freq(),
        }
    }
}

/// Artifact output.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Root directory; artifacts go to `<output_dir>/<target>/`
    #[serde(default = "BuildConfig::default_output_dir")]
    pub output_dir: PathBuf,
}

impl BuildConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(defaults::OUTPUT_DIR)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
        }
    }
}
