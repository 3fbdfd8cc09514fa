//! Board bring-up core for LiteX-style FPGA SoCs.
//!
//! This crate composes and checks the board-support side of an FPGA SoC with the following:
//! 1. **Clock/Reset:** Signal-graph netlist, cycle-based simulator, POR, PLL and reset synchronizers.
//! 2. **Memory Map:** Region/slave registry with overlap, IO and derivation checks; frozen `MemoryMap`.
//! 3. **Platform:** Typed pad requests against board pin and connector tables.
//! 4. **Targets:** Trenz CR00103-03-A (Certus-NX) and NewAE CW305 (Artix-7) SoC assemblies.
//! 5. **Build and Flash:** Linker/header artifacts, firmware placement checks and openFPGALoader invocation.

/// Firmware artifacts (`regions.ld`, `mem.h`, `soc.h`, JSON map) and image names.
pub mod builder;
/// Clock/reset generation (netlist, simulator, primitives, CRG variants).
pub mod clock;
/// Common types and constants (address ranges, errors, flash layout).
pub mod common;
/// Build configuration (defaults, target selection, flash layout, programmer).
pub mod config;
/// Firmware image placement checks.
pub mod firmware;
/// Board platforms (pin tables, devices, toolchains).
pub mod platform;
/// openFPGALoader command construction and execution.
pub mod programmer;
/// System-on-chip memory map (regions, builder, slaves, peripherals).
pub mod soc;
/// Bring-up statistics collection and reporting.
pub mod stats;
/// SoC targets.
pub mod target;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Clock/reset generator; construct with `Crg::nexus` or `Crg::series7`.
pub use crate::clock::Crg;
/// Frozen memory map shared with downstream generators.
pub use crate::soc::MemoryMap;
/// A composed SoC; construct with [`target::compose`].
pub use crate::target::Soc;
