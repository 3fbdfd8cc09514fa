//! Board bring-up driver CLI.
//!
//! This binary composes a target SoC and drives the board flow. It performs:
//! 1. **Build:** Writes the firmware-facing artifacts (`--build`).
//! 2. **Bring-up check:** Simulates the clock/reset generator until `sys` leaves reset (`--bringup`).
//! 3. **Programming:** Loads to SRAM (`--load`), flashes gateware and BIOS (`--flash`), uploads an application (`--upload`).
//!
//! The process exits with the first non-zero programmer exit code, unchanged.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use socboard_core::builder::{BitstreamMode, Builder};
use socboard_core::common::ProgrammerError;
use socboard_core::common::constants::ROM_SIZE;
use socboard_core::config::{Config, TargetKind};
use socboard_core::firmware;
use socboard_core::platform::Toolchain;
use socboard_core::programmer::{OpenFpgaLoader, SystemRunner};
use socboard_core::target::{self, trenz_cr00103};

#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(
    name = "socboard",
    author,
    version,
    about = "Clock/reset bring-up, memory map and flashing for LiteX-style SoC targets",
    long_about = "Compose a target SoC, write its firmware artifacts, check its clock/reset bring-up and program the board.\n\nExamples:\n  socboard --build\n  socboard --bringup --sys-clk-freq 75e6\n  socboard --flash --address 0x0\n  socboard --upload firmware/app.fbi"
)]
struct Cli {
    /// Target board.
    #[arg(long)]
    target: Option<TargetKind>,

    /// FPGA part number (e.g. LFD2NX-40-7BG196I).
    #[arg(long)]
    device: Option<String>,

    /// Synthesis toolchain (radiant, oxide, vivado).
    #[arg(long)]
    toolchain: Option<Toolchain>,

    /// System clock frequency in Hz; accepts `50e6`.
    #[arg(long, value_parser = parse_freq)]
    sys_clk_freq: Option<u64>,

    /// JSON configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory for build artifacts.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the firmware-facing artifacts.
    #[arg(long)]
    build: bool,

    /// Load the bitstream into configuration SRAM.
    #[arg(long)]
    load: bool,

    /// Flash bitstream and BIOS to SPI flash.
    #[arg(long)]
    flash: bool,

    /// Flash an application image to SPI flash.
    #[arg(long)]
    upload: Option<PathBuf>,

    /// Flash address to program the bitstream at.
    #[arg(long, value_parser = parse_int)]
    address: Option<u64>,

    /// BIOS offset in flash relative to --address.
    #[arg(long, value_parser = parse_int)]
    bios_flash_offset: Option<u64>,

    /// Application offset in flash relative to --address.
    #[arg(long, value_parser = parse_int)]
    app_flash_offset: Option<u64>,

    /// Leave out the LED chaser.
    #[arg(long)]
    no_led_chaser: bool,

    /// Simulate the clock/reset bring-up and print a report.
    #[arg(long)]
    bringup: bool,

    /// Log every clock edge during --bringup.
    #[arg(long)]
    trace: bool,

    /// Check that an ELF image's load segments fit the memory map.
    #[arg(long)]
    check_elf: Option<PathBuf>,
}

/// Parses a decimal or `0x`-prefixed integer.
fn parse_int(s: &str) -> Result<u64, String> {
    let s = s.replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("`{s}`: {e}"))
}

/// Parses a frequency given as an integer or a float such as `50e6`.
fn parse_freq(s: &str) -> Result<u64, String> {
    if let Ok(hz) = s.parse::<u64>() {
        return Ok(hz);
    }
    let hz: f64 = s.parse().map_err(|e| format!("`{s}`: {e}"))?;
    if !(1.0..=u64::MAX as f64).contains(&hz) {
        return Err(format!("`{s}` is not a valid frequency"));
    }
    Ok(hz.round() as u64)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(kind) = cli.target {
        config.target.kind = kind;
    }
    if let Some(device) = &cli.device {
        config.target.device = Some(device.clone());
    }
    if let Some(toolchain) = cli.toolchain {
        config.target.toolchain = Some(toolchain);
    }
    if let Some(freq) = cli.sys_clk_freq {
        config.target.sys_clk_freq = Some(freq);
    }
    if cli.no_led_chaser {
        config.target.with_led_chaser = false;
    }
    if let Some(dir) = &cli.output_dir {
        config.build.output_dir.clone_from(dir);
    }
    if let Some(address) = cli.address {
        config.flash.address = address;
    }
    if let Some(offset) = cli.bios_flash_offset {
        config.flash.bios_flash_offset = offset;
    }
    if let Some(offset) = cli.app_flash_offset {
        config.flash.app_flash_offset = offset;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut soc = target::compose(&config).context("composing SoC")?;
    let builder = Builder::new(&config.build.output_dir, &soc);

    if cli.build {
        let artifacts = builder.build(&soc).context("writing build artifacts")?;
        println!("[*] {}", artifacts.regions_ld.display());
        println!("[*] {}", artifacts.mem_h.display());
        println!("[*] {}", artifacts.soc_h.display());
        println!("[*] {}", artifacts.memory_map_json.display());
    }

    if cli.bringup {
        soc.crg.set_trace(cli.trace);
        let report = soc.crg.run_until_released(config.clock.max_bringup_steps);
        report.print();
        if !report.released() {
            bail!(
                "sys reset still asserted after {} edges",
                config.clock.max_bringup_steps
            );
        }
    }

    if let Some(elf) = &cli.check_elf {
        let placements = firmware::check_elf_file(elf, &soc.memory_map)
            .with_context(|| format!("checking {}", elf.display()))?;
        for p in &placements {
            println!("[*] {} -> {}", p.range, p.region);
        }
    }

    let mut programmer = OpenFpgaLoader::new(config.programmer.clone(), SystemRunner);

    if cli.load {
        let bitstream = builder.bitstream_filename(&soc, BitstreamMode::Sram);
        programmer
            .load_bitstream(&bitstream)
            .context("loading bitstream")?;
    }

    if (cli.flash || cli.upload.is_some()) && soc.target != TargetKind::TrenzCr00103 {
        bail!("target {} has no flash flow", soc.target);
    }

    if cli.flash {
        let bitstream = builder.bitstream_filename(&soc, BitstreamMode::Flash);
        let bios = builder.bios_filename();
        if bios.is_file() {
            let _ = firmware::check_raw_image(&bios, "rom", ROM_SIZE)?;
        }
        programmer
            .flash_gateware_and_bios(&bitstream, &bios, &config.flash)
            .context("flashing gateware and BIOS")?;
    }

    if let Some(app) = &cli.upload {
        if app.is_file() {
            let window = trenz_cr00103::app_window(&config);
            let _ = firmware::check_raw_image(app, "application", window)?;
        }
        programmer
            .upload(app, &config.flash)
            .context("uploading application")?;
    }

    Ok(())
}

/// Log filter from `RUST_LOG` (default `info`), with per-edge simulator events
/// enabled when `trace` is set.
fn log_filter(rust_log: Option<&str>, trace: bool) -> EnvFilter {
    let mut directives = rust_log
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("info")
        .to_owned();
    if trace {
        directives.push_str(",socboard_core::clock::sim=trace");
    }
    EnvFilter::builder().parse_lossy(directives)
}

fn main() {
    let cli = Cli::parse();
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), cli.trace))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<ProgrammerError>())
            .map_or(1, ProgrammerError::exit_code);
        process::exit(code);
    }
}
