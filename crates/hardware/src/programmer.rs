//! openFPGALoader invocation.
//!
//! This module models the programmer's command-line contract only:
//! 1. **Arguments:** Bit-exact argument vectors for SRAM loads and flash writes.
//! 2. **Execution:** A [`CommandRunner`] seam; [`SystemRunner`] spawns real processes.
//! 3. **Flows:** Gateware + BIOS flashing and application upload at their flash offsets.
//!
//! A flow stops at the first non-zero exit status and reports it unchanged
//! as [`ProgrammerError::Failed`]. Nothing is retried.

use std::path::Path;
use std::process::Command;

use crate::common::ProgrammerError;
use crate::config::{FlashConfig, ProgrammerConfig};

/// Runs an external program to completion.
pub trait CommandRunner {
    /// Runs `program` with `args`.
    ///
    /// # Returns
    ///
    /// The exit code, zero or not.
    ///
    /// # Errors
    ///
    /// [`ProgrammerError::Spawn`] if it cannot be started,
    /// [`ProgrammerError::Terminated`] if it exits without a code.
    fn run(&mut self, program: &str, args: &[String]) -> Result<i32, ProgrammerError>;
}

/// Runs commands with [`std::process::Command`], inheriting stdio.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[String]) -> Result<i32, ProgrammerError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| ProgrammerError::Spawn {
                program: program.to_owned(),
                source,
            })?;
        status.code().ok_or_else(|| ProgrammerError::Terminated {
            program: program.to_owned(),
        })
    }
}

/// The openFPGALoader programmer.
#[derive(Debug)]
pub struct OpenFpgaLoader<R> {
    config: ProgrammerConfig,
    runner: R,
}

impl<R: CommandRunner> OpenFpgaLoader<R> {
    /// Creates a programmer driving `runner`.
    pub const fn new(config: ProgrammerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Arguments writing `file` to SPI flash at `offset`.
    ///
    /// # Arguments
    ///
    /// * `file` - Image to write.
    /// * `offset` - Absolute flash offset; rendered in decimal.
    /// * `external` - Whether the image goes to the external flash rather than
    ///   the FPGA's configuration flash.
    pub fn flash_args(&self, file: &Path, offset: u64, external: bool) -> Vec<String> {
        let mut args = vec![
            "--cable".to_owned(),
            self.config.cable.clone(),
            "--freq".to_owned(),
            self.config.flash_freq.to_string(),
            "-d".to_owned(),
            self.config.device_path.clone(),
            "--bitstream".to_owned(),
            file.display().to_string(),
            "--write-flash".to_owned(),
            "--offset".to_owned(),
            offset.to_string(),
        ];
        if external {
            args.push("--external-flash".to_owned());
        }
        args
    }

    /// Arguments loading `file` into configuration SRAM.
    pub fn load_args(&self, file: &Path) -> Vec<String> {
        vec![
            "--board".to_owned(),
            self.config.load_board.clone(),
            "--freq".to_owned(),
            self.config.load_freq.to_string(),
            "--bitstream".to_owned(),
            file.display().to_string(),
        ]
    }

    fn invoke(&mut self, file: &Path, args: &[String]) -> Result<(), ProgrammerError> {
        if !file.is_file() {
            return Err(ProgrammerError::MissingFile {
                path: file.to_path_buf(),
            });
        }
        let program = self.config.program.as_str();
        tracing::info!(program, args = %args.join(" "), "programmer");
        let code = self.runner.run(program, args)?;
        if code == 0 {
            Ok(())
        } else {
            tracing::warn!(program, code, "programmer failed");
            Err(ProgrammerError::Failed {
                program: program.to_owned(),
                code,
            })
        }
    }

    /// Loads a bitstream into configuration SRAM.
    ///
    /// # Errors
    ///
    /// [`ProgrammerError::MissingFile`] or the runner's failure.
    pub fn load_bitstream(&mut self, bitstream: &Path) -> Result<(), ProgrammerError> {
        let args = self.load_args(bitstream);
        self.invoke(bitstream, &args)
    }

    /// Writes `file` to flash at `offset`.
    ///
    /// # Errors
    ///
    /// [`ProgrammerError::MissingFile`] or the runner's failure.
    pub fn flash(&mut self, file: &Path, offset: u64, external: bool) -> Result<(), ProgrammerError> {
        let args = self.flash_args(file, offset, external);
        self.invoke(file, &args)
    }

    /// Writes the gateware at `address`, then the BIOS at `address + bios_flash_offset`.
    ///
    /// # Errors
    ///
    /// The first failure; the BIOS is not written if the gateware write fails.
    pub fn flash_gateware_and_bios(
        &mut self,
        bitstream: &Path,
        bios: &Path,
        layout: &FlashConfig,
    ) -> Result<(), ProgrammerError> {
        self.flash(bitstream, layout.address, false)?;
        self.flash(bios, bios_offset(layout), true)
    }

    /// Writes an application image at `address + app_flash_offset`.
    ///
    /// # Errors
    ///
    /// [`ProgrammerError::MissingFile`] or the runner's failure.
    pub fn upload(&mut self, application: &Path, layout: &FlashConfig) -> Result<(), ProgrammerError> {
        self.flash(application, app_offset(layout), true)
    }
}

/// Absolute flash offset of the BIOS.
pub const fn bios_offset(layout: &FlashConfig) -> u64 {
    layout.address.saturating_add(layout.bios_flash_offset)
}

/// Absolute flash offset of the application.
pub const fn app_offset(layout: &FlashConfig) -> u64 {
    layout.address.saturating_add(layout.app_flash_offset)
}
