//! Firmware-facing build artifacts.
//!
//! The [`Builder`] owns the output directory of one target and writes what a
//! firmware build consumes:
//! 1. **`regions.ld`:** A linker `MEMORY` block of the linker and memory regions.
//! 2. **`mem.h`:** `<NAME>_BASE` / `<NAME>_SIZE` defines for the same regions.
//! 3. **`soc.h`:** Exported constants, the clock frequency and the reset address.
//! 4. **`memory_map.json`:** The full SoC summary for tooling.
//!
//! It also names the gateware and BIOS images the programmer writes.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::soc::MemoryMap;
use crate::target::Soc;

/// Which image a bitstream is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitstreamMode {
    /// Volatile load into configuration SRAM.
    Sram,
    /// Image written to SPI flash.
    Flash,
}

/// Paths written by [`Builder::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
    /// Linker memory regions.
    pub regions_ld: PathBuf,
    /// Region base/size header.
    pub mem_h: PathBuf,
    /// SoC constants header.
    pub soc_h: PathBuf,
    /// JSON export of the SoC.
    pub memory_map_json: PathBuf,
}

/// Output layout of one target: `<root>/<target>/{gateware,software}`.
#[derive(Clone, Debug)]
pub struct Builder {
    output_dir: PathBuf,
}

impl Builder {
    /// Creates a builder writing below `<output_root>/<target>`.
    pub fn new(output_root: &Path, soc: &Soc) -> Self {
        Self {
            output_dir: output_root.join(soc.target.name()),
        }
    }

    /// Target output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Gateware directory (bitstreams, constraints).
    pub fn gateware_dir(&self) -> PathBuf {
        self.output_dir.join("gateware")
    }

    /// Software directory (BIOS, generated headers).
    pub fn software_dir(&self) -> PathBuf {
        self.output_dir.join("software")
    }

    /// Generated include directory.
    pub fn generated_dir(&self) -> PathBuf {
        self.software_dir().join("include").join("generated")
    }

    /// Bitstream produced by the toolchain for `mode`.
    pub fn bitstream_filename(&self, soc: &Soc, mode: BitstreamMode) -> PathBuf {
        let ext = soc.toolchain.bitstream_extension(mode == BitstreamMode::Flash);
        self.gateware_dir().join(format!("{}.{ext}", soc.build_name))
    }

    /// BIOS image written at the BIOS flash offset.
    pub fn bios_filename(&self) -> PathBuf {
        self.software_dir().join("bios").join("bios.bin")
    }

    /// Writes every artifact.
    ///
    /// # Errors
    ///
    /// [`Error::Artifact`] naming the path that could not be written.
    pub fn build(&self, soc: &Soc) -> Result<Artifacts> {
        let generated = self.generated_dir();
        fs::create_dir_all(&generated).map_err(|source| Error::Artifact {
            path: generated.clone(),
            source,
        })?;
        let map = &soc.memory_map;

        let artifacts = Artifacts {
            regions_ld: generated.join("regions.ld"),
            mem_h: generated.join("mem.h"),
            soc_h: generated.join("soc.h"),
            memory_map_json: self.output_dir.join("memory_map.json"),
        };
        write(&artifacts.regions_ld, &regions_ld(map))?;
        write(&artifacts.mem_h, &mem_h(map))?;
        write(&artifacts.soc_h, &soc_h(soc))?;
        let json = serde_json::to_string_pretty(&soc.summary()).map_err(|e| Error::Artifact {
            path: artifacts.memory_map_json.clone(),
            source: e.into(),
        })?;
        write(&artifacts.memory_map_json, &json)?;

        tracing::info!(dir = %self.output_dir.display(), "artifacts written");
        Ok(artifacts)
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    tracing::debug!(path = %path.display(), bytes = contents.len(), "write");
    fs::write(path, contents).map_err(|source| Error::Artifact {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders the linker `MEMORY` block.
pub fn regions_ld(map: &MemoryMap) -> String {
    let mut out = String::from("MEMORY {\n");
    for r in map.linker_regions() {
        let _ = writeln!(
            out,
            "\t{} : ORIGIN = {:#010x}, LENGTH = {:#010x}",
            r.name, r.region.origin, r.region.size
        );
    }
    out.push_str("}\n");
    out
}

/// Renders region base/size defines.
pub fn mem_h(map: &MemoryMap) -> String {
    let mut out = String::from("#ifndef __GENERATED_MEM_H\n#define __GENERATED_MEM_H\n\n");
    for r in map.linker_regions() {
        let name = r.name.to_uppercase();
        let _ = writeln!(out, "#ifndef {name}_BASE");
        let _ = writeln!(out, "#define {name}_BASE {:#010x}L", r.region.origin);
        let _ = writeln!(out, "#define {name}_SIZE {:#010x}", r.region.size);
        let _ = writeln!(out, "#endif\n");
    }
    out.push_str("#endif\n");
    out
}

/// Renders SoC constants.
pub fn soc_h(soc: &Soc) -> String {
    let mut out = String::from("#ifndef __GENERATED_SOC_H\n#define __GENERATED_SOC_H\n");
    let _ = writeln!(out, "#define CONFIG_IDENTIFIER \"{}\"", soc.ident);
    let _ = writeln!(out, "#define CONFIG_CLOCK_FREQUENCY {}", soc.sys_clk_freq);
    if let Some(addr) = soc.memory_map.reset_address() {
        let _ = writeln!(out, "#define CONFIG_CPU_RESET_ADDR {addr:#x}");
    }
    for (name, value) in soc.memory_map.constants() {
        let _ = writeln!(out, "#define {name} {value:#x}");
    }
    out.push_str("#endif\n");
    out
}
