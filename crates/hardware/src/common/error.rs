//! Error definitions.
//!
//! This module defines the error taxonomy of the bring-up core. It provides:
//! 1. **Configuration Errors:** Invalid device identifiers, toolchains and clock requests, raised at construction.
//! 2. **Composition Errors:** Memory-map invariant violations, raised while a SoC is assembled.
//! 3. **Netlist Errors:** Structural faults in the clock/reset signal graph.
//! 4. **Platform Errors:** Bad or repeated pad requests.
//! 5. **Programmer and Firmware Errors:** External process failures and image placement faults.
//!
//! None of these are recovered inside the core; every one is reported upward.

use std::path::PathBuf;

use thiserror::Error;

use super::addr::AddrRange;

/// Errors raised while validating board configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The target device identifier does not match the supported pattern.
    #[error("invalid device `{device}`: {reason}")]
    InvalidDevice {
        /// The rejected identifier.
        device: String,
        /// Which part of the identifier failed.
        reason: String,
    },

    /// The toolchain is not available for the device family.
    #[error("toolchain `{toolchain}` is not supported for {family}")]
    UnsupportedToolchain {
        /// The requested toolchain name.
        toolchain: String,
        /// The device family.
        family: &'static str,
    },

    /// No divider setting reaches the requested frequency.
    #[error("cannot generate {requested_hz} Hz from a {input_hz} Hz reference")]
    UnreachableFrequency {
        /// Requested output frequency.
        requested_hz: u64,
        /// Reference frequency available to the PLL or oscillator.
        input_hz: u64,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {detail}")]
    Invalid {
        /// Description of the problem.
        detail: String,
    },

    /// The JSON configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by the memory-map composer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// A region with this name already exists.
    #[error("region `{name}` already exists")]
    DuplicateRegion {
        /// The repeated name.
        name: String,
    },

    /// The new region intersects an existing decoded region.
    #[error("region `{name}` {range} overlaps `{other}` {other_range}")]
    RegionOverlap {
        /// The rejected region.
        name: String,
        /// Its address range.
        range: AddrRange,
        /// The region already holding the addresses.
        other: String,
        /// Address range of that region.
        other_range: AddrRange,
    },

    /// A derived region would run past the end of its base region.
    #[error(
        "derived window {offset:#x}+{size:#x} exceeds `{base}` (size {base_size:#x})"
    )]
    DerivedOutOfBounds {
        /// The base region name.
        base: String,
        /// Offset into the base region.
        offset: u64,
        /// Requested size of the derived window.
        size: u64,
        /// Size of the base region.
        base_size: u64,
    },

    /// No region with this name exists.
    #[error("unknown region `{name}`")]
    UnknownRegion {
        /// The missing name.
        name: String,
    },

    /// The region cannot hold a reset vector.
    #[error("region `{name}` is not executable")]
    NotExecutable {
        /// The region name.
        name: String,
    },

    /// Zero-sized regions cannot be decoded.
    #[error("region `{name}` has zero size")]
    ZeroSize {
        /// The region name.
        name: String,
    },

    /// `origin + size` runs past the 64-bit address space.
    #[error("region `{name}` {range} exceeds the address space")]
    AddressOverflow {
        /// The region name.
        name: String,
        /// The offending range.
        range: AddrRange,
    },

    /// A linker region does not sit inside any decoded region.
    #[error("linker region `{name}` {range} is not backed by a decoded region")]
    LinkerOutsideDecoded {
        /// The region name.
        name: String,
        /// The offending range.
        range: AddrRange,
    },

    /// A cached region intersects an IO window.
    #[error("cached region `{name}` {range} intersects an IO region")]
    CachedInIoRegion {
        /// The region name.
        name: String,
        /// The offending range.
        range: AddrRange,
    },

    /// An uncached region is not inside any IO window.
    #[error("uncached region `{name}` {range} is outside every IO region")]
    UncachedOutsideIo {
        /// The region name.
        name: String,
        /// The offending range.
        range: AddrRange,
    },

    /// Two IO windows intersect.
    #[error("IO region {range} overlaps IO region {other}")]
    IoRegionOverlap {
        /// The rejected IO window.
        range: AddrRange,
        /// The existing IO window.
        other: AddrRange,
    },

    /// The allocator found no free, aligned slot.
    #[error("no free space for `{name}` ({size:#x} bytes)")]
    NoFreeSpace {
        /// The region name.
        name: String,
        /// Requested size.
        size: u64,
    },

    /// A constant with this name already exists.
    #[error("constant `{name}` already exists")]
    DuplicateConstant {
        /// The repeated name.
        name: String,
    },
}

/// Structural errors in a clock/reset netlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlistError {
    /// A signal or domain name is used twice.
    #[error("duplicate name `{name}`")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// Signal widths must be 1..=64 bits.
    #[error("signal `{name}` has unsupported width {width}")]
    InvalidWidth {
        /// Signal name.
        name: String,
        /// Requested width.
        width: u32,
    },

    /// A signal has more than one driver.
    #[error("signal `{name}` is driven more than once")]
    MultipleDrivers {
        /// Signal name.
        name: String,
    },

    /// Combinational assignments form a cycle.
    #[error("combinational loop through {}", signals.join(" -> "))]
    CombinationalLoop {
        /// Signals on the loop, in dependency order.
        signals: Vec<String>,
    },

    /// A synchronous statement reads a register owned by an unrelated clock.
    #[error("`{signal}` crosses from domain `{from}` to `{to}` without a synchronizer")]
    DomainCrossing {
        /// The register being read.
        signal: String,
        /// Domain owning the register.
        from: String,
        /// Domain of the reading statement.
        to: String,
    },

    /// A reset-less domain was given a reset synchronizer.
    #[error("domain `{domain}` is reset-less")]
    ResetLess {
        /// Domain name.
        domain: String,
    },
}

/// Errors raised by platform resource requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The board has no such resource.
    #[error("platform has no resource {resource}:{index}")]
    UnknownResource {
        /// Logical resource name.
        resource: &'static str,
        /// Requested index.
        index: usize,
    },

    /// The pads were already handed out.
    #[error("resource {resource}:{index} already requested")]
    AlreadyRequested {
        /// Logical resource name.
        resource: &'static str,
        /// Requested index.
        index: usize,
    },
}

/// Errors raised while invoking the external programmer.
#[derive(Debug, Error)]
pub enum ProgrammerError {
    /// The programmer binary could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The programmer exited with a non-zero status.
    #[error("`{program}` exited with status {code}")]
    Failed {
        /// Program name.
        program: String,
        /// Exit code, propagated unchanged to the caller.
        code: i32,
    },

    /// The programmer was killed before it could report a status.
    #[error("`{program}` was terminated by a signal")]
    Terminated {
        /// Program name.
        program: String,
    },

    /// The file to be programmed does not exist.
    #[error("file to program not found: {}", path.display())]
    MissingFile {
        /// Missing path.
        path: PathBuf,
    },
}

impl ProgrammerError {
    /// Returns the process exit code this error should map to.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Spawn { .. } | Self::MissingFile { .. } => 127,
            Self::Terminated { .. } => 1,
        }
    }
}

/// Errors raised while checking firmware image placement.
#[derive(Debug, Error)]
pub enum FirmwareError {
    /// The image could not be read.
    #[error("cannot read image {}: {source}", path.display())]
    Io {
        /// Image path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The ELF headers could not be parsed.
    #[error("malformed ELF image: {0}")]
    Elf(String),

    /// The raw image is larger than its flash window.
    #[error("image of {len:#x} bytes does not fit `{region}` ({window:#x} bytes)")]
    TooLarge {
        /// Image length.
        len: u64,
        /// Target region name.
        region: String,
        /// Window size.
        window: u64,
    },

    /// A loadable segment falls outside every linker region.
    #[error("segment {range} is outside every linker region")]
    SegmentOutsideRegions {
        /// The segment's physical address range.
        range: AddrRange,
    },
}

/// Any error produced by the bring-up core.
#[derive(Debug, Error)]
pub enum Error {
    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// See [`CompositionError`].
    #[error(transparent)]
    Composition(#[from] CompositionError),
    /// See [`NetlistError`].
    #[error(transparent)]
    Netlist(#[from] NetlistError),
    /// See [`PlatformError`].
    #[error(transparent)]
    Platform(#[from] PlatformError),
    /// See [`ProgrammerError`].
    #[error(transparent)]
    Programmer(#[from] ProgrammerError),
    /// See [`FirmwareError`].
    #[error(transparent)]
    Firmware(#[from] FirmwareError),
    /// Writing build artifacts failed.
    #[error("cannot write {}: {source}", path.display())]
    Artifact {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for the bring-up core.
pub type Result<T> = std::result::Result<T, Error>;
