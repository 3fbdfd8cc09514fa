//! Address regions of the SoC bus.
//!
//! A [`SocRegion`] is an address window with access flags:
//! 1. **Decoded regions:** Backed by a bus slave; no two may overlap.
//! 2. **Linker regions:** Firmware-layout windows carved out of a decoded region.
//! 3. **Cache attribute:** Cached regions stay clear of IO windows, uncached ones sit inside one.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Serialize, Serializer};

use crate::common::{AddrRange, ConfigError};

bitflags! {
    /// Access permissions of a region: `r w x`.
    pub struct Mode: u8 {
        /// Readable.
        const R = 1 << 0;
        /// Writable.
        const W = 1 << 1;
        /// Executable.
        const X = 1 << 2;
    }
}

impl Mode {
    /// Read-write-execute.
    pub const RWX: Self = Self::all();
}

impl Default for Mode {
    fn default() -> Self {
        Self::RWX
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, c) in [(Self::R, 'r'), (Self::W, 'w'), (Self::X, 'x')] {
            if self.contains(flag) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    /// Parses `"r"`, `"rw"`, `"rwx"`, `"rx"`... in any order, each letter at most once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mode = Self::empty();
        for c in s.chars() {
            let flag = match c {
                'r' => Self::R,
                'w' => Self::W,
                'x' => Self::X,
                _ => {
                    return Err(ConfigError::Invalid {
                        detail: format!("bad region mode `{s}`"),
                    });
                }
            };
            if mode.contains(flag) {
                return Err(ConfigError::Invalid {
                    detail: format!("repeated flag in region mode `{s}`"),
                });
            }
            mode |= flag;
        }
        Ok(mode)
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An address window on the SoC bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SocRegion {
    /// First byte address.
    pub origin: u64,
    /// Size in bytes.
    pub size: u64,
    /// Access permissions.
    pub mode: Mode,
    /// Whether accesses go through the CPU caches.
    pub cached: bool,
    /// Firmware-layout window inside a decoded region; never decoded itself.
    pub linker: bool,
}

impl SocRegion {
    /// A cached, `rwx`, decoded region.
    pub fn new(origin: u64, size: u64) -> Self {
        Self {
            origin,
            size,
            mode: Mode::RWX,
            cached: true,
            linker: false,
        }
    }

    /// Sets the access mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Marks the region uncached.
    #[must_use]
    pub const fn uncached(mut self) -> Self {
        self.cached = false;
        self
    }

    /// Marks the region as a linker window.
    #[must_use]
    pub const fn linker(mut self) -> Self {
        self.linker = true;
        self
    }

    /// The covered address range.
    pub const fn range(&self) -> AddrRange {
        AddrRange::new(self.origin, self.size)
    }

    /// Whether code may be fetched from the region.
    pub const fn is_executable(&self) -> bool {
        self.mode.contains(Mode::X)
    }

    /// Whether the region is decoded by the bus (not a linker window).
    pub const fn is_decoded(&self) -> bool {
        !self.linker
    }
}

impl fmt::Display for SocRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}{}",
            self.range(),
            self.mode,
            if self.cached { "" } else { " uncached" },
            if self.linker { " linker" } else { "" }
        )
    }
}
