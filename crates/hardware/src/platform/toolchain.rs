//! Synthesis toolchains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::device::Family;
use crate::common::ConfigError;

/// Synthesis / place-and-route flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// Lattice Radiant.
    Radiant,
    /// Yosys + nextpnr-nexus (Project Oxide).
    Oxide,
    /// AMD Vivado.
    Vivado,
}

impl Toolchain {
    /// Default toolchain of a family.
    pub const fn default_for(family: Family) -> Self {
        match family {
            Family::Nexus => Self::Radiant,
            Family::Series7 => Self::Vivado,
        }
    }

    /// Checks the toolchain can target `family`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedToolchain`] otherwise.
    pub fn check(self, family: Family) -> Result<Self, ConfigError> {
        let ok = matches!(
            (self, family),
            (Self::Radiant | Self::Oxide, Family::Nexus) | (Self::Vivado, Family::Series7)
        );
        if ok {
            Ok(self)
        } else {
            Err(ConfigError::UnsupportedToolchain {
                toolchain: self.to_string(),
                family: family.name(),
            })
        }
    }

    /// Bitstream file extension for a load (`flash == false`) or a flash image.
    pub const fn bitstream_extension(self, flash: bool) -> &'static str {
        if flash && matches!(self, Self::Vivado) {
            "bin"
        } else {
            "bit"
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Radiant => "radiant",
            Self::Oxide => "oxide",
            Self::Vivado => "vivado",
        };
        f.write_str(s)
    }
}

impl FromStr for Toolchain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radiant" => Ok(Self::Radiant),
            "oxide" => Ok(Self::Oxide),
            "vivado" => Ok(Self::Vivado),
            _ => Err(ConfigError::UnsupportedToolchain {
                toolchain: s.to_owned(),
                family: "any family",
            }),
        }
    }
}
