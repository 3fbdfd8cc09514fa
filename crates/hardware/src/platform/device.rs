//! FPGA device identifiers.
//!
//! Nexus parts are identified as `LFD2NX-40-<speed>BG196<grade>`, where speed is
//! one of `7`, `8`, `9` and grade one of `C`, `I`, `T`. Anything else, including
//! trailing characters, is rejected.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::common::ConfigError;

const PART: &str = "LFD2NX-40";
const PACKAGE: &str = "BG196";

/// Device family; selects the PLL, oscillator and toolchains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Family {
    /// Lattice CertusPro-NX / Certus-NX (Nexus).
    Nexus,
    /// Xilinx 7-series.
    Series7,
}

impl Family {
    /// Human-readable family name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nexus => "Lattice Nexus",
            Self::Series7 => "Xilinx 7-series",
        }
    }
}

/// Operating temperature grade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Grade {
    /// Commercial.
    C,
    /// Industrial.
    I,
    /// Automotive / extended.
    T,
}

/// A validated `LFD2NX-40-xBG196y` part number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NexusDevice {
    /// Speed grade, 7..=9.
    pub speed: u8,
    /// Temperature grade.
    pub grade: Grade,
}

impl NexusDevice {
    /// Default part on the CR00103-03-A.
    pub const DEFAULT: Self = Self {
        speed: 7,
        grade: Grade::I,
    };
}

impl fmt::Display for NexusDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PART}-{}{PACKAGE}{:?}", self.speed, self.grade)
    }
}

impl FromStr for NexusDevice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidDevice {
            device: s.to_owned(),
            reason: reason.to_owned(),
        };
        let rest = s
            .strip_prefix(PART)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(|| invalid("expected LFD2NX-40- prefix"))?;
        let mut chars = rest.chars();
        let speed = match chars.next() {
            Some(c @ '7'..='9') => c as u8 - b'0',
            _ => return Err(invalid("speed grade must be 7, 8 or 9")),
        };
        let rest = chars
            .as_str()
            .strip_prefix(PACKAGE)
            .ok_or_else(|| invalid("package must be BG196"))?;
        let grade = match rest {
            "C" => Grade::C,
            "I" => Grade::I,
            "T" => Grade::T,
            _ => return Err(invalid("temperature grade must be C, I or T")),
        };
        Ok(Self { speed, grade })
    }
}
