//! Board platforms and typed pad requests.
//!
//! A platform is a device plus a pin table. This module provides:
//! 1. **Resources:** An enum of logical signal groups (`Led`, `SpiFlash`, ...).
//! 2. **Pad tables:** Static pin/IO-standard data with connector references.
//! 3. **Requests:** Each pad set is handed out at most once; repeats are an error.
//! 4. **Boards:** The Trenz CR00103-03-A and NewAE CW305 tables.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::common::PlatformError;

/// FPGA part numbers.
pub mod device;

/// NewAE CW305 platform.
pub mod newae_cw305;

/// Synthesis toolchains.
pub mod toolchain;

/// Trenz CR00103-03-A platform.
pub mod trenz_cr00103;

pub use device::{Family, Grade, NexusDevice};
pub use toolchain::Toolchain;

/// Logical signal groups a board may provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Resource {
    /// 12 MHz board clock.
    Clk12,
    /// Configuration restart strobe.
    ProgramN,
    /// Configuration init strobe.
    InitN,
    /// Configuration done strobe.
    Done,
    /// User push-button.
    UserBtn,
    /// Status LEDs (Trenz naming).
    Led,
    /// User LEDs (CW305 naming).
    UserLed,
    /// SPI flash, single data line.
    SpiFlash,
    /// SPI flash, quad data lines.
    SpiFlash4x,
    /// HyperRAM.
    HyperRam,
    /// UART pads.
    Serial,
    /// FTDI channel B bus.
    FtdiB,
    /// LS-CRUVI debug header (extension).
    LsCruvi,
}

impl Resource {
    /// Name used in pin tables and constraint files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clk12 => "clk12",
            Self::ProgramN => "programn",
            Self::InitN => "initn",
            Self::Done => "done",
            Self::UserBtn => "user_btn",
            Self::Led => "led",
            Self::UserLed => "user_led",
            Self::SpiFlash => "spiflash",
            Self::SpiFlash4x => "spiflash4x",
            Self::HyperRam => "hyperram",
            Self::Serial => "serial",
            Self::FtdiB => "ftdi_b",
            Self::LsCruvi => "ls_cruvi",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named group of pins inside a pad set. The top-level signal of a
/// single-pin resource has an empty name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubsignalDef {
    /// Subsignal name.
    pub name: &'static str,
    /// Space-separated ball names or `CONNECTOR:index` references.
    pub pins: &'static str,
    /// IO standard overriding the pad set's.
    pub io_standard: Option<&'static str>,
}

/// One entry of a board pin table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadDef {
    /// Logical resource.
    pub resource: Resource,
    /// Instance number.
    pub index: usize,
    /// Subsignals; a single unnamed entry for plain pins.
    pub subsignals: &'static [SubsignalDef],
    /// Default IO standard of all subsignals.
    pub io_standard: Option<&'static str>,
    /// Extra constraints (e.g. `SLEWRATE=FAST`).
    pub misc: &'static [&'static str],
}

/// A connector: ordered pin list, `-` for unconnected positions.
pub type ConnectorDef = (&'static str, &'static str);

/// A resolved subsignal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pad {
    /// Subsignal name; empty for plain pins.
    pub name: &'static str,
    /// Ball names.
    pub pins: Vec<String>,
    /// Effective IO standard.
    pub io_standard: Option<&'static str>,
}

/// Pads handed out by a platform request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PadSet {
    /// Resource requested.
    pub resource: Resource,
    /// Instance number.
    pub index: usize,
    /// Resolved subsignals.
    pub pads: Vec<Pad>,
    /// Extra constraints.
    pub misc: Vec<&'static str>,
}

impl PadSet {
    /// Looks up a subsignal by name (`""` for plain pins).
    pub fn subsignal(&self, name: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.name == name)
    }

    /// All balls of the set, in table order.
    pub fn pins(&self) -> impl Iterator<Item = &str> {
        self.pads.iter().flat_map(|p| p.pins.iter().map(String::as_str))
    }
}

/// A board that hands out pad sets.
pub trait Platform {
    /// Board name.
    fn name(&self) -> &'static str;

    /// FPGA part number.
    fn device(&self) -> String;

    /// Device family.
    fn family(&self) -> Family;

    /// Claims one pad set.
    ///
    /// # Errors
    ///
    /// [`PlatformError::UnknownResource`] if the board has no such pads,
    /// [`PlatformError::AlreadyRequested`] if they were handed out before.
    fn request(&mut self, resource: Resource, index: usize) -> Result<PadSet, PlatformError>;

    /// Claims every instance of a resource, in index order.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request); fails if the board has no instance at all.
    fn request_all(&mut self, resource: Resource) -> Result<Vec<PadSet>, PlatformError>;
}

/// A platform described by static tables.
#[derive(Debug)]
pub struct BoardPlatform {
    name: &'static str,
    device: String,
    family: Family,
    io: Vec<PadDef>,
    connectors: &'static [ConnectorDef],
    requested: HashSet<(Resource, usize)>,
}

impl BoardPlatform {
    /// Creates a platform from its tables.
    pub fn new(
        name: &'static str,
        device: String,
        family: Family,
        io: &'static [PadDef],
        connectors: &'static [ConnectorDef],
    ) -> Self {
        Self {
            name,
            device,
            family,
            io: io.to_vec(),
            connectors,
            requested: HashSet::new(),
        }
    }

    /// Adds extension pads (e.g. a header module).
    pub fn add_extension(&mut self, pads: &'static [PadDef]) {
        tracing::debug!(board = self.name, pads = pads.len(), "platform extension");
        self.io.extend_from_slice(pads);
    }

    /// Resolves a `CONNECTOR:index` reference to a ball name.
    pub fn resolve_connector(&self, reference: &str) -> Option<&'static str> {
        let (conn, idx) = reference.split_once(':')?;
        let idx: usize = idx.parse().ok()?;
        let (_, pins) = self.connectors.iter().find(|(n, _)| *n == conn)?;
        pins.split_whitespace().nth(idx).filter(|p| *p != "-")
    }

    fn resolve(&self, def: &PadDef) -> Result<PadSet, PlatformError> {
        let unknown = || PlatformError::UnknownResource {
            resource: def.resource.name(),
            index: def.index,
        };
        let mut pads = Vec::with_capacity(def.subsignals.len());
        for sub in def.subsignals {
            let pins = sub
                .pins
                .split_whitespace()
                .map(|p| {
                    if p.contains(':') {
                        self.resolve_connector(p).map(str::to_owned).ok_or_else(unknown)
                    } else {
                        Ok(p.to_owned())
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            pads.push(Pad {
                name: sub.name,
                pins,
                io_standard: sub.io_standard.or(def.io_standard),
            });
        }
        Ok(PadSet {
            resource: def.resource,
            index: def.index,
            pads,
            misc: def.misc.to_vec(),
        })
    }
}

impl Platform for BoardPlatform {
    fn name(&self) -> &'static str {
        self.name
    }

    fn device(&self) -> String {
        self.device.clone()
    }

    fn family(&self) -> Family {
        self.family
    }

    fn request(&mut self, resource: Resource, index: usize) -> Result<PadSet, PlatformError> {
        let def = *self
            .io
            .iter()
            .find(|d| d.resource == resource && d.index == index)
            .ok_or(PlatformError::UnknownResource {
                resource: resource.name(),
                index,
            })?;
        if self.requested.contains(&(resource, index)) {
            return Err(PlatformError::AlreadyRequested {
                resource: resource.name(),
                index,
            });
        }
        let pads = self.resolve(&def)?;
        let _ = self.requested.insert((resource, index));
        tracing::debug!(board = self.name, %resource, index, "pads requested");
        Ok(pads)
    }

    fn request_all(&mut self, resource: Resource) -> Result<Vec<PadSet>, PlatformError> {
        let mut indices: Vec<usize> = self
            .io
            .iter()
            .filter(|d| d.resource == resource)
            .map(|d| d.index)
            .collect();
        if indices.is_empty() {
            return Err(PlatformError::UnknownResource {
                resource: resource.name(),
                index: 0,
            });
        }
        indices.sort_unstable();
        if let Some(&index) = indices
            .iter()
            .find(|i| self.requested.contains(&(resource, **i)))
        {
            return Err(PlatformError::AlreadyRequested {
                resource: resource.name(),
                index,
            });
        }
        indices.into_iter().map(|i| self.request(resource, i)).collect()
    }
}
