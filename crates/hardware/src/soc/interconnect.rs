//! Frozen SoC memory map and address decoding.
//!
//! This module holds the result of composition. It provides:
//! 1. **Lookup:** Regions, slave bindings and constants by name.
//! 2. **Decoding:** Address to region routing over the decoded regions, sorted by origin.
//! 3. **Export:** A serializable view for firmware headers and JSON maps.
//!
//! A `MemoryMap` never changes after `finalize`; it is `Send + Sync` and meant to be shared via `Arc`.

use std::sync::Arc;

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

use super::region::SocRegion;
use super::traits::BusSlave;
use crate::common::AddrRange;

/// A region with its registry name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamedRegion {
    /// Registry name.
    pub name: String,
    /// The region.
    #[serde(flatten)]
    pub region: SocRegion,
}

/// Width adaptation needed between a slave and the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WidthConversion {
    /// Slave port width in bits.
    pub slave_width: u32,
    /// Bus width in bits.
    pub bus_width: u32,
}

/// A slave bound to a named region.
#[derive(Clone, Debug)]
pub struct SlaveBinding {
    /// Region name.
    pub name: String,
    /// The peripheral.
    pub slave: Arc<dyn BusSlave>,
    /// Converter inserted in front of the slave, if any.
    pub converter: Option<WidthConversion>,
}

impl Serialize for SlaveBinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SlaveBinding", 5)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("kind", self.slave.kind())?;
        s.serialize_field("model", self.slave.name())?;
        s.serialize_field("data_width", &self.slave.data_width())?;
        s.serialize_field("converter", &self.converter)?;
        s.end()
    }
}

/// The finalized address map of a SoC.
#[derive(Clone, Debug, Serialize)]
pub struct MemoryMap {
    data_width: u32,
    regions: Vec<NamedRegion>,
    slaves: Vec<SlaveBinding>,
    #[serde(serialize_with = "serialize_ranges")]
    io_regions: Vec<AddrRange>,
    constants: Vec<(String, u64)>,
    reset_address: Option<u64>,
    /// Indices into `regions` of decoded regions, sorted by origin.
    #[serde(skip)]
    decode_order: Vec<usize>,
}

fn serialize_ranges<S: Serializer>(ranges: &[AddrRange], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(ranges.iter().map(|r| (r.start(), r.len() as u64)))
}

impl MemoryMap {
    pub(crate) fn new(
        data_width: u32,
        regions: Vec<NamedRegion>,
        slaves: Vec<SlaveBinding>,
        io_regions: Vec<AddrRange>,
        constants: Vec<(String, u64)>,
        reset_address: Option<u64>,
    ) -> Self {
        let mut decode_order: Vec<usize> = regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.region.is_decoded())
            .map(|(i, _)| i)
            .collect();
        decode_order.sort_by_key(|&i| regions[i].region.origin);
        Self {
            data_width,
            regions,
            slaves,
            io_regions,
            constants,
            reset_address,
            decode_order,
        }
    }

    /// Bus data width in bits.
    pub const fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Looks up a region by name.
    pub fn region(&self, name: &str) -> Option<&SocRegion> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.region)
    }

    /// All regions in registration order.
    pub fn regions(&self) -> &[NamedRegion] {
        &self.regions
    }

    /// Linker windows and decoded memories firmware may place sections in.
    ///
    /// These are the linker regions plus every decoded region that is not an
    /// IO window (`csr` and other uncached regions are excluded).
    pub fn linker_regions(&self) -> impl Iterator<Item = &NamedRegion> {
        self.regions.iter().filter(|r| r.region.linker || r.region.cached)
    }

    /// All slave bindings in registration order.
    pub fn slaves(&self) -> &[SlaveBinding] {
        &self.slaves
    }

    /// Looks up the slave bound to a region.
    pub fn slave(&self, name: &str) -> Option<&SlaveBinding> {
        self.slaves.iter().find(|s| s.name == name)
    }

    /// Uncached IO windows.
    pub fn io_regions(&self) -> &[AddrRange] {
        &self.io_regions
    }

    /// Exported constants in registration order.
    pub fn constants(&self) -> &[(String, u64)] {
        &self.constants
    }

    /// Looks up a constant by name.
    pub fn constant(&self, name: &str) -> Option<u64> {
        self.constants
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// CPU reset address, if one was set.
    pub const fn reset_address(&self) -> Option<u64> {
        self.reset_address
    }

    /// Routes a bus address to the decoded region that claims it.
    ///
    /// # Returns
    ///
    /// `(region_name, offset)` or `None` if no decoded region covers `addr`.
    pub fn decode(&self, addr: u64) -> Option<(&str, u64)> {
        let idx = self
            .decode_order
            .partition_point(|&i| self.regions[i].region.origin <= addr);
        let candidate = &self.regions[self.decode_order[idx.checked_sub(1)?]];
        candidate
            .region
            .range()
            .contains(addr)
            .then(|| (candidate.name.as_str(), addr - candidate.region.origin))
    }

    /// Serializes the map to pretty JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
