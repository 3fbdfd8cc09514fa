//! Memory-map composition.
//!
//! `SocBusBuilder` is the open phase of a SoC's address map. It enforces:
//! 1. **Unique names:** Regions and constants are keyed by name; repeats are rejected.
//! 2. **Disjoint decoding:** Decoded regions never overlap; linker windows must sit inside one.
//! 3. **Cache attributes:** Cached regions avoid IO windows; uncached regions live inside one.
//! 4. **Derivation:** Sub-windows of a region never run past its end.
//!
//! `finalize` consumes the builder and returns the immutable [`MemoryMap`].

use std::sync::Arc;

use super::interconnect::{MemoryMap, NamedRegion, SlaveBinding, WidthConversion};
use super::region::SocRegion;
use super::traits::BusSlave;
use crate::common::{AddrRange, CompositionError};

/// Default origins of the standard regions.
pub const DEFAULT_MEM_MAP: &[(&str, u64)] = &[
    ("rom", 0x0000_0000),
    ("sram", 0x0100_0000),
    ("main_ram", 0x4000_0000),
    ("csr", 0xF000_0000),
];

/// Default uncached IO window `[0x8000_0000, 0x1_0000_0000)`.
pub const DEFAULT_IO_REGION: (u64, u64) = (0x8000_0000, 0x8000_0000);

/// Looks up a default origin by region name.
pub fn default_origin(name: &str) -> Option<u64> {
    DEFAULT_MEM_MAP
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, origin)| *origin)
}

const fn align_up(addr: u128, align: u128) -> u128 {
    addr.div_ceil(align) * align
}

/// Open-phase registry of regions, slaves, IO windows and constants.
#[derive(Debug)]
pub struct SocBusBuilder {
    data_width: u32,
    address_width: u32,
    regions: Vec<NamedRegion>,
    slaves: Vec<SlaveBinding>,
    io_regions: Vec<AddrRange>,
    constants: Vec<(String, u64)>,
    reset_address: Option<u64>,
}

impl Default for SocBusBuilder {
    fn default() -> Self {
        Self::new(32, 32)
    }
}

impl SocBusBuilder {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `data_width` - Bus data width in bits; slaves of another width need a converter.
    /// * `address_width` - Bus address width in bits; bounds [`alloc_region`](Self::alloc_region).
    pub const fn new(data_width: u32, address_width: u32) -> Self {
        Self {
            data_width,
            address_width,
            regions: Vec::new(),
            slaves: Vec::new(),
            io_regions: Vec::new(),
            constants: Vec::new(),
            reset_address: None,
        }
    }

    /// Creates a registry with the default IO window.
    pub fn with_default_io() -> Result<Self, CompositionError> {
        let mut bus = Self::default();
        bus.add_io_region(DEFAULT_IO_REGION.0, DEFAULT_IO_REGION.1)?;
        Ok(bus)
    }

    /// Bus data width in bits.
    pub const fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Registers an uncached IO window.
    ///
    /// # Errors
    ///
    /// [`CompositionError::IoRegionOverlap`] if it intersects another IO window.
    pub fn add_io_region(&mut self, origin: u64, size: u64) -> Result<(), CompositionError> {
        let range = AddrRange::new(origin, size);
        if let Some(other) = self.io_regions.iter().find(|io| io.overlaps(&range)) {
            return Err(CompositionError::IoRegionOverlap {
                range,
                other: *other,
            });
        }
        tracing::debug!(%range, "add io region");
        self.io_regions.push(range);
        Ok(())
    }

    fn in_io(&self, range: &AddrRange) -> bool {
        self.io_regions.iter().any(|io| io.contains_range(range))
    }

    fn hits_io(&self, range: &AddrRange) -> bool {
        self.io_regions.iter().any(|io| io.overlaps(range))
    }

    /// Checks a region against every invariant without inserting it.
    fn check(&self, name: &str, region: &SocRegion) -> Result<(), CompositionError> {
        if self.region(name).is_some() {
            return Err(CompositionError::DuplicateRegion {
                name: name.to_owned(),
            });
        }
        let range = region.range();
        if region.size == 0 {
            return Err(CompositionError::ZeroSize {
                name: name.to_owned(),
            });
        }
        if range.exceeds_address_space() {
            return Err(CompositionError::AddressOverflow {
                name: name.to_owned(),
                range,
            });
        }

        if region.linker {
            let backed = self
                .decoded()
                .any(|r| r.region.range().contains_range(&range));
            if !backed {
                return Err(CompositionError::LinkerOutsideDecoded {
                    name: name.to_owned(),
                    range,
                });
            }
            return Ok(());
        }

        if let Some(other) = self.decoded().find(|r| r.region.range().overlaps(&range)) {
            return Err(CompositionError::RegionOverlap {
                name: name.to_owned(),
                range,
                other: other.name.clone(),
                other_range: other.region.range(),
            });
        }
        if region.cached && self.hits_io(&range) {
            return Err(CompositionError::CachedInIoRegion {
                name: name.to_owned(),
                range,
            });
        }
        if !region.cached && !self.in_io(&range) {
            return Err(CompositionError::UncachedOutsideIo {
                name: name.to_owned(),
                range,
            });
        }
        Ok(())
    }

    fn decoded(&self) -> impl Iterator<Item = &NamedRegion> {
        self.regions.iter().filter(|r| r.region.is_decoded())
    }

    /// Registers a named region.
    ///
    /// # Errors
    ///
    /// Any [`CompositionError`] describing the violated invariant; the registry
    /// is left unchanged on error.
    pub fn add_region(&mut self, name: &str, region: SocRegion) -> Result<(), CompositionError> {
        self.check(name, &region)?;
        tracing::debug!(name, %region, "add region");
        self.regions.push(NamedRegion {
            name: name.to_owned(),
            region,
        });
        Ok(())
    }

    /// Registers a region and binds `slave` to it.
    ///
    /// A slave whose data width differs from the bus is recorded as needing a
    /// width converter.
    ///
    /// # Errors
    ///
    /// As [`add_region`](Self::add_region).
    pub fn add_slave(
        &mut self,
        name: &str,
        slave: Arc<dyn BusSlave>,
        region: SocRegion,
    ) -> Result<(), CompositionError> {
        self.add_region(name, region)?;
        self.bind(name, slave, &region);
        Ok(())
    }

    fn bind(&mut self, name: &str, slave: Arc<dyn BusSlave>, region: &SocRegion) {
        let converter = (slave.data_width() != self.data_width).then(|| {
            tracing::debug!(
                name,
                from = slave.data_width(),
                to = self.data_width,
                "slave needs a width converter"
            );
            WidthConversion {
                slave_width: slave.data_width(),
                bus_width: self.data_width,
            }
        });
        if slave.size() < region.size {
            tracing::warn!(
                name,
                slave_size = slave.size(),
                region_size = region.size,
                "region is larger than the slave behind it"
            );
        }
        self.slaves.push(SlaveBinding {
            name: name.to_owned(),
            slave,
            converter,
        });
    }

    /// Allocates a region sized for `slave` and binds the slave to it.
    ///
    /// # Errors
    ///
    /// As [`alloc_region`](Self::alloc_region).
    pub fn alloc_slave(
        &mut self,
        name: &str,
        slave: Arc<dyn BusSlave>,
        cached: bool,
    ) -> Result<SocRegion, CompositionError> {
        let region = self.alloc_region(name, slave.size(), cached)?;
        self.bind(name, slave, &region);
        Ok(region)
    }

    /// Allocates the lowest free origin for a region of `size` bytes.
    ///
    /// The origin is aligned to `size` rounded up to a power of two. Cached
    /// regions are placed outside every IO window; uncached ones inside one.
    ///
    /// # Errors
    ///
    /// [`CompositionError::NoFreeSpace`] if nothing fits below `2^address_width`,
    /// or any error from [`add_region`](Self::add_region).
    pub fn alloc_region(
        &mut self,
        name: &str,
        size: u64,
        cached: bool,
    ) -> Result<SocRegion, CompositionError> {
        if size == 0 {
            return Err(CompositionError::ZeroSize {
                name: name.to_owned(),
            });
        }
        let no_space = || CompositionError::NoFreeSpace {
            name: name.to_owned(),
            size,
        };
        let align = u128::from(size.checked_next_power_of_two().ok_or_else(no_space)?);
        let limit = 1u128 << self.address_width.min(64);
        let mut origin: u128 = 0;

        loop {
            let end = origin + u128::from(size);
            if end > limit {
                return Err(no_space());
            }
            let candidate = AddrRange::new(origin as u64, size);

            if let Some(r) = self.decoded().find(|r| r.region.range().overlaps(&candidate)) {
                origin = align_up(r.region.range().end(), align);
                continue;
            }
            if cached {
                if let Some(io) = self.io_regions.iter().find(|io| io.overlaps(&candidate)) {
                    origin = align_up(io.end(), align);
                    continue;
                }
            } else if !self.in_io(&candidate) {
                let next = self
                    .io_regions
                    .iter()
                    .filter(|io| io.end() > origin)
                    .min_by_key(|io| io.start())
                    .ok_or_else(no_space)?;
                let moved = align_up(origin.max(u128::from(next.start())), align);
                origin = if moved == origin {
                    align_up(next.end(), align)
                } else {
                    moved
                };
                continue;
            }

            let mut region = SocRegion::new(origin as u64, size);
            if !cached {
                region = region.uncached();
            }
            self.add_region(name, region)?;
            return Ok(region);
        }
    }

    /// Computes a sub-window `[base.origin + offset, +size)` of an existing region.
    ///
    /// The result inherits the base's mode and cache attribute and is a linker
    /// window; it is not registered.
    ///
    /// # Errors
    ///
    /// [`CompositionError::UnknownRegion`] if `base` does not exist,
    /// [`CompositionError::ZeroSize`] for an empty window,
    /// [`CompositionError::DerivedOutOfBounds`] if the window runs past the base.
    pub fn derive(&self, base: &str, offset: u64, size: u64) -> Result<SocRegion, CompositionError> {
        let parent = self.region(base).ok_or_else(|| CompositionError::UnknownRegion {
            name: base.to_owned(),
        })?;
        let out_of_bounds = || CompositionError::DerivedOutOfBounds {
            base: base.to_owned(),
            offset,
            size,
            base_size: parent.size,
        };
        if size == 0 {
            return Err(CompositionError::ZeroSize {
                name: base.to_owned(),
            });
        }
        let end = offset.checked_add(size).ok_or_else(out_of_bounds)?;
        if end > parent.size {
            return Err(out_of_bounds());
        }
        let origin = parent.origin.checked_add(offset).ok_or_else(out_of_bounds)?;
        Ok(SocRegion {
            origin,
            size,
            mode: parent.mode,
            cached: parent.cached,
            linker: true,
        })
    }

    /// Returns the origin of an executable region.
    ///
    /// # Errors
    ///
    /// [`CompositionError::UnknownRegion`] or [`CompositionError::NotExecutable`].
    pub fn reset_vector(&self, name: &str) -> Result<u64, CompositionError> {
        let region = self.region(name).ok_or_else(|| CompositionError::UnknownRegion {
            name: name.to_owned(),
        })?;
        if !region.is_executable() {
            return Err(CompositionError::NotExecutable {
                name: name.to_owned(),
            });
        }
        Ok(region.origin)
    }

    /// Points the CPU reset vector at the origin of `name`.
    ///
    /// # Errors
    ///
    /// As [`reset_vector`](Self::reset_vector).
    pub fn set_reset_address(&mut self, name: &str) -> Result<u64, CompositionError> {
        let addr = self.reset_vector(name)?;
        tracing::debug!(name, addr = format_args!("{addr:#x}"), "cpu reset address");
        self.reset_address = Some(addr);
        Ok(addr)
    }

    /// Exports a named integer to firmware.
    ///
    /// # Errors
    ///
    /// [`CompositionError::DuplicateConstant`] if the name is taken.
    pub fn add_constant(&mut self, name: &str, value: u64) -> Result<(), CompositionError> {
        if self.constants.iter().any(|(n, _)| n == name) {
            return Err(CompositionError::DuplicateConstant {
                name: name.to_owned(),
            });
        }
        self.constants.push((name.to_owned(), value));
        Ok(())
    }

    /// Looks up a region by name.
    pub fn region(&self, name: &str) -> Option<&SocRegion> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.region)
    }

    /// All regions in registration order.
    pub fn regions(&self) -> impl Iterator<Item = (&str, &SocRegion)> {
        self.regions.iter().map(|r| (r.name.as_str(), &r.region))
    }

    /// Freezes the registry.
    pub fn finalize(self) -> MemoryMap {
        tracing::debug!(
            regions = self.regions.len(),
            slaves = self.slaves.len(),
            constants = self.constants.len(),
            "memory map finalized"
        );
        MemoryMap::new(
            self.data_width,
            self.regions,
            self.slaves,
            self.io_regions,
            self.constants,
            self.reset_address,
        )
    }
}
