//! # Frozen Memory Map Tests
//!
//! Lookups, address decoding and JSON export of a finalized map.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use socboard_core::common::MIB;
use socboard_core::soc::{MemoryMap, Mode, SocBusBuilder, SocRegion};

use crate::common::mocks::TestSlave;

fn sample_map() -> MemoryMap {
    let mut bus = SocBusBuilder::with_default_io().unwrap();
    let _ = bus
        .alloc_slave("spiflash", Arc::new(TestSlave::new(16 * MIB)), true)
        .unwrap();
    let rom = bus.derive("spiflash", 0x80_0000, 0x1_0000).unwrap();
    bus.add_region("rom", rom).unwrap();
    bus.add_region("sram", SocRegion::new(0x0100_0000, 0x2_0000))
        .unwrap();
    bus.add_region(
        "csr",
        SocRegion::new(0xF000_0000, 0x1_0000)
            .with_mode(Mode::R | Mode::W)
            .uncached(),
    )
    .unwrap();
    let _ = bus.set_reset_address("rom").unwrap();
    bus.finalize()
}

#[test]
fn test_decode_routes_to_decoded_regions_only() {
    let map = sample_map();
    assert_eq!(map.decode(0x0), Some(("spiflash", 0)));
    // The rom window is a linker region; the flash decodes it.
    assert_eq!(map.decode(0x80_0010), Some(("spiflash", 0x80_0010)));
    assert_eq!(map.decode(0x0101_FFFF), Some(("sram", 0x1_FFFF)));
    assert_eq!(map.decode(0x0102_0000), None);
    assert_eq!(map.decode(0xF000_0004), Some(("csr", 4)));
    assert_eq!(map.decode(0xFFFF_FFFF), None);
}

#[test]
fn test_linker_regions_exclude_io() {
    let map = sample_map();
    let names: Vec<_> = map.linker_regions().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["spiflash", "rom", "sram"]);
}

#[test]
fn test_lookups() {
    let map = sample_map();
    assert_eq!(map.data_width(), 32);
    assert_eq!(map.region("rom").map(|r| r.origin), Some(0x80_0000));
    assert!(map.region("main_ram").is_none());
    assert_eq!(map.reset_address(), Some(0x80_0000));
    assert_eq!(map.io_regions().len(), 1);
    assert_eq!(map.slaves().len(), 1);
    assert_eq!(map.slave("spiflash").unwrap().slave.kind(), "test");
    assert!(map.constants().is_empty());
}

#[test]
fn test_json_export() {
    let map = sample_map();
    let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
    let regions = json["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 4);
    assert_eq!(regions[1]["name"], "rom");
    assert_eq!(regions[1]["origin"], 0x80_0000);
    assert_eq!(regions[1]["linker"], true);
    assert_eq!(regions[3]["mode"], "rw");
    assert_eq!(json["reset_address"], 0x80_0000);
    assert_eq!(json["io_regions"][0][0], 0x8000_0000u64);
    assert_eq!(json["slaves"][0]["kind"], "test");
}

#[test]
fn test_map_is_shareable_across_threads() {
    let map = Arc::new(sample_map());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let map = Arc::clone(&map);
            thread::spawn(move || map.decode(0x0100_0000 + i).map(|(n, o)| (n.to_owned(), o)))
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), Some(("sram".to_owned(), i as u64)));
    }
}
