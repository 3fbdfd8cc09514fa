//! # Firmware Placement Tests
//!
//! Raw image size checks and ELF segment placement against the Trenz map.

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use socboard_core::common::{AddrRange, FirmwareError};
use socboard_core::firmware::{self, Placement};

use crate::common::harness::trenz_soc;

const PT_NULL: u32 = 0;
const PT_LOAD: u32 = 1;

/// A segment as `(p_type, paddr, filesz, memsz)`.
type Segment = (u32, u32, u32, u32);

/// Builds a little-endian ELF32 RISC-V executable with only program headers.
fn elf32(segments: &[Segment]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    out.extend_from_slice(&0xF3u16.to_le_bytes()); // EM_RISCV
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0x4000_0000u32.to_le_bytes()); // entry
    out.extend_from_slice(&52u32.to_le_bytes()); // phoff
    out.extend_from_slice(&0u32.to_le_bytes()); // shoff
    out.extend_from_slice(&0u32.to_le_bytes()); // flags
    out.extend_from_slice(&52u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&u16::try_from(segments.len()).unwrap().to_le_bytes());
    out.extend_from_slice(&40u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    for &(p_type, paddr, filesz, memsz) in segments {
        for word in [p_type, 0, paddr, paddr, filesz, memsz, 5, 4] {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
    out
}

#[test]
fn test_raw_len() {
    assert!(firmware::check_raw_len(0x1_0000, "rom", 0x1_0000).is_ok());
    assert!(matches!(
        firmware::check_raw_len(0x1_0001, "rom", 0x1_0000),
        Err(FirmwareError::TooLarge { len: 0x1_0001, region, window: 0x1_0000 }) if region == "rom"
    ));
}

#[test]
fn test_raw_image_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0xAA; 300]).unwrap();
    file.flush().unwrap();
    assert_eq!(
        firmware::check_raw_image(file.path(), "rom", 0x1_0000).unwrap(),
        300
    );
    assert!(matches!(
        firmware::check_raw_image(file.path(), "app", 256),
        Err(FirmwareError::TooLarge { len: 300, .. })
    ));
}

#[test]
fn test_raw_image_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        firmware::check_raw_image(&dir.path().join("none.bin"), "rom", 1),
        Err(FirmwareError::Io { .. })
    ));
}

#[test]
fn test_elf_segments_are_placed() {
    let soc = trenz_soc();
    let elf = elf32(&[
        (PT_LOAD, 0x80_0000, 0x400, 0x400),
        (PT_NULL, 0x2000_0000, 0, 0x100),
        (PT_LOAD, 0x4000_0000, 0x800, 0x1000),
        (PT_LOAD, 0x2000_0000, 0, 0),
    ]);
    let placed = firmware::check_elf(&elf, &soc.memory_map).unwrap();
    assert_eq!(
        placed,
        [
            Placement {
                range: AddrRange::new(0x80_0000, 0x400),
                file_size: 0x400,
                region: "rom".to_owned(),
            },
            Placement {
                range: AddrRange::new(0x4000_0000, 0x1000),
                file_size: 0x800,
                region: "main_ram".to_owned(),
            },
        ]
    );
}

#[test]
fn test_elf_segment_spanning_regions_is_rejected() {
    let soc = trenz_soc();
    // Runs off the end of sram.
    let elf = elf32(&[(PT_LOAD, 0x0101_F000, 0x2000, 0x2000)]);
    assert!(matches!(
        firmware::check_elf(&elf, &soc.memory_map),
        Err(FirmwareError::SegmentOutsideRegions { range }) if range == AddrRange::new(0x0101_F000, 0x2000)
    ));
}

#[test]
fn test_elf_segment_in_csr_is_rejected() {
    let soc = trenz_soc();
    let elf = elf32(&[(PT_LOAD, 0xF000_0000, 4, 4)]);
    assert!(matches!(
        firmware::check_elf(&elf, &soc.memory_map),
        Err(FirmwareError::SegmentOutsideRegions { .. })
    ));
}

#[test]
fn test_not_an_elf() {
    let soc = trenz_soc();
    assert!(matches!(
        firmware::check_elf(b"\x00\x01plain binary", &soc.memory_map),
        Err(FirmwareError::Elf(_))
    ));
}

#[test]
fn test_elf_file() {
    let soc = trenz_soc();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&elf32(&[(PT_LOAD, 0x0100_0000, 0x10, 0x10)]))
        .unwrap();
    file.flush().unwrap();
    let placed = firmware::check_elf_file(file.path(), &soc.memory_map).unwrap();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].region, "sram");
}
