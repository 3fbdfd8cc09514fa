//! Firmware image placement checks.
//!
//! Before an image is written to flash or handed to a debugger it is checked
//! against the composed memory map:
//! 1. **Raw images:** Must fit the flash window they are written into.
//! 2. **ELF images:** Every non-empty `PT_LOAD` segment, by physical address,
//!    must lie inside one linker or memory region.

use std::fs;
use std::path::Path;

use object::elf::{FileHeader32, FileHeader64, PT_LOAD};
use object::read::elf::{FileHeader, ProgramHeader};
use object::{Endianness, FileKind};

use crate::common::{AddrRange, FirmwareError};
use crate::soc::MemoryMap;

/// A loadable segment and the region that holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Physical address range of the segment in memory.
    pub range: AddrRange,
    /// Bytes initialized from the file; the rest is zero-filled.
    pub file_size: u64,
    /// Region containing the segment.
    pub region: String,
}

fn read(path: &Path) -> Result<Vec<u8>, FirmwareError> {
    fs::read(path).map_err(|source| FirmwareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks that `len` bytes fit a flash window.
///
/// # Errors
///
/// [`FirmwareError::TooLarge`] otherwise.
pub fn check_raw_len(len: u64, region: &str, window: u64) -> Result<(), FirmwareError> {
    if len > window {
        return Err(FirmwareError::TooLarge {
            len,
            region: region.to_owned(),
            window,
        });
    }
    Ok(())
}

/// Checks that a raw image file fits a flash window.
///
/// # Returns
///
/// The image length.
///
/// # Errors
///
/// [`FirmwareError::Io`] or [`FirmwareError::TooLarge`].
pub fn check_raw_image(path: &Path, region: &str, window: u64) -> Result<u64, FirmwareError> {
    let len = fs::metadata(path)
        .map_err(|source| FirmwareError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    check_raw_len(len, region, window)?;
    tracing::debug!(path = %path.display(), len, region, window, "raw image fits");
    Ok(len)
}

fn elf_error(e: object::read::Error) -> FirmwareError {
    FirmwareError::Elf(e.to_string())
}

fn load_segments<H>(data: &[u8]) -> Result<Vec<(AddrRange, u64)>, FirmwareError>
where
    H: FileHeader<Endian = Endianness>,
{
    let header = H::parse(data).map_err(elf_error)?;
    let endian = header.endian().map_err(elf_error)?;
    let mut segments = Vec::new();
    for ph in header.program_headers(endian, data).map_err(elf_error)? {
        if ph.p_type(endian) != PT_LOAD {
            continue;
        }
        let memsz: u64 = ph.p_memsz(endian).into();
        if memsz == 0 {
            continue;
        }
        let paddr: u64 = ph.p_paddr(endian).into();
        let filesz: u64 = ph.p_filesz(endian).into();
        segments.push((AddrRange::new(paddr, memsz), filesz.min(memsz)));
    }
    Ok(segments)
}

/// Places every loadable segment of an ELF image in the memory map.
///
/// A segment is attributed to the smallest region holding it, so a segment in
/// the `rom` window reports `rom` rather than the flash around it.
///
/// # Errors
///
/// [`FirmwareError::Elf`] if the data is not a 32- or 64-bit ELF file,
/// [`FirmwareError::SegmentOutsideRegions`] for the first segment no region holds.
pub fn check_elf(data: &[u8], map: &MemoryMap) -> Result<Vec<Placement>, FirmwareError> {
    let segments = match FileKind::parse(data).map_err(elf_error)? {
        FileKind::Elf32 => load_segments::<FileHeader32<Endianness>>(data)?,
        FileKind::Elf64 => load_segments::<FileHeader64<Endianness>>(data)?,
        other => return Err(FirmwareError::Elf(format!("not an ELF file ({other:?})"))),
    };

    segments
        .into_iter()
        .map(|(range, file_size)| {
            let region = map
                .linker_regions()
                .filter(|r| r.region.range().contains_range(&range))
                .min_by_key(|r| r.region.size)
                .ok_or(FirmwareError::SegmentOutsideRegions { range })?;
            tracing::debug!(%range, region = %region.name, "segment placed");
            Ok(Placement {
                range,
                file_size,
                region: region.name.clone(),
            })
        })
        .collect()
}

/// Reads an ELF file and places its segments.
///
/// # Errors
///
/// [`FirmwareError::Io`] or as [`check_elf`].
pub fn check_elf_file(path: &Path, map: &MemoryMap) -> Result<Vec<Placement>, FirmwareError> {
    check_elf(&read(path)?, map)
}
