//! Trenz Electronic CR00103-03-A (Certus-NX `LFD2NX-40`, BG196).

use super::device::{Family, NexusDevice};
use super::toolchain::Toolchain;
use super::{BoardPlatform, ConnectorDef, PadDef, Resource, SubsignalDef};
use crate::common::ConfigError;

/// Board name.
pub const NAME: &str = "trenz_cr00103_03_a";

/// Constraint releasing the Master-SPI port as general IO.
pub const SYSCONFIG: &str = "ldc_set_sysconfig {MASTER_SPI_PORT=DISABLE}";

const fn pin(name: &'static str, pins: &'static str) -> SubsignalDef {
    SubsignalDef {
        name,
        pins,
        io_standard: None,
    }
}

const fn pin_std(name: &'static str, pins: &'static str, io: &'static str) -> SubsignalDef {
    SubsignalDef {
        name,
        pins,
        io_standard: Some(io),
    }
}

const fn single(resource: Resource, index: usize, pins: &'static [SubsignalDef]) -> PadDef {
    PadDef {
        resource,
        index,
        subsignals: pins,
        io_standard: Some("LVCMOS33"),
        misc: &[],
    }
}

const CLK12: &[SubsignalDef] = &[pin("", "B1")];
const PROGRAMN: &[SubsignalDef] = &[pin("", "A2")];
const INITN: &[SubsignalDef] = &[pin("", "B2")];
const DONE: &[SubsignalDef] = &[pin("", "A3")];
const USER_BTN: &[SubsignalDef] = &[pin("", "A7")];
const LED0: &[SubsignalDef] = &[pin("", "A8")];
const LED1: &[SubsignalDef] = &[pin("", "B8")];
const SPIFLASH: &[SubsignalDef] = &[
    pin("clk", "B3"),
    pin("cs_n", "B4"),
    pin("dq", "A4 A5 A6 B7"),
];
const SERIAL: &[SubsignalDef] = &[pin("tx", "F11"), pin("rx", "C11")];
const FTDI_B: &[SubsignalDef] = &[
    pin("BDBUS", "C11 F11 D12 F12 C14 D14 E13 E14"),
    pin("BCBUS", "G14 F10 G13 G10 G12"),
];
const HYPERRAM: &[SubsignalDef] = &[
    pin_std("dq", "K4 N5 L6 M4 K5 L4 N4 P4", "LVCMOS18H"),
    pin_std("rwds", "P5", "LVCMOS18H"),
    pin_std("flash_cs", "N6", "LVCMOS18H"),
    pin_std("rst_n", "P6", "LVCMOS18H"),
    pin_std("cs_n", "M7", "LVCMOS18H"),
    pin_std("clk", "N7", "LVDS"),
];

static IO: &[PadDef] = &[
    single(Resource::Clk12, 0, CLK12),
    single(Resource::ProgramN, 0, PROGRAMN),
    single(Resource::InitN, 0, INITN),
    single(Resource::Done, 0, DONE),
    single(Resource::UserBtn, 0, USER_BTN),
    single(Resource::Led, 0, LED0),
    single(Resource::Led, 1, LED1),
    single(Resource::SpiFlash, 0, SPIFLASH),
    single(Resource::SpiFlash4x, 0, SPIFLASH),
    PadDef {
        resource: Resource::HyperRam,
        index: 0,
        subsignals: HYPERRAM,
        io_standard: None,
        misc: &["SLEWRATE=FAST"],
    },
    single(Resource::Serial, 0, SERIAL),
    single(Resource::FtdiB, 0, FTDI_B),
];

static CONNECTORS: &[ConnectorDef] = &[
    ("LS_CRUVI", "B5 D1 C4 C1 D3 - C3 C2 D2 - - -"),
    (
        "HS_CRUVI",
        "-   L8  E10 -   D11 K10 E11 K9  -   M8  E9  -   -   K11 J14 K12 \
         J13 -   -   K13 M14 K14 M13 -   -   L13 P11 L14 N11 -   -   M11 \
         P10 L12 XXX N10 -   N13 P9  N14 N9  -   -   P12 P8  P13 N8 -   \
         -   -   E5  -   D5  -   F14 -   F13 -   E3  -",
    ),
    (
        "J4",
        "-   -   H5  H6  H3  H4  H1  H2  J1  J2  J3  J4  J5  J6  M9  L9 \
         -   -   D13 C10 C13 B10 B12 A10 B14 B9  A12 A9  H12 H13 H11 H14 \
         -   -",
    ),
    (
        "J5",
        "-   -   G5  G6  G3  G4  F5  F6  G1  G2  F2  F1  E2  E1  K7  K8 \
         -   -   C4  K2  D8  D6  D7  E6  D8  E7  B13 C9  K1  K3  L1  L3 \
         -   -",
    ),
];

const LS_CRUVI_PINS: &[SubsignalDef] = &[
    pin("sda", "LS_CRUVI:0"),
    pin("scl", "LS_CRUVI:1"),
    pin("d3", "LS_CRUVI:2"),
    pin("sel", "LS_CRUVI:3"),
    pin("d2", "LS_CRUVI:4"),
    pin("d1", "LS_CRUVI:6"),
    pin("sck", "LS_CRUVI:7"),
    pin("d0", "LS_CRUVI:8"),
];

/// LS-CRUVI header pads, resolved through the `LS_CRUVI` connector.
pub static LS_CRUVI: &[PadDef] = &[single(Resource::LsCruvi, 0, LS_CRUVI_PINS)];

/// Creates the platform.
///
/// # Arguments
///
/// * `device` - Part number; must match `LFD2NX-40-[789]BG196[CIT]`.
/// * `toolchain` - `radiant` or `oxide`.
///
/// # Errors
///
/// [`ConfigError::InvalidDevice`] or [`ConfigError::UnsupportedToolchain`].
pub fn platform(device: &str, toolchain: Toolchain) -> Result<BoardPlatform, ConfigError> {
    let device: NexusDevice = device.parse()?;
    let _ = toolchain.check(Family::Nexus)?;
    Ok(BoardPlatform::new(
        NAME,
        device.to_string(),
        Family::Nexus,
        IO,
        CONNECTORS,
    ))
}
