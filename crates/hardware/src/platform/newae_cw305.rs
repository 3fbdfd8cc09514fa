//! NewAE CW305 Artix FPGA target board.

use super::device::Family;
use super::toolchain::Toolchain;
use super::{BoardPlatform, PadDef, Resource, SubsignalDef};
use crate::common::ConfigError;

/// Board name.
pub const NAME: &str = "newae_cw305";

/// FPGA part number.
pub const DEVICE: &str = "xc7a100tftg256-2";

const fn led(index: usize, pins: &'static [SubsignalDef]) -> PadDef {
    PadDef {
        resource: Resource::UserLed,
        index,
        subsignals: pins,
        io_standard: Some("LVCMOS33"),
        misc: &[],
    }
}

const fn ball(pins: &'static str) -> SubsignalDef {
    SubsignalDef {
        name: "",
        pins,
        io_standard: None,
    }
}

const LED0: &[SubsignalDef] = &[ball("T2")];
const LED1: &[SubsignalDef] = &[ball("T3")];
const LED2: &[SubsignalDef] = &[ball("T4")];

static IO: &[PadDef] = &[led(0, LED0), led(1, LED1), led(2, LED2)];

/// Creates the platform.
///
/// # Errors
///
/// [`ConfigError::UnsupportedToolchain`] for anything but `vivado`.
pub fn platform(toolchain: Toolchain) -> Result<BoardPlatform, ConfigError> {
    let _ = toolchain.check(Family::Series7)?;
    Ok(BoardPlatform::new(
        NAME,
        DEVICE.to_owned(),
        Family::Series7,
        IO,
        &[],
    ))
}
