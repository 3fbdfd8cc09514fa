//! # Platform Tests
//!
//! Device identifiers, toolchain checks and pad requests on both boards.

use pretty_assertions::assert_eq;
use rstest::rstest;

use socboard_core::common::{ConfigError, PlatformError};
use socboard_core::platform::{
    Family, Grade, NexusDevice, Platform, Resource, Toolchain, newae_cw305, trenz_cr00103,
};

fn trenz() -> socboard_core::platform::BoardPlatform {
    trenz_cr00103::platform("LFD2NX-40-7BG196I", Toolchain::Radiant).unwrap()
}

#[rstest]
#[case("LFD2NX-40-7BG196I", 7, Grade::I)]
#[case("LFD2NX-40-8BG196C", 8, Grade::C)]
#[case("LFD2NX-40-9BG196T", 9, Grade::T)]
fn test_valid_device_ids(#[case] id: &str, #[case] speed: u8, #[case] grade: Grade) {
    let dev: NexusDevice = id.parse().unwrap();
    assert_eq!(dev, NexusDevice { speed, grade });
    assert_eq!(dev.to_string(), id);
}

#[rstest]
#[case("LFD2NX-40-6BG196I")]
#[case("LFD2NX-40-7BG196X")]
#[case("LFD2NX-40-7BG256I")]
#[case("LFD2NX-17-7BG196I")]
#[case("LFD2NX-40-7BG196IX")]
#[case("lfd2nx-40-7bg196i")]
#[case("")]
fn test_invalid_device_ids(#[case] id: &str) {
    assert!(matches!(
        id.parse::<NexusDevice>(),
        Err(ConfigError::InvalidDevice { device, .. }) if device == id
    ));
}

#[test]
fn test_platform_rejects_bad_device_and_toolchain() {
    assert!(matches!(
        trenz_cr00103::platform("LFD2NX-40-6BG196I", Toolchain::Radiant),
        Err(ConfigError::InvalidDevice { .. })
    ));
    assert!(matches!(
        trenz_cr00103::platform("LFD2NX-40-7BG196I", Toolchain::Vivado),
        Err(ConfigError::UnsupportedToolchain { .. })
    ));
    assert!(trenz_cr00103::platform("LFD2NX-40-7BG196I", Toolchain::Oxide).is_ok());
    assert!(matches!(
        newae_cw305::platform(Toolchain::Radiant),
        Err(ConfigError::UnsupportedToolchain { .. })
    ));
}

#[rstest]
#[case(Toolchain::Radiant, Family::Nexus, true)]
#[case(Toolchain::Oxide, Family::Nexus, true)]
#[case(Toolchain::Vivado, Family::Nexus, false)]
#[case(Toolchain::Vivado, Family::Series7, true)]
#[case(Toolchain::Oxide, Family::Series7, false)]
fn test_toolchain_family_matrix(
    #[case] toolchain: Toolchain,
    #[case] family: Family,
    #[case] ok: bool,
) {
    assert_eq!(toolchain.check(family).is_ok(), ok);
}

#[test]
fn test_toolchain_names_and_extensions() {
    assert_eq!("oxide".parse::<Toolchain>().unwrap(), Toolchain::Oxide);
    assert!("diamond".parse::<Toolchain>().is_err());
    assert_eq!(Toolchain::default_for(Family::Nexus), Toolchain::Radiant);
    assert_eq!(Toolchain::default_for(Family::Series7), Toolchain::Vivado);
    assert_eq!(Toolchain::Radiant.bitstream_extension(true), "bit");
    assert_eq!(Toolchain::Vivado.bitstream_extension(false), "bit");
    assert_eq!(Toolchain::Vivado.bitstream_extension(true), "bin");
}

#[test]
fn test_request_resolves_pads() {
    let mut p = trenz();
    assert_eq!(p.name(), "trenz_cr00103_03_a");
    assert_eq!(p.device(), "LFD2NX-40-7BG196I");
    assert_eq!(p.family(), Family::Nexus);

    let flash = p.request(Resource::SpiFlash, 0).unwrap();
    assert_eq!(flash.subsignal("clk").unwrap().pins, ["B3"]);
    assert_eq!(
        flash.pins().collect::<Vec<_>>(),
        ["B3", "B4", "A4", "A5", "A6", "B7"]
    );
    assert_eq!(flash.subsignal("dq").unwrap().io_standard, Some("LVCMOS33"));

    let ram = p.request(Resource::HyperRam, 0).unwrap();
    assert_eq!(ram.subsignal("clk").unwrap().io_standard, Some("LVDS"));
    assert_eq!(ram.misc, ["SLEWRATE=FAST"]);
}

#[test]
fn test_pads_are_handed_out_once() {
    let mut p = trenz();
    let _ = p.request(Resource::Led, 0).unwrap();
    assert_eq!(
        p.request(Resource::Led, 0).unwrap_err(),
        PlatformError::AlreadyRequested {
            resource: "led",
            index: 0
        }
    );
    assert_eq!(
        p.request_all(Resource::Led).unwrap_err(),
        PlatformError::AlreadyRequested {
            resource: "led",
            index: 0
        }
    );
    // The failed request_all claimed nothing.
    assert!(p.request(Resource::Led, 1).is_ok());
}

#[test]
fn test_unknown_resource() {
    let mut p = trenz();
    assert_eq!(
        p.request(Resource::Led, 7).unwrap_err(),
        PlatformError::UnknownResource {
            resource: "led",
            index: 7
        }
    );
    assert!(matches!(
        p.request_all(Resource::UserLed),
        Err(PlatformError::UnknownResource { .. })
    ));
    assert!(matches!(
        p.request(Resource::LsCruvi, 0),
        Err(PlatformError::UnknownResource { .. })
    ));
}

#[test]
fn test_request_all_in_index_order() {
    let mut cw = newae_cw305::platform(Toolchain::Vivado).unwrap();
    let leds = cw.request_all(Resource::UserLed).unwrap();
    let indices: Vec<_> = leds.iter().map(|l| l.index).collect();
    assert_eq!(indices, [0, 1, 2]);
    let balls: Vec<_> = leds.iter().flat_map(|l| l.pins()).collect();
    assert_eq!(balls, ["T2", "T3", "T4"]);
    assert_eq!(cw.device(), "xc7a100tftg256-2");
    assert_eq!(cw.family(), Family::Series7);
}

#[test]
fn test_connector_references() {
    let p = trenz();
    assert_eq!(p.resolve_connector("LS_CRUVI:0"), Some("B5"));
    assert_eq!(p.resolve_connector("LS_CRUVI:8"), Some("D2"));
    assert_eq!(p.resolve_connector("LS_CRUVI:5"), None);
    assert_eq!(p.resolve_connector("J4:2"), Some("H5"));
    assert_eq!(p.resolve_connector("NOPE:0"), None);
    assert_eq!(p.resolve_connector("LS_CRUVI"), None);
}

#[test]
fn test_ls_cruvi_extension() {
    let mut p = trenz();
    p.add_extension(trenz_cr00103::LS_CRUVI);
    let cruvi = p.request(Resource::LsCruvi, 0).unwrap();
    assert_eq!(cruvi.subsignal("sda").unwrap().pins, ["B5"]);
    assert_eq!(cruvi.subsignal("d1").unwrap().pins, ["C3"]);
    assert_eq!(cruvi.subsignal("d0").unwrap().pins, ["D2"]);
    assert_eq!(cruvi.pads.len(), 8);
}
