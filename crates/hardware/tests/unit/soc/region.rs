//! # Region Attribute Tests

use rstest::rstest;

use socboard_core::soc::{Mode, SocRegion};

#[rstest]
#[case("r", Mode::R)]
#[case("rw", Mode::R | Mode::W)]
#[case("xr", Mode::R | Mode::X)]
#[case("rwx", Mode::RWX)]
#[case("", Mode::empty())]
fn test_mode_parse(#[case] text: &str, #[case] expected: Mode) {
    assert_eq!(text.parse::<Mode>().unwrap(), expected);
}

#[test]
fn test_mode_display_is_canonical() {
    assert_eq!((Mode::X | Mode::R).to_string(), "rx");
    assert_eq!(Mode::RWX.to_string(), "rwx");
}

#[test]
fn test_region_defaults_and_builders() {
    let r = SocRegion::new(0x4000_0000, 0x80_0000);
    assert!(r.cached);
    assert!(!r.linker);
    assert!(r.is_decoded());
    assert!(r.is_executable());

    let io = r.with_mode(Mode::R | Mode::W).uncached();
    assert!(!io.cached);
    assert!(!io.is_executable());
    assert_eq!(io.to_string(), "[0x40000000, 0x40800000) rw uncached");
    assert!(!r.linker().is_decoded());
}
