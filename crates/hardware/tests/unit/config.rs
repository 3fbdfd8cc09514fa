//! # Configuration Tests
//!
//! Defaults, JSON parsing and cross-field validation.

use std::io::Write;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::NamedTempFile;

use socboard_core::common::ConfigError;
use socboard_core::config::{Config, TargetKind};
use socboard_core::platform::Toolchain;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.target.kind, TargetKind::TrenzCr00103);
    assert!(config.target.with_led_chaser);
    assert!(config.target.device.is_none());
    assert_eq!(config.sys_clk_freq(), 50_000_000);
    assert_eq!(config.clock.por_width, 16);
    assert_eq!(config.clock.sync_stages, 2);
    assert_eq!(config.flash.address, 0);
    assert_eq!(config.flash.bios_flash_offset, 0x80_0000);
    assert_eq!(config.flash.app_flash_offset, 0x84_0000);
    assert_eq!(config.programmer.program, "openFPGALoader");
    assert_eq!(config.programmer.cable, "ft2232");
    assert_eq!(config.programmer.device_path, "/dev/ttyUSB0");
    assert_eq!(config.programmer.flash_freq, 10_000_000);
    assert_eq!(config.programmer.load_board, "certusnx_versa_evn");
    assert_eq!(config.programmer.load_freq, 1_000_000);
    assert_eq!(config.build.output_dir, PathBuf::from("build"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_json_is_default() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.target.kind, TargetKind::TrenzCr00103);
    assert_eq!(config.flash.app_flash_offset, 0x84_0000);
    assert!(config.target.with_led_chaser);
}

#[test]
fn test_partial_json_overrides() {
    let json = r#"{
        "target": {
            "kind": "newae_cw305",
            "toolchain": "vivado",
            "sys_clk_freq": 75000000,
            "with_led_chaser": false
        },
        "clock": { "sync_stages": 3 },
        "programmer": { "cable": "dirtyJtag" },
        "build": { "output_dir": "/tmp/out" }
    }"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.target.kind, TargetKind::NewaeCw305);
    assert_eq!(config.target.toolchain, Some(Toolchain::Vivado));
    assert_eq!(config.sys_clk_freq(), 75_000_000);
    assert!(!config.target.with_led_chaser);
    assert_eq!(config.clock.sync_stages, 3);
    assert_eq!(config.clock.por_width, 16);
    assert_eq!(config.programmer.cable, "dirtyJtag");
    assert_eq!(config.programmer.device_path, "/dev/ttyUSB0");
    assert_eq!(config.build.output_dir, Path::new("/tmp/out"));
}

#[test]
fn test_board_default_clock() {
    let mut config = Config::default();
    config.target.kind = TargetKind::NewaeCw305;
    assert_eq!(config.sys_clk_freq(), 100_000_000);
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        Config::from_json("{ \"target\": "),
        Err(ConfigError::Json(_))
    ));
    assert!(matches!(
        Config::from_json(r#"{ "target": { "kind": "arty" } }"#),
        Err(ConfigError::Json(_))
    ));
}

#[rstest]
#[case(r#"{ "flash": { "bios_flash_offset": 8388608, "app_flash_offset": 8396800 } }"#)]
#[case(r#"{ "flash": { "app_flash_offset": 8388608 } }"#)]
#[case(r#"{ "clock": { "sync_stages": 0 } }"#)]
#[case(r#"{ "target": { "sys_clk_freq": 0 } }"#)]
fn test_validation_rejects(#[case] json: &str) {
    assert!(matches!(
        Config::from_json(json),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_bios_window_may_touch_application() {
    let json = r#"{ "flash": { "bios_flash_offset": 0, "app_flash_offset": 65536 } }"#;
    assert!(Config::from_json(json).is_ok());
}

#[rstest]
#[case(0)]
#[case(1048576)]
#[case(8323072)]
fn test_application_below_bios_is_accepted(#[case] app: u64) {
    let json = format!(r#"{{ "flash": {{ "app_flash_offset": {app} }} }}"#);
    let config = Config::from_json(&json).unwrap();
    assert_eq!(config.flash.app_flash_offset, app);
}

#[test]
fn test_overlap_message_names_the_window() {
    let json = r#"{ "flash": { "app_flash_offset": 8392704 } }"#;
    let Err(ConfigError::Invalid { detail }) = Config::from_json(json) else {
        panic!("application inside the BIOS window was accepted");
    };
    assert_eq!(
        detail,
        "application offset 0x801000 falls inside the BIOS window [0x00800000, 0x00810000)"
    );
}

#[rstest]
#[case("trenz_cr00103", TargetKind::TrenzCr00103)]
#[case("trenz_cr00103_03_a", TargetKind::TrenzCr00103)]
#[case("newae_cw305", TargetKind::NewaeCw305)]
fn test_target_kind_parse(#[case] text: &str, #[case] kind: TargetKind) {
    assert_eq!(text.parse::<TargetKind>().unwrap(), kind);
}

#[test]
fn test_target_kind_display_and_unknown() {
    assert_eq!(TargetKind::NewaeCw305.to_string(), "newae_cw305");
    assert_eq!(TargetKind::TrenzCr00103.name(), "trenz_cr00103");
    assert!(matches!(
        "arty".parse::<TargetKind>(),
        Err(ConfigError::Invalid { detail }) if detail.contains("arty")
    ));
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "flash": {{ "address": 4096 }} }}"#).unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.flash.address, 4096);
}

#[test]
fn test_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match Config::from_file(&path) {
        Err(ConfigError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}
