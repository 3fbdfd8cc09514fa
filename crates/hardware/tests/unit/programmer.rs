//! # Programmer Tests
//!
//! openFPGALoader argument vectors and the flashing flows, driven through a
//! mocked command runner.

use std::path::Path;

use mockall::Sequence;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use socboard_core::common::ProgrammerError;
use socboard_core::config::{FlashConfig, ProgrammerConfig};
use socboard_core::programmer::{OpenFpgaLoader, app_offset, bios_offset};

use crate::common::mocks::MockRunner;

fn path_str(p: &Path) -> String {
    p.display().to_string()
}

fn flash_args(file: &Path, offset: &str, external: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "--cable",
        "ft2232",
        "--freq",
        "10000000",
        "-d",
        "/dev/ttyUSB0",
        "--bitstream",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect();
    args.push(path_str(file));
    args.extend(["--write-flash", "--offset", offset].map(str::to_owned));
    if external {
        args.push("--external-flash".to_owned());
    }
    args
}

#[test]
fn test_flash_args_are_bit_exact() {
    let loader = OpenFpgaLoader::new(ProgrammerConfig::default(), MockRunner::new());
    let file = Path::new("build/trenz_cr00103/software/bios/bios.bin");
    assert_eq!(
        loader.flash_args(file, 0x80_0000, true),
        [
            "--cable",
            "ft2232",
            "--freq",
            "10000000",
            "-d",
            "/dev/ttyUSB0",
            "--bitstream",
            "build/trenz_cr00103/software/bios/bios.bin",
            "--write-flash",
            "--offset",
            "8388608",
            "--external-flash",
        ]
    );
    let plain = loader.flash_args(file, 0, false);
    assert_eq!(plain.last().map(String::as_str), Some("0"));
}

#[test]
fn test_load_args_are_bit_exact() {
    let loader = OpenFpgaLoader::new(ProgrammerConfig::default(), MockRunner::new());
    assert_eq!(
        loader.load_args(Path::new("top.bit")),
        [
            "--board",
            "certusnx_versa_evn",
            "--freq",
            "1000000",
            "--bitstream",
            "top.bit",
        ]
    );
}

#[test]
fn test_load_bitstream_runs_programmer() {
    let bit = NamedTempFile::new().unwrap();
    let expected = vec![
        "--board".to_owned(),
        "certusnx_versa_evn".to_owned(),
        "--freq".to_owned(),
        "1000000".to_owned(),
        "--bitstream".to_owned(),
        path_str(bit.path()),
    ];
    let mut runner = MockRunner::new();
    let _ = runner
        .expect_run()
        .withf(move |program, args| program == "openFPGALoader" && args == expected.as_slice())
        .times(1)
        .returning(|_, _| Ok(0));

    let mut loader = OpenFpgaLoader::new(ProgrammerConfig::default(), runner);
    loader.load_bitstream(bit.path()).unwrap();
}

#[test]
fn test_flash_gateware_then_bios() {
    let bit = NamedTempFile::new().unwrap();
    let bios = NamedTempFile::new().unwrap();
    let layout = FlashConfig {
        address: 0x1000,
        ..FlashConfig::default()
    };
    let first = flash_args(bit.path(), "4096", false);
    let second = flash_args(bios.path(), "8392704", true);

    let mut seq = Sequence::new();
    let mut runner = MockRunner::new();
    let _ = runner
        .expect_run()
        .withf(move |_, args| args == first.as_slice())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(0));
    let _ = runner
        .expect_run()
        .withf(move |_, args| args == second.as_slice())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(0));

    let mut loader = OpenFpgaLoader::new(ProgrammerConfig::default(), runner);
    loader
        .flash_gateware_and_bios(bit.path(), bios.path(), &layout)
        .unwrap();
}

#[test]
fn test_gateware_failure_skips_bios() {
    let bit = NamedTempFile::new().unwrap();
    let bios = NamedTempFile::new().unwrap();
    let mut runner = MockRunner::new();
    let _ = runner.expect_run().times(1).returning(|_, _| Ok(2));

    let mut loader = OpenFpgaLoader::new(ProgrammerConfig::default(), runner);
    let err = loader
        .flash_gateware_and_bios(bit.path(), bios.path(), &FlashConfig::default())
        .unwrap_err();
    assert!(matches!(
        &err,
        ProgrammerError::Failed { program, code: 2 } if program == "openFPGALoader"
    ));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_upload_at_application_offset() {
    let app = NamedTempFile::new().unwrap();
    let expected = flash_args(app.path(), "8650752", true);
    let mut runner = MockRunner::new();
    let _ = runner
        .expect_run()
        .withf(move |_, args| args == expected.as_slice())
        .times(1)
        .returning(|_, _| Ok(0));

    let mut loader = OpenFpgaLoader::new(ProgrammerConfig::default(), runner);
    loader.upload(app.path(), &FlashConfig::default()).unwrap();
}

#[test]
fn test_configured_program_and_cable() {
    let app = NamedTempFile::new().unwrap();
    let config = ProgrammerConfig {
        program: "/opt/ofl/bin/openFPGALoader".to_owned(),
        cable: "dirtyJtag".to_owned(),
        ..ProgrammerConfig::default()
    };
    let mut runner = MockRunner::new();
    let _ = runner
        .expect_run()
        .withf(|program, args| program == "/opt/ofl/bin/openFPGALoader" && args[1] == "dirtyJtag")
        .times(1)
        .returning(|_, _| Ok(0));

    let mut loader = OpenFpgaLoader::new(config, runner);
    loader.flash(app.path(), 0, false).unwrap();
}

#[test]
fn test_missing_file_never_runs() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("bios.bin");
    let mut runner = MockRunner::new();
    let _ = runner.expect_run().never();

    let mut loader = OpenFpgaLoader::new(ProgrammerConfig::default(), runner);
    let err = loader.upload(&absent, &FlashConfig::default()).unwrap_err();
    assert!(matches!(&err, ProgrammerError::MissingFile { path } if *path == absent));
    assert_eq!(err.exit_code(), 127);
}

#[test]
fn test_spawn_failure_propagates() {
    let bit = NamedTempFile::new().unwrap();
    let mut runner = MockRunner::new();
    let _ = runner.expect_run().times(1).returning(|program, _| {
        Err(ProgrammerError::Spawn {
            program: program.to_owned(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    });

    let mut loader = OpenFpgaLoader::new(ProgrammerConfig::default(), runner);
    let err = loader.load_bitstream(bit.path()).unwrap_err();
    assert!(matches!(err, ProgrammerError::Spawn { .. }));
    assert_eq!(err.exit_code(), 127);
}

#[test]
fn test_absolute_offsets() {
    let layout = FlashConfig {
        address: 0x10_0000,
        bios_flash_offset: 0x80_0000,
        app_flash_offset: 0x84_0000,
    };
    assert_eq!(bios_offset(&layout), 0x90_0000);
    assert_eq!(app_offset(&layout), 0x94_0000);
    assert_eq!(bios_offset(&FlashConfig::default()), 0x80_0000);
}
