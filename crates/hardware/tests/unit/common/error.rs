//! Error Classification Tests.
//!
//! Verifies that every bring-up error lands in the right failure class and that the
//! user-facing messages read the way the board reports them.

use std::io;
use std::path::PathBuf;

use rl78sim_core::common::{
    AccessFault, BringUpError, ErrorKind, FirmwareFailure, LoadError, MapError, PhysAddr,
    RealizeError,
};

// ══════════════════════════════════════════════════════════
// 1. Failure classes
// ══════════════════════════════════════════════════════════

#[test]
fn configuration_errors_are_classified() {
    let errors = [
        BringUpError::UnknownCpuModel("g14".into()),
        BringUpError::TooManyCpus {
            requested: 2,
            max: 1,
        },
        BringUpError::RamTooLarge {
            requested: 8192,
            ceiling: 4096,
        },
        BringUpError::MissingFirmware,
    ];
    for err in &errors {
        assert_eq!(err.kind(), ErrorKind::Configuration, "{err}");
    }
}

#[test]
fn missing_file_is_io() {
    let err = BringUpError::FirmwareNotFound("blinky.elf".into());
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn load_failures_are_load_validation() {
    let oversized = BringUpError::FirmwareLoad {
        name: "big.elf".into(),
        failure: FirmwareFailure::Oversized {
            size: 65537,
            capacity: 65536,
        },
    };
    let loader = BringUpError::FirmwareLoad {
        name: "bad.elf".into(),
        failure: LoadError::WrongMachine {
            found: 62,
            expected: 197,
        }
        .into(),
    };
    assert_eq!(oversized.kind(), ErrorKind::LoadValidation);
    assert_eq!(loader.kind(), ErrorKind::LoadValidation);
}

#[test]
fn map_and_realize_errors_are_classified() {
    let map: BringUpError = MapError::ZeroSize { name: "x".into() }.into();
    let realize: BringUpError = RealizeError::new("no reset vector").into();
    assert_eq!(map.kind(), ErrorKind::AddressMap);
    assert_eq!(realize.kind(), ErrorKind::Activation);
}

// ══════════════════════════════════════════════════════════
// 2. Messages
// ══════════════════════════════════════════════════════════

#[test]
fn configuration_messages() {
    assert_eq!(
        BringUpError::RamTooLarge {
            requested: 8192,
            ceiling: 4096
        }
        .to_string(),
        "cannot model more than 4096 bytes of RAM (8192 requested)"
    );
    assert_eq!(
        BringUpError::MissingFirmware.to_string(),
        "must specify firmware file name"
    );
    assert_eq!(
        BringUpError::UnknownCpuModel("g14".into()).to_string(),
        "unknown CPU model 'g14'"
    );
}

#[test]
fn firmware_messages_name_the_file() {
    assert_eq!(
        BringUpError::FirmwareNotFound("blinky.elf".into()).to_string(),
        "firmware file 'blinky.elf' not found"
    );

    let err = BringUpError::FirmwareLoad {
        name: "big.elf".into(),
        failure: FirmwareFailure::Oversized {
            size: 70000,
            capacity: 65536,
        },
    };
    assert_eq!(
        err.to_string(),
        "could not load firmware 'big.elf': 70000 bytes exceeds the 65536-byte code flash"
    );
}

#[test]
fn loader_failure_keeps_its_source() {
    let failure: FirmwareFailure = LoadError::Io {
        path: PathBuf::from("/nonexistent/fw.elf"),
        source: io::Error::new(io::ErrorKind::NotFound, "gone"),
    }
    .into();
    let msg = failure.to_string();
    assert!(msg.contains("/nonexistent/fw.elf"), "{msg}");
    assert!(msg.contains("gone"), "{msg}");
}

#[test]
fn realize_error_is_transparent() {
    let err: BringUpError = RealizeError::new("general register bank is not mapped").into();
    assert_eq!(err.to_string(), "general register bank is not mapped");
}

// ══════════════════════════════════════════════════════════
// 3. Access faults
// ══════════════════════════════════════════════════════════

#[test]
fn fault_rebase_converts_offsets_to_addresses() {
    assert_eq!(
        AccessFault::ReadOnly(PhysAddr(0x10)).rebase(0xFEF00),
        AccessFault::ReadOnly(PhysAddr(0xFEF10))
    );
    assert_eq!(
        AccessFault::OutOfRange {
            addr: PhysAddr(4),
            len: 8
        }
        .rebase(0x100),
        AccessFault::OutOfRange {
            addr: PhysAddr(0x104),
            len: 8
        }
    );
}

#[test]
fn unmapped_fault_prints_address() {
    let fault = AccessFault::Unmapped(PhysAddr(0x10000));
    assert_eq!(fault.to_string(), "no region mapped at 0x10000");
}
