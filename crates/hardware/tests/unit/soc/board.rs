//! Board Bring-up Tests.
//!
//! Drives the full bring-up sequence with mocked collaborators and checks the
//! resulting memory map, the failure class of every abort and how far the sequence
//! got before it stopped. Whether the loader ran and whether the CPU was realized
//! are call-count expectations on the mocks.

use proptest::prelude::*;
use rstest::rstest;

use rl78sim_core::common::constants::{names, CODE_FLASH_SIZE, RAM_CEILING, SFR_BASE, SFR_SIZE};
use rl78sim_core::common::{AccessFault, ErrorKind, PhysAddr};
use rl78sim_core::config::Config;
use rl78sim_core::core::CpuModel;
use rl78sim_core::soc::{bring_up, AddressSpace, Board, Device, Stage, MACHINE};
use rl78sim_core::BringUpError;

use crate::common::elf::firmware_image;
use crate::common::mocks::{
    failing_loader, found_search, missing_search, reporting_loader, unused_loader, Realize,
};
use crate::common::{collaborators, config_with_firmware, init_tracing, reporting, temp_file};

fn names_mapped(space: &AddressSpace) -> Vec<String> {
    space
        .mappings()
        .map(|(_, dev)| dev.name().to_owned())
        .collect()
}

fn span(space: &AddressSpace, name: &str) -> (u64, u64) {
    let (base, region) = space.region(name).unwrap();
    (base.val(), base.val() + region.len() as u64)
}

fn disjoint(a: (u64, u64), b: (u64, u64)) -> bool {
    a.1 <= b.0 || b.1 <= a.0
}

// ══════════════════════════════════════════════════════════
// 1. End-to-end scenarios
// ══════════════════════════════════════════════════════════

#[test]
fn scenario_a_full_bring_up() {
    let collab = reporting(1000);
    let config = config_with_firmware("blinky.elf");
    let mut space = AddressSpace::new();

    let machine = bring_up(&config, &mut space, &collab).unwrap();

    assert_eq!(machine.stage, Stage::CpuRealized);
    assert!(machine.cpu.is_realized());
    assert_eq!(machine.firmware.size, 1000);

    let flash = span(&space, names::CODE_FLASH);
    let gpr = span(&space, names::GPR);
    let sfr = span(&space, names::SFR);
    assert!(disjoint(flash, gpr));
    assert!(disjoint(flash, sfr));
    assert!(disjoint(gpr, sfr));
}

#[test]
fn scenario_b_ram_over_ceiling_maps_nothing() {
    let collab = collaborators(found_search(), unused_loader(), Realize::Never);
    let mut config = config_with_firmware("blinky.elf");
    config.memory.ram_size = 8192;
    let mut space = AddressSpace::new();

    let err = bring_up(&config, &mut space, &collab).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(
        err,
        BringUpError::RamTooLarge {
            requested: 8192,
            ceiling: 4096
        }
    ));
    assert!(space.is_empty());
}

#[test]
fn scenario_c_oversized_firmware_stops_before_sfr() {
    let collab = collaborators(found_search(), reporting_loader(70000), Realize::Never);
    let config = config_with_firmware("huge.elf");
    let mut space = AddressSpace::new();

    let err = bring_up(&config, &mut space, &collab).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LoadValidation);
    let msg = err.to_string();
    assert!(msg.contains("huge.elf"), "{msg}");
    assert!(msg.contains("70000"), "{msg}");

    assert!(space.region(names::CODE_FLASH).is_some());
    assert!(space.region(names::SFR).is_none());
}

#[test]
fn scenario_d_unresolvable_firmware_is_io_error() {
    let collab = collaborators(missing_search(), unused_loader(), Realize::Never);
    let config = config_with_firmware("missing.elf");
    let mut space = AddressSpace::new();

    let err = bring_up(&config, &mut space, &collab).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.to_string(), "firmware file 'missing.elf' not found");

    let (_, flash) = space.region(names::CODE_FLASH).unwrap();
    assert!(flash.snapshot().iter().all(|&b| b == 0));
    assert!(space.region(names::SFR).is_none());
}

#[test]
fn real_elf_through_search_path() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("blinky.elf"), firmware_image(1000, 0x00D8)).unwrap();

    let mut config = config_with_firmware("blinky.elf");
    config.firmware.search_path = vec![dir.path().to_path_buf()];

    let mut board = Board::new(&config).unwrap();
    assert_eq!(board.machine.firmware.size, 1000);
    assert_eq!(board.machine.firmware.entry, 0xD8);
    assert_eq!(board.space.read_u16(0).unwrap(), 0x00D8);
    assert_eq!(board.space.len(), 3);
}

#[test]
fn memory_tree_of_brought_up_board() {
    let file = temp_file(&firmware_image(16, 0x0100));
    let config = config_with_firmware(file.path().to_str().unwrap());
    let board = Board::new(&config).unwrap();

    let expected = "\
address-space: memory
  00000-0ffff (ro): rl78g13_pb.code_flash
  fef00-ffeff (rw): rl78g13_pb.ram
    ffee0-ffeff (rw): rl78g13_pb.gpr
  fff00-fffff (rw): rl78g13_pb.sfr
";
    pretty_assertions::assert_eq!(board.space.to_string(), expected);
}

// ══════════════════════════════════════════════════════════
// 2. Fixed map
// ══════════════════════════════════════════════════════════

#[test]
fn flash_is_64k_read_only_at_zero() {
    let collab = reporting(1000);
    let mut space = AddressSpace::new();
    let _machine = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap();

    let (base, flash) = space.region(names::CODE_FLASH).unwrap();
    assert_eq!(base, PhysAddr(0));
    assert_eq!(flash.len(), CODE_FLASH_SIZE);
    assert!(flash.is_read_only());

    assert_eq!(
        space.write_u8(0x10, 0xFF).unwrap_err(),
        AccessFault::ReadOnly(PhysAddr(0x10))
    );
    assert!(space.write_u16(0xFFFE, 0xFFFF).is_err());
}

#[test]
fn sfr_is_256_bytes_at_fixed_base() {
    let collab = reporting(1000);
    let mut space = AddressSpace::new();
    let _machine = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap();

    let (base, sfr) = space.region(names::SFR).unwrap();
    assert_eq!(base.val(), SFR_BASE);
    assert_eq!(sfr.len(), SFR_SIZE);
    assert!(!sfr.is_read_only());
    space.write_u8(0xFFFFF, 0x5A).unwrap();
    assert_eq!(space.read_u8(0xFFFFF).unwrap(), 0x5A);
}

#[test]
fn gpr_window_aliases_ram() {
    let collab = reporting(1000);
    let mut space = AddressSpace::new();
    let _machine = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap();

    space.write_u16(0xFFEE0, 0xABCD).unwrap();

    let (ram_base, ram) = space.region(names::RAM).unwrap();
    let (gpr_base, gpr) = space.region(names::GPR).unwrap();
    assert_eq!(gpr_base.val() - ram_base.val(), 4064);
    assert!(gpr.shares_storage_with(ram));
    assert_eq!(&gpr.snapshot()[..2], &[0xCD, 0xAB]);
    assert_eq!(&ram.snapshot()[4064..4066], &[0xCD, 0xAB]);
}

// ══════════════════════════════════════════════════════════
// 3. Configuration errors
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::absent(None)]
#[case::empty(Some(""))]
fn missing_firmware_name_maps_nothing(#[case] name: Option<&str>) {
    let collab = collaborators(found_search(), unused_loader(), Realize::Never);
    let mut config = Config::default();
    config.firmware.name = name.map(str::to_owned);
    let mut space = AddressSpace::new();

    let err = bring_up(&config, &mut space, &collab).unwrap_err();

    assert!(matches!(err, BringUpError::MissingFirmware));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(space.is_empty());
}

#[test]
fn unknown_cpu_model_maps_nothing() {
    let collab = collaborators(found_search(), unused_loader(), Realize::Never);
    let mut config = config_with_firmware("fw.elf");
    config.machine.cpu_model = Some("g14".into());
    let mut space = AddressSpace::new();

    let err = bring_up(&config, &mut space, &collab).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(space.is_empty());
}

#[test]
fn explicit_default_model_is_accepted() {
    let collab = reporting(1000);
    let mut config = config_with_firmware("fw.elf");
    config.machine.cpu_model = Some("G13".into());
    let mut space = AddressSpace::new();

    let machine = bring_up(&config, &mut space, &collab).unwrap();
    assert_eq!(machine.cpu.model(), CpuModel::G13);
}

#[test]
fn more_than_one_cpu_is_rejected() {
    let collab = collaborators(found_search(), unused_loader(), Realize::Never);
    let mut config = config_with_firmware("fw.elf");
    config.machine.smp = MACHINE.max_cpus + 1;
    let mut space = AddressSpace::new();

    let err = bring_up(&config, &mut space, &collab).unwrap_err();

    assert!(matches!(err, BringUpError::TooManyCpus { requested: 2, max: 1 }));
    assert!(space.is_empty());
}

// ══════════════════════════════════════════════════════════
// 4. Firmware size bound
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(0)]
#[case(1000)]
#[case(65535)]
#[case(65536)]
fn firmware_within_flash_completes(#[case] size: u64) {
    let collab = reporting(size);
    let mut space = AddressSpace::new();

    let machine = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap();

    assert_eq!(machine.stage, Stage::CpuRealized);
    assert!(space.region(names::SFR).is_some());
}

#[rstest]
#[case(65537)]
#[case(70000)]
#[case(u64::MAX)]
fn firmware_over_flash_stops_before_sfr(#[case] size: u64) {
    let collab = collaborators(found_search(), reporting_loader(size), Realize::Never);
    let mut space = AddressSpace::new();

    let err = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LoadValidation);
    assert!(space.region(names::SFR).is_none());
}

#[test]
fn loader_failure_stops_before_sfr() {
    let collab = collaborators(found_search(), failing_loader(), Realize::Never);
    let mut space = AddressSpace::new();

    let err = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LoadValidation);
    assert!(err.to_string().starts_with("could not load firmware 'fw.elf'"));
    assert!(space.region(names::SFR).is_none());
}

#[test]
fn wrong_machine_elf_is_load_error() {
    let data = crate::common::elf::ElfBuilder::new()
        .machine(62)
        .segment(crate::common::elf::Segment::load(0, &[0; 4]))
        .build();
    let file = temp_file(&data);
    let config = config_with_firmware(file.path().to_str().unwrap());

    let err = Board::new(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LoadValidation);
}

// ══════════════════════════════════════════════════════════
// 5. Activation
// ══════════════════════════════════════════════════════════

#[test]
fn cpu_rejection_surfaces_its_message() {
    let collab = collaborators(
        found_search(),
        reporting_loader(1000),
        Realize::Reject("reset vector points outside code flash"),
    );
    let mut space = AddressSpace::new();

    let err = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Activation);
    assert_eq!(err.to_string(), "reset vector points outside code flash");
    assert_eq!(space.len(), 3);
}

#[test]
fn occupied_sfr_page_is_map_error() {
    let collab = collaborators(found_search(), reporting_loader(1000), Realize::Never);
    let mut space = AddressSpace::new();
    space
        .map_region(0xFFF80, rl78sim_core::soc::Region::new_ram("device", 16).unwrap())
        .unwrap();

    let err = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AddressMap);
    assert!(err.to_string().contains(names::SFR), "{err}");
}

// ══════════════════════════════════════════════════════════
// 6. RAM sizing
// ══════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ram_at_or_below_ceiling_always_maps_ceiling(requested in 0usize..=RAM_CEILING) {
        let collab = reporting(1000);
        let mut config = config_with_firmware("fw.elf");
        config.memory.ram_size = requested;
        let mut space = AddressSpace::new();

        let machine = bring_up(&config, &mut space, &collab).unwrap();

        prop_assert_eq!(machine.ram_size, RAM_CEILING);
        let (base, ram) = space.region(names::RAM).unwrap();
        prop_assert_eq!(ram.len(), RAM_CEILING);
        prop_assert_eq!(base.val() + ram.len() as u64 - 1, 0xFFEFF);

        let (gpr_base, gpr) = space.region(names::GPR).unwrap();
        prop_assert_eq!(gpr_base.val() - base.val(), (RAM_CEILING - 32) as u64);
        prop_assert_eq!(gpr.len(), 32);
    }

    #[test]
    fn ram_above_ceiling_maps_nothing(requested in (RAM_CEILING + 1)..usize::MAX) {
        let collab = collaborators(found_search(), unused_loader(), Realize::Never);
        let mut config = config_with_firmware("fw.elf");
        config.memory.ram_size = requested;
        let mut space = AddressSpace::new();

        let err = bring_up(&config, &mut space, &collab).unwrap_err();

        prop_assert_eq!(err.kind(), ErrorKind::Configuration);
        prop_assert!(space.is_empty());
    }

    #[test]
    fn flash_stays_read_only_to_guest(addr in 0u64..0x10000, val: u8) {
        let collab = reporting(1000);
        let mut space = AddressSpace::new();
        let _machine = bring_up(&config_with_firmware("fw.elf"), &mut space, &collab)
            .unwrap();

        prop_assert_eq!(space.write_u8(addr, val), Err(AccessFault::ReadOnly(PhysAddr(addr))));
    }
}
