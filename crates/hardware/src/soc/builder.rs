//! RL78/G13 promotion board bring-up.
//!
//! This module assembles the board from configuration. It performs, strictly in order:
//! 1. **Configuration checks:** CPU model, CPU count, RAM ceiling and firmware name are validated
//!    before any region is mapped.
//! 2. **CPU instantiation:** An inert CPU object is created for the resolved model.
//! 3. **RAM:** 4 KiB of RAM is mapped so that it ends at `RAM_END`, with the 32-byte general
//!    register window aliased over its last bytes.
//! 4. **Code flash:** 64 KiB of read-only storage is mapped at address 0 and the firmware image
//!    is located, loaded and size-checked.
//! 5. **SFR page:** 256 bytes are reserved at `SFR_BASE`.
//! 6. **Realize:** The CPU is activated against the finished address space.
//!
//! Any failure aborts the sequence and is returned to the caller. Regions mapped before the
//! failure stay in the caller's address space; nothing is rolled back.

use std::fmt;

use tracing::{debug, info, warn};

use crate::common::constants::{
    CODE_FLASH_BASE, CODE_FLASH_SIZE, GPR_SIZE, RAM_CEILING, RAM_END, SFR_BASE, SFR_SIZE, names,
};
use crate::common::{BringUpError, FirmwareFailure, MapError};
use crate::config::Config;
use crate::core::{CpuCore, CpuModel, Rl78Cpu};
use crate::sim::{ElfLoader, FirmwareLoader, FirmwareSearch, LoadedImage, SearchPath};
use crate::soc::interconnect::AddressSpace;
use crate::soc::memory::Region;

/// Registration metadata for the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineInfo {
    /// Machine selector name.
    pub name: &'static str,
    /// Human-readable description.
    pub desc: &'static str,
    /// Largest number of CPUs the board accepts.
    pub max_cpus: usize,
    /// Whether this is the default machine.
    pub is_default: bool,
}

/// The Renesas RL78/G13 promotion board.
pub const MACHINE: MachineInfo = MachineInfo {
    name: "rl78g13pb",
    desc: "Renesas RL78/G13 Promotion Board",
    max_cpus: 1,
    is_default: true,
};

/// Progress of the bring-up sequence.
///
/// Stages are ordered; bring-up only ever moves forward. A failure at any stage ends the
/// sequence with an error instead of a further stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing has happened yet.
    Init,
    /// The CPU object exists but is inert.
    CpuCreated,
    /// RAM and the GPR window are mapped.
    RamMapped,
    /// Code flash is mapped and holds the firmware.
    FlashLoaded,
    /// The SFR page is mapped.
    SfrMapped,
    /// The CPU is realized; the board is ready to run.
    CpuRealized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CpuCreated => "cpu-created",
            Self::RamMapped => "ram-mapped",
            Self::FlashLoaded => "flash-loaded",
            Self::SfrMapped => "sfr-mapped",
            Self::CpuRealized => "cpu-realized",
        };
        f.write_str(name)
    }
}

/// Builds a CPU object for a resolved model.
pub type CpuFactory = Box<dyn Fn(CpuModel) -> Box<dyn CpuCore>>;

/// External collaborators consumed by bring-up.
pub struct Collaborators {
    /// Resolves the firmware name to a file.
    pub search: Box<dyn FirmwareSearch>,
    /// Parses the firmware file into the address space.
    pub loader: Box<dyn FirmwareLoader>,
    /// Instantiates the CPU.
    pub cpu_factory: CpuFactory,
}

impl Collaborators {
    /// Default collaborators: the configured search path, the ELF loader and an RL78 core.
    pub fn from_config(config: &Config) -> Self {
        Self {
            search: Box::new(SearchPath::new(config.firmware.search_path.clone())),
            loader: Box::new(ElfLoader),
            cpu_factory: Box::new(rl78_cpu),
        }
    }
}

fn rl78_cpu(model: CpuModel) -> Box<dyn CpuCore> {
    Box::new(Rl78Cpu::new(model))
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("search", &self.search)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

/// Result of a successful bring-up.
#[derive(Debug)]
pub struct Machine {
    /// The realized CPU.
    pub cpu: Box<dyn CpuCore>,
    /// RAM size actually mapped, in bytes.
    pub ram_size: usize,
    /// What the firmware loader placed in code flash.
    pub firmware: LoadedImage,
    /// Final stage reached; always [`Stage::CpuRealized`].
    pub stage: Stage,
}

/// Runs the bring-up sequence, mapping regions into `space`.
///
/// # Arguments
///
/// * `config` - Machine, memory and firmware selection.
/// * `space` - Address space the board regions are mapped into.
/// * `collaborators` - Firmware search, loader and CPU factory.
///
/// # Returns
///
/// The realized CPU together with the effective RAM size and the loaded image.
/// On failure `space` keeps whatever was mapped before the failing step.
///
/// # Errors
///
/// Returns the first fatal error encountered. Configuration errors are reported before
/// anything is mapped.
pub fn bring_up(
    config: &Config,
    space: &mut AddressSpace,
    collaborators: &Collaborators,
) -> Result<Machine, BringUpError> {
    let mut stage = Stage::Init;
    let result = run(config, space, collaborators, &mut stage);
    if let Err(err) = &result {
        debug!(%stage, %err, "bring-up aborted");
    }
    result
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(next > *stage, "bring-up stages only move forward");
    *stage = next;
    info!(stage = %next, "bring-up");
}

fn run(
    config: &Config,
    space: &mut AddressSpace,
    collaborators: &Collaborators,
    stage: &mut Stage,
) -> Result<Machine, BringUpError> {
    let model = CpuModel::resolve(config.machine.cpu_model.as_deref())?;
    if config.machine.smp > MACHINE.max_cpus {
        return Err(BringUpError::TooManyCpus {
            requested: config.machine.smp,
            max: MACHINE.max_cpus,
        });
    }
    check_ram_request(config.memory.ram_size)?;
    let firmware_name = config
        .firmware
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(BringUpError::MissingFirmware)?;

    let mut cpu = (collaborators.cpu_factory)(model);
    advance(stage, Stage::CpuCreated);

    let ram_size = map_ram(space, config.memory.ram_size)?;
    advance(stage, Stage::RamMapped);

    map_code_flash(space)?;
    let firmware = load_firmware(space, collaborators, firmware_name)?;
    advance(stage, Stage::FlashLoaded);

    map_sfr(space)?;
    advance(stage, Stage::SfrMapped);

    cpu.realize(space)?;
    advance(stage, Stage::CpuRealized);

    Ok(Machine {
        cpu,
        ram_size,
        firmware,
        stage: *stage,
    })
}

/// Rejects RAM requests above the board ceiling.
///
/// # Errors
///
/// Returns [`BringUpError::RamTooLarge`] if `requested` exceeds [`RAM_CEILING`].
pub fn check_ram_request(requested: usize) -> Result<(), BringUpError> {
    if requested > RAM_CEILING {
        return Err(BringUpError::RamTooLarge {
            requested,
            ceiling: RAM_CEILING,
        });
    }
    Ok(())
}

/// Offset of the GPR window inside a RAM region of `ram_size` bytes.
///
/// # Errors
///
/// Returns [`MapError::SubregionOutOfBounds`] if RAM is smaller than the window.
pub fn gpr_window_offset(ram_size: usize) -> Result<u64, MapError> {
    ram_size
        .checked_sub(GPR_SIZE)
        .map(|offset| offset as u64)
        .ok_or_else(|| MapError::SubregionOutOfBounds {
            name: names::GPR.to_owned(),
            parent: names::RAM.to_owned(),
            offset: 0,
            size: GPR_SIZE as u64,
            parent_size: ram_size as u64,
        })
}

/// Physical base at which a RAM region of `ram_size` bytes ends exactly at [`RAM_END`].
///
/// Only called with [`RAM_CEILING`].
const fn ram_base(ram_size: usize) -> u64 {
    RAM_END + 1 - ram_size as u64
}

fn map_ram(space: &mut AddressSpace, requested: usize) -> Result<usize, BringUpError> {
    // The request has been checked against the ceiling, yet the mapped size is always the
    // ceiling itself. It is unclear whether the validated request was meant to be used;
    // the observable behaviour is kept as is.
    let ram_size = RAM_CEILING;
    if requested != ram_size {
        warn!(requested, mapped = ram_size, "RAM request overridden by board RAM size");
    }

    let mut ram = Region::new_ram(names::RAM, ram_size)?;
    let _gpr = ram.add_subregion(names::GPR, gpr_window_offset(ram_size)?, GPR_SIZE)?;
    space.map_region(ram_base(ram_size), ram)?;
    Ok(ram_size)
}

fn map_code_flash(space: &mut AddressSpace) -> Result<(), BringUpError> {
    let mut flash = Region::new_ram(names::CODE_FLASH, CODE_FLASH_SIZE)?;
    flash.set_readonly(true);
    space.map_region(CODE_FLASH_BASE, flash)?;
    Ok(())
}

fn load_firmware(
    space: &mut AddressSpace,
    collaborators: &Collaborators,
    name: &str,
) -> Result<LoadedImage, BringUpError> {
    let path = collaborators
        .search
        .find(name)
        .ok_or_else(|| BringUpError::FirmwareNotFound(name.to_owned()))?;

    let image = collaborators
        .loader
        .load(&path, space)
        .map_err(|err| BringUpError::FirmwareLoad {
            name: name.to_owned(),
            failure: err.into(),
        })?;

    if image.size > CODE_FLASH_SIZE as u64 {
        return Err(BringUpError::FirmwareLoad {
            name: name.to_owned(),
            failure: FirmwareFailure::Oversized {
                size: image.size,
                capacity: CODE_FLASH_SIZE,
            },
        });
    }

    info!(
        firmware = %path.display(),
        size = image.size,
        entry = image.entry,
        "firmware loaded"
    );
    Ok(image)
}

fn map_sfr(space: &mut AddressSpace) -> Result<(), BringUpError> {
    let sfr = Region::new_ram(names::SFR, SFR_SIZE)?;
    space.map_region(SFR_BASE, sfr)?;
    Ok(())
}

/// A brought-up board: its address space together with the realized machine.
#[derive(Debug)]
pub struct Board {
    /// The board's physical address space.
    pub space: AddressSpace,
    /// CPU and bring-up results.
    pub machine: Machine,
}

impl Board {
    /// Brings up a board with the default collaborators for `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Machine, memory and firmware selection.
    ///
    /// # Returns
    ///
    /// A board whose address space holds code flash, RAM with its GPR window and the SFR page.
    ///
    /// # Errors
    ///
    /// See [`bring_up`].
    pub fn new(config: &Config) -> Result<Self, BringUpError> {
        Self::with_collaborators(config, &Collaborators::from_config(config))
    }

    /// Brings up a board with caller-supplied collaborators.
    ///
    /// # Arguments
    ///
    /// * `config` - Machine, memory and firmware selection.
    /// * `collaborators` - Firmware search, loader and CPU factory to use instead of the defaults.
    ///
    /// # Errors
    ///
    /// See [`bring_up`].
    pub fn with_collaborators(
        config: &Config,
        collaborators: &Collaborators,
    ) -> Result<Self, BringUpError> {
        let mut space = AddressSpace::new();
        let machine = bring_up(config, &mut space, collaborators)?;
        Ok(Self { space, machine })
    }
}
