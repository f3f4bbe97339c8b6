//! Firmware location and ELF loading.
//!
//! This module provides the two collaborators bring-up uses to populate code flash. It performs:
//! 1. **Firmware search:** Resolves a firmware name to a file, either as given or through a list of directories.
//! 2. **ELF loading:** Parses a 32-bit RL78 ELF image and copies each `PT_LOAD` segment to its
//!    physical address, zero-filling the part of the segment not present in the file.
//! 3. **Binary reads:** Reads raw files from disk with a typed error.
//!
//! Both collaborators sit behind traits so bring-up can be exercised with substitutes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use object::Endianness;
use object::elf;
use object::read::elf::{FileHeader, ProgramHeader};
use tracing::debug;

use crate::common::constants::EM_RL78;
use crate::common::{LoadError, PhysAddr};
use crate::soc::AddressSpace;

/// Resolves a firmware name to a file on disk.
pub trait FirmwareSearch: fmt::Debug {
    /// Returns the path of the firmware called `name`, or `None` if it cannot be found.
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// Directory list searched in order for firmware files.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Creates a search path over `dirs`.
    pub const fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl FirmwareSearch for SearchPath {
    /// A name naming an existing file as given wins; otherwise each directory is tried in order.
    fn find(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

/// Outcome of a successful image load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    /// Bytes placed into the address space (sum of segment memory sizes).
    pub size: u64,
    /// Entry point recorded in the image header.
    pub entry: u64,
}

/// Parses a firmware file and places it into the address space.
pub trait FirmwareLoader: fmt::Debug {
    /// Loads the image at `path` into `space`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be read, is malformed, or targets unmapped memory.
    fn load(&self, path: &Path, space: &mut AddressSpace) -> Result<LoadedImage, LoadError>;
}

/// Loader for 32-bit RL78 ELF executables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfLoader;

impl ElfLoader {
    /// Loads an in-memory ELF image into `space`.
    ///
    /// Segments are placed at their physical address through the privileged load path, so
    /// read-only regions can be populated.
    ///
    /// # Errors
    ///
    /// Fails on malformed headers, a machine other than RL78, truncated segments, or a segment
    /// that does not fit inside a single mapped region.
    pub fn load_image(data: &[u8], space: &mut AddressSpace) -> Result<LoadedImage, LoadError> {
        let header = elf::FileHeader32::<Endianness>::parse(data)?;
        let endian = header.endian()?;

        let machine = header.e_machine(endian);
        if machine != EM_RL78 {
            return Err(LoadError::WrongMachine {
                found: machine,
                expected: EM_RL78,
            });
        }

        let mut size = 0u64;
        for (index, ph) in header.program_headers(endian, data)?.iter().enumerate() {
            if ph.p_type(endian) != elf::PT_LOAD {
                continue;
            }
            let addr = u64::from(ph.p_paddr(endian));
            let memsz = u64::from(ph.p_memsz(endian));
            let bytes = ph
                .data(endian, data)
                .map_err(|()| LoadError::TruncatedSegment { index })?;
            let filesz = bytes.len() as u64;

            let unbacked = move |fault| LoadError::Unbacked {
                index,
                addr: PhysAddr(addr),
                len: memsz.max(filesz),
                fault,
            };
            if filesz > 0 {
                space.load_at(addr, bytes).map_err(unbacked)?;
            }
            if memsz > filesz {
                space.fill_at(addr + filesz, memsz - filesz, 0).map_err(unbacked)?;
            }

            debug!(index, addr = %PhysAddr(addr), filesz, memsz, "loaded segment");
            size += memsz.max(filesz);
        }

        Ok(LoadedImage {
            size,
            entry: u64::from(header.e_entry(endian)),
        })
    }
}

impl FirmwareLoader for ElfLoader {
    fn load(&self, path: &Path, space: &mut AddressSpace) -> Result<LoadedImage, LoadError> {
        let data = load_binary(path)?;
        Self::load_image(&data, space)
    }
}

/// Reads a file from disk into a byte vector.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read.
pub fn load_binary(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
