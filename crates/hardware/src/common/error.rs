//! Error types for board bring-up.
//!
//! This module defines the failure taxonomy of the emulator front end. It provides:
//! 1. **Map errors:** Structural violations raised by the region primitive and address space.
//! 2. **Access faults:** Runtime reads/writes that hit unmapped or read-only memory.
//! 3. **Load errors:** Failures of the ELF loader collaborator.
//! 4. **Bring-up errors:** The single error type returned by the bring-up sequencer.
//!
//! Every bring-up error is fatal. The sequencer returns it instead of exiting so that the
//! outermost caller decides how to terminate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::addr::PhysAddr;

/// Structural violation reported by the region primitive or the address space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A region was created with a size of zero bytes.
    #[error("region '{name}' has zero size")]
    ZeroSize {
        /// Region name.
        name: String,
    },

    /// A sub-region does not fit inside its parent.
    #[error(
        "sub-region '{name}' at offset {offset:#x} (+{size:#x}) exceeds parent '{parent}' of {parent_size:#x} bytes"
    )]
    SubregionOutOfBounds {
        /// Sub-region name.
        name: String,
        /// Parent region name.
        parent: String,
        /// Requested offset within the parent.
        offset: u64,
        /// Requested size.
        size: u64,
        /// Size of the parent region.
        parent_size: u64,
    },

    /// A top-level mapping collides with one already present.
    #[error("region '{name}' at {base} (+{size:#x}) overlaps '{other}'")]
    Overlap {
        /// Region being mapped.
        name: String,
        /// Requested base address.
        base: PhysAddr,
        /// Region size.
        size: u64,
        /// Name of the region already occupying the range.
        other: String,
    },

    /// A mapping extends past the end of the physical address space.
    #[error("region '{name}' at {base} (+{size:#x}) lies outside the address space")]
    OutOfSpace {
        /// Region being mapped.
        name: String,
        /// Requested base address.
        base: PhysAddr,
        /// Region size.
        size: u64,
    },

    /// The host could not provide backing storage.
    #[error("cannot allocate {size} bytes of backing storage for '{name}': {reason}")]
    Allocation {
        /// Region name.
        name: String,
        /// Requested size in bytes.
        size: usize,
        /// Host error description.
        reason: String,
    },
}

/// A guest-visible access that could not be carried out.
///
/// Regions report addresses relative to their own start; the address space
/// rebases them to physical addresses before they reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessFault {
    /// No region claims the address.
    #[error("no region mapped at {0}")]
    Unmapped(PhysAddr),

    /// Write to a region marked read-only.
    #[error("write to read-only memory at {0}")]
    ReadOnly(PhysAddr),

    /// Access starts inside a region but runs past its end.
    #[error("access of {len} bytes at {addr} runs past the end of the region")]
    OutOfRange {
        /// First byte of the access.
        addr: PhysAddr,
        /// Access width in bytes.
        len: u64,
    },
}

impl AccessFault {
    /// Shifts a region-relative fault address by `base`.
    pub const fn rebase(self, base: u64) -> Self {
        match self {
            Self::Unmapped(a) => Self::Unmapped(PhysAddr(a.0 + base)),
            Self::ReadOnly(a) => Self::ReadOnly(PhysAddr(a.0 + base)),
            Self::OutOfRange { addr, len } => Self::OutOfRange {
                addr: PhysAddr(addr.0 + base),
                len,
            },
        }
    }
}

/// Failure of the ELF loader collaborator.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not a well-formed 32-bit ELF image.
    #[error("malformed ELF image: {0}")]
    Parse(#[from] object::read::Error),

    /// The image targets a different architecture.
    #[error("ELF machine {found} is not RL78 ({expected})")]
    WrongMachine {
        /// `e_machine` found in the header.
        found: u16,
        /// `e_machine` required by this board.
        expected: u16,
    },

    /// A program header points past the end of the file.
    #[error("segment {index} file data lies outside the image")]
    TruncatedSegment {
        /// Program header index.
        index: usize,
    },

    /// A segment targets memory no region backs.
    #[error("segment {index} at {addr} (+{len:#x}) is not backed by memory: {fault}")]
    Unbacked {
        /// Program header index.
        index: usize,
        /// Physical load address.
        addr: PhysAddr,
        /// Segment memory size.
        len: u64,
        /// Fault reported by the address space.
        #[source]
        fault: AccessFault,
    },
}

/// Failure reported by the CPU lifecycle collaborator when it refuses to realize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RealizeError {
    message: String,
}

impl RealizeError {
    /// Creates a realize error carrying an operator-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a firmware image was rejected.
#[derive(Debug, Error)]
pub enum FirmwareFailure {
    /// The loader itself failed; there is no usable length.
    #[error(transparent)]
    Loader(#[from] LoadError),

    /// The loader succeeded but placed more bytes than the code flash holds.
    #[error("{size} bytes exceeds the {capacity}-byte code flash")]
    Oversized {
        /// Length reported by the loader.
        size: u64,
        /// Code flash capacity.
        capacity: usize,
    },
}

/// Coarse classification of bring-up failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The machine configuration is unusable (RAM request, CPU model, missing firmware name).
    Configuration,
    /// A file could not be found or read.
    Io,
    /// The firmware loader failed or reported an unacceptable length.
    LoadValidation,
    /// The region primitive rejected a mapping.
    AddressMap,
    /// The CPU refused to realize.
    Activation,
}

/// Fatal error raised by the bring-up sequencer.
#[derive(Debug, Error)]
pub enum BringUpError {
    /// No CPU variant matches the requested model name.
    #[error("unknown CPU model '{0}'")]
    UnknownCpuModel(String),

    /// More CPUs were requested than the board has sockets for.
    #[error("{requested} CPUs requested, board supports at most {max}")]
    TooManyCpus {
        /// Requested CPU count.
        requested: usize,
        /// Board limit.
        max: usize,
    },

    /// The requested RAM exceeds the platform ceiling.
    #[error("cannot model more than {ceiling} bytes of RAM ({requested} requested)")]
    RamTooLarge {
        /// Requested RAM size in bytes.
        requested: usize,
        /// Platform ceiling in bytes.
        ceiling: usize,
    },

    /// No firmware file name was supplied.
    #[error("must specify firmware file name")]
    MissingFirmware,

    /// The firmware name did not resolve to a file.
    #[error("firmware file '{0}' not found")]
    FirmwareNotFound(String),

    /// The firmware image could not be loaded or did not fit.
    #[error("could not load firmware '{name}': {failure}")]
    FirmwareLoad {
        /// Firmware name as supplied by the operator.
        name: String,
        /// Loader error or offending length.
        #[source]
        failure: FirmwareFailure,
    },

    /// The region primitive rejected a mapping.
    #[error("address map: {0}")]
    Map(#[from] MapError),

    /// The CPU rejected the constructed machine.
    #[error(transparent)]
    Realize(#[from] RealizeError),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration '{}': {source}", .path.display())]
    ConfigIo {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl BringUpError {
    /// Returns the failure class of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCpuModel(_)
            | Self::TooManyCpus { .. }
            | Self::RamTooLarge { .. }
            | Self::MissingFirmware
            | Self::Config(_) => ErrorKind::Configuration,
            Self::FirmwareNotFound(_) | Self::ConfigIo { .. } => ErrorKind::Io,
            Self::FirmwareLoad { .. } => ErrorKind::LoadValidation,
            Self::Map(_) => ErrorKind::AddressMap,
            Self::Realize(_) => ErrorKind::Activation,
        }
    }
}
