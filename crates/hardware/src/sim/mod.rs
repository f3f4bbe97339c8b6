//! Firmware search and program loading.
//!
//! Provides the collaborators that locate a firmware image and place it into
//! the board's address space during bring-up.

/// Firmware search path and ELF loader.
pub mod loader;

pub use loader::{ElfLoader, FirmwareLoader, FirmwareSearch, LoadedImage, SearchPath};
