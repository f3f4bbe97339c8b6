//! Renesas RL78/G13 promotion board model.
//!
//! This crate builds the physical memory map of the board and brings its CPU up:
//! 1. **Memory:** Regions with shared backing storage, alias sub-regions, and a flat address space.
//! 2. **Loader:** Firmware search and RL78 ELF loading into read-only code flash.
//! 3. **Core:** CPU model selection and the realize lifecycle.
//! 4. **Board:** The bring-up sequencer that validates configuration and wires everything together.

/// Common types and constants (addresses, memory map, errors).
pub mod common;
/// Board configuration (defaults, structures, JSON loading).
pub mod config;
/// CPU core lifecycle.
pub mod core;
/// Firmware search and ELF loading.
pub mod sim;
/// Board components (address space, regions, bring-up).
pub mod soc;

/// Root configuration type; use `Config::default()` or parse from JSON.
pub use crate::config::Config;
/// Fatal bring-up error.
pub use crate::common::BringUpError;
/// Brought-up board; construct with `Board::new`.
pub use crate::soc::Board;
