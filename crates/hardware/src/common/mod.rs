//! Common types and constants shared by the board model.
//!
//! 1. **Address Types:** Strong type for physical addresses.
//! 2. **Constants:** The fixed RL78/G13 promotion board memory map.
//! 3. **Error Handling:** Map, access, load and bring-up errors.

/// Physical address type.
pub mod addr;

/// Board memory map constants.
pub mod constants;

/// Error types.
pub mod error;

pub use addr::PhysAddr;
pub use error::{
    AccessFault, BringUpError, ErrorKind, FirmwareFailure, LoadError, MapError, RealizeError,
};
