//! Board-level components.
//!
//! This module organizes the pieces the promotion board is assembled from:
//! the address space, the region primitive, the device trait and the bring-up
//! sequencer that ties them together.

/// Bring-up sequencer and board type.
pub mod builder;

/// Physical address space and access routing.
pub mod interconnect;

/// RAM-like regions and their backing storage.
pub mod memory;

/// Device trait for mapped regions.
pub mod traits;

pub use builder::{Board, Collaborators, MACHINE, Machine, MachineInfo, Stage, bring_up};
pub use interconnect::AddressSpace;
pub use memory::Region;
pub use traits::Device;
