//! Device trait for memory-mapped regions.
//!
//! This module defines the `Device` trait implemented by everything the address space can map. It provides:
//! 1. **Identification:** `name` and `size` for mapping and diagnostics.
//! 2. **Access:** Byte and halfword read/write at device-relative offsets.
//! 3. **Loading:** A privileged path used by the firmware loader that ignores write protection.
//! 4. **Downcasting:** Optional cast to `Region` for introspection of the memory tree.
//!
//! All implementors must be `Send + Sync` so a constructed address space can be handed to a CPU thread.

use std::fmt;

use crate::common::{AccessFault, PhysAddr};
use crate::soc::memory::Region;

/// Trait for anything mapped into the physical address space.
///
/// Offsets are relative to the start of the device; faults carry device-relative addresses
/// and are rebased by the address space.
pub trait Device: Send + Sync + fmt::Debug {
    /// Returns the diagnostic name (e.g., `"rl78g13_pb.ram"`).
    fn name(&self) -> &str;
    /// Returns the size of the device in bytes.
    fn size(&self) -> u64;
    /// Reads one byte at the given offset.
    fn read_u8(&mut self, offset: u64) -> Result<u8, AccessFault>;
    /// Writes one byte at the given offset.
    fn write_u8(&mut self, offset: u64, val: u8) -> Result<(), AccessFault>;

    /// Reads two bytes (little-endian) at the given offset.
    fn read_u16(&mut self, offset: u64) -> Result<u16, AccessFault> {
        check_span(offset, 2, self.size())?;
        let lo = self.read_u8(offset)?;
        let hi = self.read_u8(offset + 1)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Writes two bytes (little-endian) at the given offset.
    ///
    /// The span is checked before either byte is written.
    fn write_u16(&mut self, offset: u64, val: u16) -> Result<(), AccessFault> {
        check_span(offset, 2, self.size())?;
        let [lo, hi] = val.to_le_bytes();
        self.write_u8(offset, lo)?;
        self.write_u8(offset + 1, hi)
    }

    /// Returns `true` if guest writes are rejected.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Places `data` at `offset` during image loading.
    ///
    /// Implementors must accept the write even when [`Device::is_read_only`] is `true`;
    /// this is the only path by which read-only storage is populated.
    ///
    /// # Errors
    ///
    /// Returns [`AccessFault::OutOfRange`] if `data` does not fit at `offset`.
    fn load_bytes(&mut self, offset: u64, data: &[u8]) -> Result<(), AccessFault>;

    /// Fills `len` bytes at `offset` with `val` during image loading.
    ///
    /// # Errors
    ///
    /// Returns [`AccessFault::OutOfRange`] if the range does not fit at `offset`.
    fn fill_bytes(&mut self, offset: u64, len: u64, val: u8) -> Result<(), AccessFault> {
        check_span(offset, len, self.size())?;
        self.load_bytes(offset, &vec![val; len as usize])
    }

    /// Returns the device as a `Region` if it is plain addressable storage.
    fn as_region(&self) -> Option<&Region> {
        None
    }
}

/// Checks that `[offset, offset + len)` lies inside a device of `size` bytes.
///
/// # Errors
///
/// Returns [`AccessFault::OutOfRange`] with the device-relative offset otherwise,
/// including when the end of the span overflows.
pub fn check_span(offset: u64, len: u64, size: u64) -> Result<(), AccessFault> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(AccessFault::OutOfRange {
            addr: PhysAddr(offset),
            len,
        }),
    }
}
