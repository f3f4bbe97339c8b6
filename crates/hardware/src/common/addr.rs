//! Physical address type.
//!
//! The RL78 core sees a single flat 20-bit physical address space; there is no
//! translation layer. `PhysAddr` keeps raw addresses and region-relative offsets
//! from being mixed up at the address-space boundary.

use std::fmt;

use super::constants::ADDRESS_SPACE_SIZE;

/// A physical address in the RL78 address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl PhysAddr {
    /// Creates a new physical address from a raw value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw address value.
    ///
    /// # Returns
    ///
    /// A new `PhysAddr` instance wrapping the provided address.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns `true` if the address lies inside the 1 MiB RL78 space.
    pub const fn in_space(&self) -> bool {
        self.0 < ADDRESS_SPACE_SIZE
    }

    /// Returns the address `offset` bytes above this one, or `None` on overflow.
    pub const fn checked_add(&self, offset: u64) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07x}", self.0)
    }
}

impl From<u64> for PhysAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}
