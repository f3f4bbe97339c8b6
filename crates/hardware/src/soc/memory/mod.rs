//! RAM-like memory regions.
//!
//! This module implements the region primitive the board is assembled from. It provides:
//! 1. **Buffer:** Host backing storage (`RegionBuffer`) shared by `Arc`.
//! 2. **Region:** A named, sized view over a buffer with a read-only flag.
//! 3. **Sub-regions:** Alias views carved out of a parent that share its storage, so a
//!    write through either view is visible through the other.

/// Host backing storage for regions.
pub(crate) mod buffer;

use std::sync::Arc;

use self::buffer::RegionBuffer;
use crate::common::{AccessFault, MapError, PhysAddr};
use crate::soc::traits::{Device, check_span};

/// A named span of byte-addressable emulated memory.
///
/// A region owns its alias views. Every view of a buffer lives in one region tree, so
/// writing through any of them needs `&mut` access to the tree's root.
#[derive(Debug)]
pub struct Region {
    name: String,
    buffer: Arc<RegionBuffer>,
    /// Start of this view within `buffer`.
    start: usize,
    size: usize,
    read_only: bool,
    subregions: Vec<Region>,
}

impl Region {
    /// Reserves a zero-filled, read-write region of `size` bytes.
    ///
    /// # Arguments
    ///
    /// * `name` - Diagnostic name shown in the memory tree.
    /// * `size` - Size of the region in bytes.
    ///
    /// # Returns
    ///
    /// A region with no sub-regions, not yet mapped anywhere.
    ///
    /// # Errors
    ///
    /// Fails if `size` is zero or the host cannot allocate the storage.
    pub fn new_ram(name: impl Into<String>, size: usize) -> Result<Self, MapError> {
        let name = name.into();
        let buffer = Arc::new(RegionBuffer::new(&name, size)?);
        Ok(Self {
            name,
            buffer,
            start: 0,
            size,
            read_only: false,
            subregions: Vec::new(),
        })
    }

    /// Returns the region name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the region size in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Always `false`; empty regions cannot be created.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Marks the region read-only (or read-write again).
    pub const fn set_readonly(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Carves an alias view of `size` bytes at `offset` within this region.
    ///
    /// The view has no storage of its own; it is recorded as a child of this region.
    ///
    /// # Arguments
    ///
    /// * `name` - Diagnostic name of the view.
    /// * `offset` - Start of the view relative to this region.
    /// * `size` - Size of the view in bytes.
    ///
    /// # Returns
    ///
    /// The new view, borrowed from this region.
    ///
    /// # Errors
    ///
    /// Fails if `size` is zero or `[offset, offset + size)` is not inside this region.
    pub fn add_subregion(
        &mut self,
        name: impl Into<String>,
        offset: u64,
        size: usize,
    ) -> Result<&Self, MapError> {
        let name = name.into();
        if size == 0 {
            return Err(MapError::ZeroSize { name });
        }
        let fits = offset
            .checked_add(size as u64)
            .is_some_and(|end| end <= self.size as u64);
        if !fits {
            return Err(MapError::SubregionOutOfBounds {
                name,
                parent: self.name.clone(),
                offset,
                size: size as u64,
                parent_size: self.size as u64,
            });
        }

        let sub = Self {
            name,
            buffer: Arc::clone(&self.buffer),
            start: self.start + offset as usize,
            size,
            read_only: false,
            subregions: Vec::new(),
        };
        self.subregions.push(sub);
        Ok(&self.subregions[self.subregions.len() - 1])
    }

    /// Iterates over child views as `(offset within this region, view)`.
    pub fn subregions(&self) -> impl Iterator<Item = (u64, &Self)> {
        self.subregions
            .iter()
            .map(move |sub| ((sub.start - self.start) as u64, sub))
    }

    /// Finds a direct child view by name.
    pub fn subregion(&self, name: &str) -> Option<&Self> {
        self.subregions.iter().find(|sub| sub.name == name)
    }

    /// Finds a direct child view by name for writing.
    pub fn subregion_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.subregions.iter_mut().find(|sub| sub.name == name)
    }

    /// Returns `true` if both handles view the same backing storage.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Copies the current contents of the region.
    pub fn snapshot(&self) -> Vec<u8> {
        self.buffer.read_slice(self.start, self.size)
    }

    fn check(&self, offset: u64, len: u64) -> Result<usize, AccessFault> {
        check_span(offset, len, self.size as u64)?;
        Ok(self.start + offset as usize)
    }
}

impl Device for Region {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size as u64
    }

    fn read_u8(&mut self, offset: u64) -> Result<u8, AccessFault> {
        let at = self.check(offset, 1)?;
        Ok(self.buffer.read_u8(at))
    }

    fn write_u8(&mut self, offset: u64, val: u8) -> Result<(), AccessFault> {
        if self.read_only {
            return Err(AccessFault::ReadOnly(PhysAddr(offset)));
        }
        let at = self.check(offset, 1)?;
        self.buffer.write_u8(at, val);
        Ok(())
    }

    fn read_u16(&mut self, offset: u64) -> Result<u16, AccessFault> {
        let at = self.check(offset, 2)?;
        let bytes = self.buffer.read_slice(at, 2);
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn write_u16(&mut self, offset: u64, val: u16) -> Result<(), AccessFault> {
        if self.read_only {
            return Err(AccessFault::ReadOnly(PhysAddr(offset)));
        }
        let at = self.check(offset, 2)?;
        self.buffer.write_slice(at, &val.to_le_bytes());
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn load_bytes(&mut self, offset: u64, data: &[u8]) -> Result<(), AccessFault> {
        let at = self.check(offset, data.len() as u64)?;
        self.buffer.write_slice(at, data);
        Ok(())
    }

    fn fill_bytes(&mut self, offset: u64, len: u64, val: u8) -> Result<(), AccessFault> {
        let at = self.check(offset, len)?;
        self.buffer.fill(at, len as usize, val);
        Ok(())
    }

    fn as_region(&self) -> Option<&Region> {
        Some(self)
    }
}
