//! Physical address space.
//!
//! This module implements the root container that routes physical addresses to mapped regions. It provides:
//! 1. **Mapping:** Top-level regions are added at a base address; zero-sized, out-of-space and
//!    overlapping mappings are rejected. Mappings are kept sorted by base.
//! 2. **Access routing:** Byte/halfword reads and writes by physical address with a last-hit hint.
//! 3. **Image loading:** `load_at` and `fill_at` write through the privileged load path so code
//!    flash can be populated while it is read-only to the guest.
//! 4. **Introspection:** Region lookup by name (including sub-regions) and a memory-tree listing.

use std::fmt;

use tracing::debug;

use crate::common::{AccessFault, MapError, PhysAddr};
use crate::soc::memory::Region;
use crate::soc::traits::Device;

/// One top-level mapping.
#[derive(Debug)]
struct Mapping {
    base: u64,
    device: Box<dyn Device>,
}

impl Mapping {
    fn end(&self) -> u64 {
        self.base + self.device.size()
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }
}

/// The flat physical address space of the board.
#[derive(Debug, Default)]
pub struct AddressSpace {
    mappings: Vec<Mapping>,
    last_idx: usize,
}

impl AddressSpace {
    /// Creates an empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `device` at physical address `base`.
    ///
    /// # Arguments
    ///
    /// * `base` - Physical address of the first byte of the device.
    /// * `device` - The device to map; the address space takes ownership.
    ///
    /// # Errors
    ///
    /// Fails if the device is empty, extends past the 1 MiB space, or overlaps an
    /// existing mapping. Nothing is mapped on failure.
    pub fn map(&mut self, base: u64, device: Box<dyn Device>) -> Result<(), MapError> {
        let size = device.size();
        let name = device.name().to_owned();
        if size == 0 {
            return Err(MapError::ZeroSize { name });
        }
        let fits = PhysAddr(base)
            .checked_add(size - 1)
            .is_some_and(|last| last.in_space());
        if !fits {
            return Err(MapError::OutOfSpace {
                name,
                base: PhysAddr(base),
                size,
            });
        }
        let end = base + size;
        if let Some(other) = self
            .mappings
            .iter()
            .find(|m| base < m.end() && m.base < end)
        {
            return Err(MapError::Overlap {
                name,
                base: PhysAddr(base),
                size,
                other: other.device.name().to_owned(),
            });
        }

        debug!(region = %name, base = %PhysAddr(base), size, "mapped region");
        self.mappings.push(Mapping { base, device });
        self.mappings.sort_by_key(|m| m.base);
        self.last_idx = 0;
        Ok(())
    }

    /// Maps a region at physical address `base`.
    ///
    /// # Arguments
    ///
    /// * `base` - Physical address of the first byte of the region.
    /// * `region` - The region, together with any sub-regions carved from it.
    ///
    /// # Errors
    ///
    /// See [`AddressSpace::map`].
    pub fn map_region(&mut self, base: u64, region: Region) -> Result<(), MapError> {
        self.map(base, Box::new(region))
    }

    /// Returns the number of top-level mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns `true` if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Iterates over top-level mappings in address order.
    pub fn mappings(&self) -> impl Iterator<Item = (PhysAddr, &dyn Device)> {
        self.mappings
            .iter()
            .map(|m| (PhysAddr(m.base), m.device.as_ref()))
    }

    /// Finds a region by name, searching sub-regions too.
    ///
    /// # Returns
    ///
    /// The absolute base address of the region and the region itself.
    pub fn region(&self, name: &str) -> Option<(PhysAddr, &Region)> {
        fn walk<'a>(base: u64, region: &'a Region, name: &str) -> Option<(PhysAddr, &'a Region)> {
            if region.name() == name {
                return Some((PhysAddr(base), region));
            }
            region
                .subregions()
                .find_map(|(offset, sub)| walk(base + offset, sub, name))
        }

        self.mappings.iter().find_map(|m| {
            m.device
                .as_region()
                .and_then(|region| walk(m.base, region, name))
        })
    }

    /// Returns whether some mapping contains `addr`.
    pub fn is_valid_address(&self, addr: u64) -> bool {
        self.mappings.iter().any(|m| m.contains(addr))
    }

    fn find_index(&mut self, addr: u64) -> Option<usize> {
        if self
            .mappings
            .get(self.last_idx)
            .is_some_and(|m| m.contains(addr))
        {
            return Some(self.last_idx);
        }
        let idx = self.mappings.iter().position(|m| m.contains(addr))?;
        self.last_idx = idx;
        Some(idx)
    }

    fn route(&mut self, addr: u64) -> Result<(&mut dyn Device, u64, u64), AccessFault> {
        let idx = self
            .find_index(addr)
            .ok_or(AccessFault::Unmapped(PhysAddr(addr)))?;
        let m = &mut self.mappings[idx];
        Ok((m.device.as_mut(), addr - m.base, m.base))
    }

    /// Writes an image fragment at `addr`, bypassing write protection.
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical address of the first byte to write.
    /// * `data` - Bytes to place; they must all fall in the region that claims `addr`.
    ///
    /// # Errors
    ///
    /// Fails if `addr` is unmapped or the data does not fit in the region that claims it.
    pub fn load_at(&mut self, addr: u64, data: &[u8]) -> Result<(), AccessFault> {
        let (dev, offset, base) = self.route(addr)?;
        dev.load_bytes(offset, data).map_err(|f| f.rebase(base))
    }

    /// Fills `len` bytes at `addr` with `val`, bypassing write protection.
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical address of the first byte to fill.
    /// * `len` - Number of bytes.
    /// * `val` - Fill value.
    ///
    /// # Errors
    ///
    /// Fails if `addr` is unmapped or the range does not fit in the region that claims it.
    pub fn fill_at(&mut self, addr: u64, len: u64, val: u8) -> Result<(), AccessFault> {
        let (dev, offset, base) = self.route(addr)?;
        dev.fill_bytes(offset, len, val).map_err(|f| f.rebase(base))
    }

    /// Reads one byte at the given physical address.
    pub fn read_u8(&mut self, addr: u64) -> Result<u8, AccessFault> {
        let (dev, offset, base) = self.route(addr)?;
        dev.read_u8(offset).map_err(|f| f.rebase(base))
    }

    /// Reads two bytes (little-endian) at the given physical address.
    pub fn read_u16(&mut self, addr: u64) -> Result<u16, AccessFault> {
        let (dev, offset, base) = self.route(addr)?;
        dev.read_u16(offset).map_err(|f| f.rebase(base))
    }

    /// Writes one byte at the given physical address.
    pub fn write_u8(&mut self, addr: u64, val: u8) -> Result<(), AccessFault> {
        let (dev, offset, base) = self.route(addr)?;
        dev.write_u8(offset, val).map_err(|f| f.rebase(base))
    }

    /// Writes two bytes (little-endian) at the given physical address.
    pub fn write_u16(&mut self, addr: u64, val: u16) -> Result<(), AccessFault> {
        let (dev, offset, base) = self.route(addr)?;
        dev.write_u16(offset, val).map_err(|f| f.rebase(base))
    }
}

fn write_tree(
    f: &mut fmt::Formatter<'_>,
    depth: usize,
    base: u64,
    size: u64,
    read_only: bool,
    name: &str,
) -> fmt::Result {
    let access = if read_only { "ro" } else { "rw" };
    writeln!(
        f,
        "{:indent$}{:05x}-{:05x} ({access}): {name}",
        "",
        base,
        base + size - 1,
        indent = depth * 2
    )
}

fn write_region(f: &mut fmt::Formatter<'_>, depth: usize, base: u64, region: &Region) -> fmt::Result {
    write_tree(
        f,
        depth,
        base,
        region.len() as u64,
        region.is_read_only(),
        region.name(),
    )?;
    for (offset, sub) in region.subregions() {
        write_region(f, depth + 1, base + offset, sub)?;
    }
    Ok(())
}

impl fmt::Display for AddressSpace {
    /// Renders the memory tree, one line per region, sub-regions indented under their parent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "address-space: memory")?;
        for m in &self.mappings {
            match m.device.as_region() {
                Some(region) => write_region(f, 1, m.base, region)?,
                None => write_tree(
                    f,
                    1,
                    m.base,
                    m.device.size(),
                    m.device.is_read_only(),
                    m.device.name(),
                )?,
            }
        }
        Ok(())
    }
}
