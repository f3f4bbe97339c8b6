//! Region backing storage.
//!
//! This module provides a wrapper around a raw host allocation that backs one
//! RAM-like region. On Unix the bytes come from an anonymous `mmap`, which is
//! zero-filled and committed lazily; elsewhere a `Vec` is leaked into the buffer
//! and reclaimed on drop. The buffer offers interior mutability so that a region
//! and every alias view carved out of it (e.g. the GPR window over the RAM tail)
//! observe the same bytes through a shared `Arc`.

use std::slice;

use crate::common::MapError;

/// Raw byte storage shared between a region and its alias views.
#[derive(Debug)]
pub struct RegionBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer is plain bytes with no thread affinity.
unsafe impl Send for RegionBuffer {}
// SAFETY: this module is crate-private and buffers are only reachable through
// `Region`. `Region` is not `Clone`; all views of one buffer sit in a single
// region tree and the `&self` writers below are called only from `&mut self`
// methods of that tree. Shared `&Region` access therefore only reads, and a
// writer holds the tree exclusively.
unsafe impl Sync for RegionBuffer {}

impl RegionBuffer {
    /// Allocates a zero-filled buffer of `size` bytes for the region `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ZeroSize`] for an empty request and
    /// [`MapError::Allocation`] if the host refuses the mapping.
    pub fn new(name: &str, size: usize) -> Result<Self, MapError> {
        if size == 0 {
            return Err(MapError::ZeroSize {
                name: name.to_owned(),
            });
        }

        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no fixed address; the
            // result is checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                return Err(MapError::Allocation {
                    name: name.to_owned(),
                    size,
                    reason: std::io::Error::last_os_error().to_string(),
                });
            }

            Ok(Self {
                ptr: ptr as *mut u8,
                size,
                is_mmap: true,
            })
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Ok(Self {
                ptr,
                size,
                is_mmap: false,
            })
        }
    }

    /// Returns the size of the buffer in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Always `false`; zero-sized buffers are rejected at allocation.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Reads a single byte.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of bounds. Callers bounds-check first.
    pub fn read_u8(&self, offset: usize) -> u8 {
        assert!(offset < self.size, "region read out of bounds");
        // SAFETY: offset checked against the allocation size above.
        unsafe { *self.ptr.add(offset) }
    }

    /// Writes a single byte.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of bounds. Callers bounds-check first.
    pub fn write_u8(&self, offset: usize, val: u8) {
        assert!(offset < self.size, "region write out of bounds");
        // SAFETY: offset checked against the allocation size above.
        unsafe {
            *self.ptr.add(offset) = val;
        }
    }

    /// Copies `len` bytes starting at `offset` out of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn read_slice(&self, offset: usize, len: usize) -> Vec<u8> {
        assert!(offset + len <= self.size, "region read out of bounds");
        // SAFETY: range checked against the allocation size above; the bytes
        // are copied out before any other access can observe them.
        unsafe { slice::from_raw_parts(self.ptr.add(offset), len).to_vec() }
    }

    /// Writes a slice of bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn write_slice(&self, offset: usize, data: &[u8]) {
        assert!(
            offset + data.len() <= self.size,
            "region write out of bounds"
        );
        // SAFETY: range checked above; `data` is a caller-owned slice and
        // cannot alias the host allocation.
        unsafe {
            let dest = self.ptr.add(offset);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dest, data.len());
        }
    }

    /// Fills `len` bytes starting at `offset` with `val`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn fill(&self, offset: usize, len: usize, val: u8) {
        assert!(offset + len <= self.size, "region write out of bounds");
        // SAFETY: range checked above.
        unsafe {
            std::ptr::write_bytes(self.ptr.add(offset), val, len);
        }
    }
}

impl Drop for RegionBuffer {
    /// Releases the host allocation.
    ///
    /// On Unix the anonymous mapping is unmapped; elsewhere the leaked `Vec`
    /// is reconstructed so its destructor runs.
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` are exactly what mmap returned in `new`.
            unsafe {
                let _ = libc::munmap(self.ptr as *mut _, self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: `ptr` came from a `Vec` with len == capacity == size.
            unsafe {
                let _ = Vec::from_raw_parts(self.ptr, self.size, self.size);
            }
        }
    }
}
