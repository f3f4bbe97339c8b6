//! Board memory map constants.
//!
//! Fixed addresses and sizes of the RL78/G13 promotion board. These values are
//! part of the guest-visible contract and must not drift:
//!
//! | Region      | Base      | Size     | Access |
//! |-------------|-----------|----------|--------|
//! | Code flash  | `0x00000` | 64 KiB   | RO     |
//! | RAM         | `0xFEF00` | 4 KiB    | RW     |
//! | GPR window  | `0xFFEE0` | 32 B     | RW (alias of RAM tail) |
//! | SFR page    | `0xFFF00` | 256 B    | RW     |

/// Size of the RL78 physical address space (20 address bits).
pub const ADDRESS_SPACE_SIZE: u64 = 0x10_0000;

/// Base address of the code flash.
pub const CODE_FLASH_BASE: u64 = 0x0;

/// Size of the code flash (64 KiB).
pub const CODE_FLASH_SIZE: usize = 64 * 1024;

/// Last byte (inclusive) of the on-chip RAM window.
pub const RAM_END: u64 = 0xFFEFF;

/// Largest amount of RAM the board can model.
pub const RAM_CEILING: usize = 4 * 1024;

/// Size of the general register window at the tail of RAM.
pub const GPR_SIZE: usize = 32;

/// Base address of the special function register page.
pub const SFR_BASE: u64 = 0xFFF00;

/// Size of the special function register page.
pub const SFR_SIZE: usize = 256;

/// Address of the 16-bit reset vector read by the core on realize.
pub const RESET_VECTOR: u64 = 0x0;

/// ELF machine number assigned to Renesas RL78.
pub const EM_RL78: u16 = 197;

/// CPU model used when none is requested.
pub const DEFAULT_CPU_MODEL: &str = "g13";

/// Region names as they appear in diagnostics and the memory tree.
pub mod names {
    /// On-chip RAM.
    pub const RAM: &str = "rl78g13_pb.ram";
    /// General register window carved from the RAM tail.
    pub const GPR: &str = "rl78g13_pb.gpr";
    /// Read-only code flash.
    pub const CODE_FLASH: &str = "rl78g13_pb.code_flash";
    /// Special function register page.
    pub const SFR: &str = "rl78g13_pb.sfr";
}
