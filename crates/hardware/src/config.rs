//! Configuration for the RL78/G13 promotion board.
//!
//! This module defines the configuration structures used to parameterize bring-up. It provides:
//! 1. **Defaults:** Baseline values used when a field is not supplied.
//! 2. **Structures:** Machine (CPU selection), memory (RAM request) and firmware (image name, search path).
//! 3. **Loading:** JSON parsing from a string or file; the CLI overlays its flags on top.
//!
//! The configuration is an explicit value threaded through bring-up. Nothing in it is mutated
//! by the sequencer; the effective RAM size is reported back in [`crate::soc::Machine`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::BringUpError;

/// Default configuration constants.
mod defaults {
    use crate::common::constants::RAM_CEILING;

    /// Requested RAM size when none is given.
    ///
    /// Defaults to the board ceiling so an unconfigured run passes the RAM check.
    pub const RAM_SIZE: usize = RAM_CEILING;

    /// Number of CPUs requested when none is given.
    pub const SMP: usize = 1;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use rl78sim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.memory.ram_size, 4096);
/// assert!(config.firmware.name.is_none());
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use rl78sim_core::config::Config;
///
/// let json = r#"{
///     "machine": { "cpu_model": "g13" },
///     "memory": { "ram_size": 2048 },
///     "firmware": { "name": "blinky.elf", "search_path": ["/usr/share/rl78"] }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.machine.cpu_model.as_deref(), Some("g13"));
/// assert_eq!(config.memory.ram_size, 2048);
/// assert_eq!(config.firmware.name.as_deref(), Some("blinky.elf"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// CPU selection
    #[serde(default)]
    pub machine: MachineConfig,
    /// Memory sizing
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Firmware image
    #[serde(default)]
    pub firmware: FirmwareConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`BringUpError::Config`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, BringUpError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BringUpError::ConfigIo`] if the file cannot be read and
    /// [`BringUpError::Config`] if it is malformed.
    pub fn from_file(path: &Path) -> Result<Self, BringUpError> {
        let text = fs::read_to_string(path).map_err(|source| BringUpError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// CPU selection.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    /// CPU model name; the board default is used when absent
    #[serde(default)]
    pub cpu_model: Option<String>,

    /// Number of CPUs requested
    #[serde(default = "MachineConfig::default_smp")]
    pub smp: usize,
}

impl MachineConfig {
    /// Returns the default CPU count.
    fn default_smp() -> usize {
        defaults::SMP
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cpu_model: None,
            smp: defaults::SMP,
        }
    }
}

/// Memory sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Requested RAM size in bytes; validated against the board ceiling
    #[serde(default = "MemoryConfig::default_ram_size")]
    pub ram_size: usize,
}

impl MemoryConfig {
    /// Returns the default requested RAM size in bytes.
    fn default_ram_size() -> usize {
        defaults::RAM_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ram_size: defaults::RAM_SIZE,
        }
    }
}

/// Firmware image selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirmwareConfig {
    /// Firmware file name, resolved against `search_path`
    #[serde(default)]
    pub name: Option<String>,

    /// Directories searched, in order, when `name` is not a path to an existing file
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
}
