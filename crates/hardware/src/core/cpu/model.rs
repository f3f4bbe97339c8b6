//! CPU model selection.

use std::fmt;

use crate::common::BringUpError;
use crate::common::constants::DEFAULT_CPU_MODEL;

/// Supported RL78 CPU variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuModel {
    /// RL78/G13 general-purpose core.
    #[default]
    G13,
}

impl CpuModel {
    /// Every supported variant, in listing order.
    pub const ALL: &'static [Self] = &[Self::G13];

    /// Returns the model name used on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::G13 => DEFAULT_CPU_MODEL,
        }
    }

    /// Looks up a variant by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|model| model.name().eq_ignore_ascii_case(name))
    }

    /// Resolves an optional model selector; `None` selects the board default.
    ///
    /// # Errors
    ///
    /// Returns [`BringUpError::UnknownCpuModel`] if no variant has that name.
    pub fn resolve(name: Option<&str>) -> Result<Self, BringUpError> {
        match name {
            None => Ok(Self::default()),
            Some(name) => {
                Self::from_name(name).ok_or_else(|| BringUpError::UnknownCpuModel(name.to_owned()))
            }
        }
    }
}

impl fmt::Display for CpuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
