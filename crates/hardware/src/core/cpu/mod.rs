//! CPU lifecycle.
//!
//! This module defines the CPU object as bring-up sees it. It coordinates the following:
//! 1. **Instantiation:** A CPU is created inert for a resolved [`CpuModel`].
//! 2. **Realization:** The CPU checks the address space it is about to run against, fetches
//!    its reset vector and becomes active. A CPU can be realized once.
//!
//! Instruction execution is not modelled here.

/// CPU variant selection.
pub mod model;

use std::fmt;

use tracing::debug;

use crate::common::constants::{GPR_SIZE, RAM_END, RESET_VECTOR};
use crate::common::{PhysAddr, RealizeError};
use crate::soc::AddressSpace;

pub use self::model::CpuModel;

/// Physical address of the memory-mapped general register bank.
pub const GPR_BANK_BASE: u64 = RAM_END + 1 - GPR_SIZE as u64;

/// Lifecycle interface of a CPU core.
pub trait CpuCore: fmt::Debug + Send {
    /// Returns the variant this core models.
    fn model(&self) -> CpuModel;

    /// Returns `true` once [`CpuCore::realize`] has succeeded.
    fn is_realized(&self) -> bool;

    /// Activates the core against a fully constructed address space.
    ///
    /// # Errors
    ///
    /// Returns a [`RealizeError`] describing why the core refuses to run.
    fn realize(&mut self, space: &mut AddressSpace) -> Result<(), RealizeError>;
}

/// Inert-until-realized RL78 core.
#[derive(Debug, Clone)]
pub struct Rl78Cpu {
    model: CpuModel,
    realized: bool,
    /// Program counter, loaded from the reset vector on realize.
    pub pc: u32,
}

impl Rl78Cpu {
    /// Creates an inert CPU of the given model.
    pub const fn new(model: CpuModel) -> Self {
        Self {
            model,
            realized: false,
            pc: 0,
        }
    }
}

impl CpuCore for Rl78Cpu {
    fn model(&self) -> CpuModel {
        self.model
    }

    fn is_realized(&self) -> bool {
        self.realized
    }

    fn realize(&mut self, space: &mut AddressSpace) -> Result<(), RealizeError> {
        if self.realized {
            return Err(RealizeError::new(format!(
                "CPU '{}' is already realized",
                self.model
            )));
        }
        if !space.is_valid_address(GPR_BANK_BASE) {
            return Err(RealizeError::new(format!(
                "general register bank at {} is not mapped",
                PhysAddr(GPR_BANK_BASE)
            )));
        }
        let vector = space
            .read_u16(RESET_VECTOR)
            .map_err(|fault| RealizeError::new(format!("cannot fetch reset vector: {fault}")))?;

        self.pc = u32::from(vector);
        self.realized = true;
        debug!(model = %self.model, pc = %PhysAddr(u64::from(self.pc)), "CPU realized");
        Ok(())
    }
}
