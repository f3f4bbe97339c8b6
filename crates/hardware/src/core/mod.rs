//! Processor core.
//!
//! Only the lifecycle of the core lives here: model selection, instantiation and
//! realization against a constructed address space.

/// CPU model selection and lifecycle.
pub mod cpu;

pub use self::cpu::{CpuCore, CpuModel, Rl78Cpu};
