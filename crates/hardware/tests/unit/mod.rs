//! # Unit Components
//!
//! This module organizes the tests for each building block of the board: the shared error and
//! address types, configuration, regions and the address space, the firmware loader, the CPU
//! lifecycle, and the bring-up sequence that ties them together.
