//! Adapter implementations of the task synchronization ports.

pub mod fs;
pub mod memory;
