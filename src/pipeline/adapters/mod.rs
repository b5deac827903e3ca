//! Adapter implementations for pipeline ports.

pub mod log;
pub mod memory;
pub mod postgres;
