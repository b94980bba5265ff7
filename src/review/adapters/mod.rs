//! Adapter implementations for review ports.

pub mod memory;
pub mod postgres;
