//! Shared primitives: geometry re-exports, pixel buffers, and the crate error type.

pub mod core;
pub mod error;
