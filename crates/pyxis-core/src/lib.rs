//! Pyxis Core
//!
//! Shared utilities for the Pyxis rendering crates: logging setup, puffin
//! profiling hooks, math re-exports and small geometry value types.

pub mod alloc;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
