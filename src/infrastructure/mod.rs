//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits and wires up the stores.

pub mod di;
pub mod traits;
