//! Configuration types
//!
//! Board wiring description. The defaults match the V2 board revision.

pub mod hardware;

pub use hardware::*;
