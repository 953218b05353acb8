//! Hardware driver implementations
//!
//! This crate drives the dual-channel H-bridge board on top of the
//! `duomotor-hal` traits:
//!
//! - [`motor::MotorDriver`]: initialization and the four per-channel
//!   primitives (set, close, brake, disable)
//! - [`clock::CompensatedClock`]: millis/micros/delay corrected for the
//!   prescaler the PWM setup imposes on the shared time base
//! - [`pins::OutputPinBank`]: adapter from `embedded-hal` output pins to the
//!   numbered pin bank the driver expects

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

#[cfg(feature = "time-compensation")]
pub mod clock;
pub mod motor;
pub mod pins;

#[cfg(feature = "time-compensation")]
pub use clock::CompensatedClock;
pub use motor::MotorDriver;
pub use pins::OutputPinBank;
