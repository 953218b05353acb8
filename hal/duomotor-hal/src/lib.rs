//! Duomotor Hardware Abstraction Layer
//!
//! This crate defines the hardware surface the motor driver is written
//! against. Chip-specific HALs implement these traits so the same control
//! logic runs on real hardware or on the simulated model in [`sim`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  duomotor-drivers (MotorDriver, clock)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  duomotor-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ duomotor-hal- │       │  sim (host    │
//! │   atmega328p  │       │   testing)    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::DigitalPins`] - Pin mode configuration and digital writes
//! - [`timer::PwmTimer`] - Register access to an 8-bit PWM timer/counter
//! - [`clock::TimeBase`] - The platform's millisecond/microsecond counters

#![cfg_attr(not(any(test, feature = "sim")), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use clock::{RawTicks, TimeBase};
pub use gpio::{DigitalPins, Level, PinId, PinMode};
pub use timer::{ClockSelect, CompareOutput, ControlRegister, PwmTimer, WaveformMode};
