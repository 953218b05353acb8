//! Motor driver implementations
//!
//! The board carries two H-bridges driven by two 8-bit PWM timers:
//!
//! - Channel A: Timer2, forward leg on OC2B, reverse leg on OC2A
//! - Channel B: Timer1, forward leg on OC1A, reverse leg on OC1B

pub mod hbridge;

pub use hbridge::MotorDriver;
