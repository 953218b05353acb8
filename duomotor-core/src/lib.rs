//! Board-agnostic core types for the dual-channel motor driver
//!
//! This crate contains everything that does not touch hardware:
//!
//! - Channel, direction and speed types, plus the decoded channel state
//! - Board pin map configuration
//! - Time base compensation arithmetic

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod motor;
pub mod timing;

pub use config::{ChannelPins, ConfigError, PinMap};
pub use motor::{Channel, ChannelState, Direction, DriveMode, InvalidChannel, Outcome, Speed};
