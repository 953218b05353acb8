//! Motor channel types
//!
//! The board has two independent H-bridge channels. Each channel has a
//! forward leg (RPWM) and a reverse leg (LPWM), both driven by compare
//! outputs of the channel's timer.

use duomotor_hal::CompareOutput;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Speed level, 0 = slowest, 255 = fastest
///
/// Values come from callers as 8-bit quantities; converting from a wider
/// integer with `as u8` wraps, which is the caller's responsibility.
pub type Speed = u8;

/// Motor channel (one H-bridge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Channel A (Timer2)
    A,
    /// Channel B (Timer1)
    B,
}

impl Channel {
    /// Both channels, in board order
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Compare output that drives the leg for `direction`
    ///
    /// Channel A's forward leg sits on OC2B and channel B's on OC1A, so the
    /// mapping is not the same for both channels.
    pub const fn compare_output(self, direction: Direction) -> CompareOutput {
        match (self, direction) {
            (Channel::A, Direction::Forward) => CompareOutput::B,
            (Channel::A, Direction::Reverse) => CompareOutput::A,
            (Channel::B, Direction::Forward) => CompareOutput::A,
            (Channel::B, Direction::Reverse) => CompareOutput::B,
        }
    }
}

/// Raw channel value outside `0..=1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidChannel(pub u8);

impl TryFrom<u8> for Channel {
    type Error = InvalidChannel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Channel::A),
            1 => Ok(Channel::B),
            other => Err(InvalidChannel(other)),
        }
    }
}

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Forward rotation (RPWM leg)
    Forward,
    /// Reverse rotation (LPWM leg)
    Reverse,
}

/// Result of a control operation
///
/// Control operations never fail. An invalid channel makes the call a
/// no-op, reported as [`Outcome::Ignored`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Registers and pins were written
    Applied,
    /// Invalid channel; nothing was written
    Ignored,
}

impl Outcome {
    /// Check if the operation touched the hardware
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// What the bridge of a channel is doing, decoded from hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveMode {
    /// Enable pin low, bridge outputs high-impedance (motor coasts)
    Closed,
    /// Enable pin high, both legs idle (windings shorted)
    ///
    /// This is also the configuration right after initialization.
    Braked,
    /// Enable pin high, one leg carries the PWM duty cycle
    Driving {
        /// Leg carrying the duty cycle
        direction: Direction,
        /// Speed as requested by the caller (not the inverted compare value)
        speed: Speed,
    },
    /// Both legs connected to their compare outputs
    ///
    /// Never produced by the driver's own operations.
    BothLegs,
}

/// Decoded channel state: drive mode plus the hardware disable overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    /// Bridge configuration
    pub mode: DriveMode,
    /// Disable line asserted (cuts the channel whatever `mode` says)
    pub disabled: bool,
}

impl ChannelState {
    /// Check if the channel is currently delivering power to the motor
    pub fn is_driving(&self) -> bool {
        !self.disabled && matches!(self.mode, DriveMode::Driving { .. })
    }
}

/// Compare register value for a requested speed
///
/// The bridge inputs are active-low, so the register takes the complement.
pub const fn compare_value(speed: Speed) -> u8 {
    !speed
}

/// Requested speed for a compare register value
pub const fn speed_from_compare(value: u8) -> Speed {
    !value
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_channel_from_raw() {
        assert_eq!(Channel::try_from(0), Ok(Channel::A));
        assert_eq!(Channel::try_from(1), Ok(Channel::B));
        assert_eq!(Channel::try_from(2), Err(InvalidChannel(2)));
        assert_eq!(Channel::try_from(255), Err(InvalidChannel(255)));
    }

    #[test]
    fn test_compare_outputs_differ_per_direction() {
        for ch in Channel::ALL {
            let fwd = ch.compare_output(Direction::Forward);
            let rev = ch.compare_output(Direction::Reverse);
            assert_eq!(fwd.opposite(), rev);
        }
        assert_eq!(
            Channel::A.compare_output(Direction::Forward),
            CompareOutput::B
        );
        assert_eq!(
            Channel::B.compare_output(Direction::Forward),
            CompareOutput::A
        );
    }

    #[test]
    fn test_compare_value_endpoints() {
        assert_eq!(compare_value(0), 255);
        assert_eq!(compare_value(255), 0);
        assert_eq!(compare_value(100), 155);
    }

    #[test]
    fn test_is_driving() {
        let driving = ChannelState {
            mode: DriveMode::Driving {
                direction: Direction::Forward,
                speed: 10,
            },
            disabled: false,
        };
        assert!(driving.is_driving());
        assert!(!ChannelState {
            disabled: true,
            ..driving
        }
        .is_driving());
        assert!(!ChannelState {
            mode: DriveMode::Braked,
            disabled: false,
        }
        .is_driving());
    }

    proptest! {
        #[test]
        fn prop_compare_value_is_inverse(speed in any::<u8>()) {
            prop_assert_eq!(compare_value(speed) as u16 + speed as u16, 255);
            prop_assert_eq!(speed_from_compare(compare_value(speed)), speed);
        }
    }
}
