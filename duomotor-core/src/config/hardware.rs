//! Hardware configuration types
//!
//! Pin assignments for the two channels. The PWM-direction pins are tied to
//! the timer compare outputs (OC2B/OC2A for channel A, OC1A/OC1B for
//! channel B) and only produce PWM on those pins; the enable and disable
//! lines are plain GPIOs.

use duomotor_hal::PinId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motor::Channel;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The same pin is assigned to more than one function
    DuplicatePin(PinId),
}

/// Pins of one H-bridge channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelPins {
    /// Drive enable (EN), high = bridge active
    pub enable: PinId,
    /// Hardware disable (DIS), high = channel cut
    pub disable: PinId,
    /// Forward leg (RPWM), idle high
    pub forward_pwm: PinId,
    /// Reverse leg (LPWM), idle high
    pub reverse_pwm: PinId,
}

impl ChannelPins {
    /// All four pins of the channel
    pub const fn pins(&self) -> [PinId; 4] {
        [self.enable, self.disable, self.forward_pwm, self.reverse_pwm]
    }
}

/// Pin map of the whole board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinMap {
    /// Channel A pins
    pub a: ChannelPins,
    /// Channel B pins
    pub b: ChannelPins,
}

impl PinMap {
    /// V2 board wiring on an Arduino Uno header
    pub const BOARD_V2: PinMap = PinMap {
        a: ChannelPins {
            enable: 2,
            disable: 4,
            forward_pwm: 3,  // OC2B
            reverse_pwm: 11, // OC2A
        },
        b: ChannelPins {
            enable: 7,
            disable: 8,
            forward_pwm: 9,  // OC1A
            reverse_pwm: 10, // OC1B
        },
    };

    /// Pins of one channel
    pub const fn channel(&self, channel: Channel) -> &ChannelPins {
        match channel {
            Channel::A => &self.a,
            Channel::B => &self.b,
        }
    }

    /// Check that no pin is assigned twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = self.a.pins();
        let b = self.b.pins();
        let all = [a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]];

        for (i, pin) in all.iter().enumerate() {
            if all[i + 1..].contains(pin) {
                return Err(ConfigError::DuplicatePin(*pin));
            }
        }

        Ok(())
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::BOARD_V2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_board_v2() {
        let map = PinMap::default();
        assert_eq!(map, PinMap::BOARD_V2);
        assert_eq!(map.channel(Channel::A).forward_pwm, 3);
        assert_eq!(map.channel(Channel::B).reverse_pwm, 10);
    }

    #[test]
    fn test_board_v2_is_valid() {
        assert_eq!(PinMap::BOARD_V2.validate(), Ok(()));
    }

    #[test]
    fn test_duplicate_pin_rejected() {
        let mut map = PinMap::BOARD_V2;
        map.b.disable = map.a.enable;
        assert_eq!(map.validate(), Err(ConfigError::DuplicatePin(2)));

        let mut map = PinMap::BOARD_V2;
        map.a.reverse_pwm = map.a.forward_pwm;
        assert_eq!(map.validate(), Err(ConfigError::DuplicatePin(3)));
    }
}
