//! Pin bank built from `embedded-hal` output pins
//!
//! Lets the motor driver run on any HAL whose pins implement
//! [`embedded_hal::digital::OutputPin`]. Each pin is tagged with the board
//! pin number the [`PinMap`](duomotor_core::PinMap) refers to.

use duomotor_hal::{DigitalPins, Level, PinId, PinMode};
use embedded_hal::digital::OutputPin;

/// Fixed set of numbered `embedded-hal` output pins
///
/// The pins are outputs by type, so mode changes are no-ops. Output levels
/// are tracked in the bank since `OutputPin` has no readback; a failed
/// write leaves the tracked level unchanged.
pub struct OutputPinBank<P, const N: usize> {
    pins: [(PinId, P); N],
    levels: [Level; N],
}

impl<P: OutputPin, const N: usize> OutputPinBank<P, N> {
    /// Create a bank; all levels are assumed low until first written
    pub fn new(pins: [(PinId, P); N]) -> Self {
        Self {
            pins,
            levels: [Level::Low; N],
        }
    }

    /// Give the pins back
    pub fn into_inner(self) -> [(PinId, P); N] {
        self.pins
    }

    fn index(&self, pin: PinId) -> Option<usize> {
        self.pins.iter().position(|(id, _)| *id == pin)
    }
}

impl<P: OutputPin, const N: usize> DigitalPins for OutputPinBank<P, N> {
    fn set_mode(&mut self, _pin: PinId, _mode: PinMode) {}

    fn write(&mut self, pin: PinId, level: Level) {
        let Some(i) = self.index(pin) else {
            trace!("write to unmapped pin {} ignored", pin);
            return;
        };

        let output = &mut self.pins[i].1;
        let result = match level {
            Level::High => output.set_high(),
            Level::Low => output.set_low(),
        };

        match result {
            Ok(()) => self.levels[i] = level,
            Err(_) => trace!("pin {} write failed", pin),
        }
    }

    fn output_level(&self, pin: PinId) -> Level {
        self.index(pin)
            .map(|i| self.levels[i])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MotorDriver;
    use duomotor_core::{Channel, Direction, DriveMode, PinMap};
    use duomotor_hal::sim::SimTimer;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock output pin for testing
    struct MockPin {
        high: bool,
        broken: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: false,
                broken: false,
            }
        }

        fn broken() -> Self {
            Self {
                high: false,
                broken: true,
            }
        }
    }

    impl ErrorType for MockPin {
        type Error = ErrorKind;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Self::Error> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Self::Error> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = false;
            Ok(())
        }
    }

    fn board_bank() -> OutputPinBank<MockPin, 8> {
        let PinMap { a, b } = PinMap::BOARD_V2;
        OutputPinBank::new([
            (a.enable, MockPin::new()),
            (a.disable, MockPin::new()),
            (a.forward_pwm, MockPin::new()),
            (a.reverse_pwm, MockPin::new()),
            (b.enable, MockPin::new()),
            (b.disable, MockPin::new()),
            (b.forward_pwm, MockPin::new()),
            (b.reverse_pwm, MockPin::new()),
        ])
    }

    #[test]
    fn test_write_and_readback() {
        let mut bank = board_bank();

        bank.set_high(2);
        assert_eq!(bank.output_level(2), Level::High);
        assert!(bank.is_set_high(2));

        bank.set_low(2);
        assert_eq!(bank.output_level(2), Level::Low);

        let pins = bank.into_inner();
        assert!(!pins[0].1.high);
    }

    #[test]
    fn test_unmapped_pin_ignored() {
        let mut bank = board_bank();
        bank.set_output(13);
        bank.set_high(13);
        assert_eq!(bank.output_level(13), Level::Low);
    }

    #[test]
    fn test_failed_write_keeps_level() {
        let mut bank = OutputPinBank::new([(5, MockPin::broken())]);
        bank.set_high(5);
        assert_eq!(bank.output_level(5), Level::Low);
    }

    #[test]
    fn test_drives_motor_driver() {
        let mut motor = MotorDriver::new(board_bank(), SimTimer::timer2(), SimTimer::timer1());

        motor.set(Channel::B, 64, Direction::Forward);
        motor.close(Channel::A);

        assert_eq!(motor.channel_state(Channel::A).mode, DriveMode::Closed);
        assert_eq!(
            motor.channel_state(Channel::B).mode,
            DriveMode::Driving {
                direction: Direction::Forward,
                speed: 64,
            }
        );

        let (bank, _, _) = motor.release();
        let pins = bank.into_inner();
        // Channel A: EN low, DIS low, both legs idle high
        assert!(!pins[0].1.high);
        assert!(!pins[1].1.high);
        assert!(pins[2].1.high);
        assert!(pins[3].1.high);
        // Channel B: EN high, DIS low
        assert!(pins[4].1.high);
        assert!(!pins[5].1.high);
    }
}
