//! GPIO pin abstractions
//!
//! The motor board is wired to fixed, numbered board pins. Rather than one
//! object per pin, the platform exposes a single pin bank addressed by
//! board pin number, the way the board's pin-abstraction layer does.

/// Board pin number (Arduino numbering: D0-D13, then A0-A5 as 14-19)
pub type PinId = u8;

/// Digital output level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    #[default]
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Check if this is the high level
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// High-impedance input (reset state)
    #[default]
    Input,
    /// Push-pull output
    Output,
}

/// Bank of digital pins addressed by board pin number
///
/// Implementations handle the port/bit mapping and the actual register
/// manipulation for the specific chip. Writes to pins the bank does not
/// know about are ignored.
pub trait DigitalPins {
    /// Configure the pin direction
    fn set_mode(&mut self, pin: PinId, mode: PinMode);

    /// Drive the pin's output latch
    fn write(&mut self, pin: PinId, level: Level);

    /// Read back the output latch (not the pad input)
    fn output_level(&self, pin: PinId) -> Level;

    /// Configure the pin as an output
    fn set_output(&mut self, pin: PinId) {
        self.set_mode(pin, PinMode::Output);
    }

    /// Set the pin high (logic 1)
    fn set_high(&mut self, pin: PinId) {
        self.write(pin, Level::High);
    }

    /// Set the pin low (logic 0)
    fn set_low(&mut self, pin: PinId) {
        self.write(pin, Level::Low);
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self, pin: PinId) -> bool {
        self.output_level(pin).is_high()
    }
}
