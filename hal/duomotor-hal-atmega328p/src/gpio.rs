//! Digital pins by Arduino pin number
//!
//! D0-D7 are PORTD0-7, D8-D13 are PORTB0-5 and A0-A5 (pins 14-19) are
//! PORTC0-5, as on the Arduino Uno header.

use duomotor_hal::{DigitalPins, Level, PinId, PinMode};

use crate::pac::{PORTB, PORTC, PORTD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Port {
    B,
    C,
    D,
}

/// Port and bit mask of a board pin
const fn locate(pin: PinId) -> Option<(Port, u8)> {
    match pin {
        0..=7 => Some((Port::D, 1 << pin)),
        8..=13 => Some((Port::B, 1 << (pin - 8))),
        14..=19 => Some((Port::C, 1 << (pin - 14))),
        _ => None,
    }
}

/// Set or clear `mask` in an I/O register with interrupts masked
macro_rules! update_bits {
    ($reg:expr, $mask:expr, $set:expr) => {
        critical_section::with(|_| {
            $reg.modify(|r, w| {
                let bits = if $set {
                    r.bits() | $mask
                } else {
                    r.bits() & !$mask
                };
                unsafe { w.bits(bits) }
            })
        })
    };
}

/// The three I/O ports as one pin bank
pub struct Pins {
    portb: PORTB,
    portc: PORTC,
    portd: PORTD,
}

impl Pins {
    /// Take ownership of the ports; pin states are left untouched
    pub fn new(portb: PORTB, portc: PORTC, portd: PORTD) -> Self {
        Self {
            portb,
            portc,
            portd,
        }
    }

    /// Give the ports back
    pub fn release(self) -> (PORTB, PORTC, PORTD) {
        (self.portb, self.portc, self.portd)
    }
}

impl DigitalPins for Pins {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        let Some((port, mask)) = locate(pin) else {
            return;
        };
        let output = mode == PinMode::Output;
        match port {
            Port::B => update_bits!(self.portb.ddrb, mask, output),
            Port::C => update_bits!(self.portc.ddrc, mask, output),
            Port::D => update_bits!(self.portd.ddrd, mask, output),
        }
    }

    fn write(&mut self, pin: PinId, level: Level) {
        let Some((port, mask)) = locate(pin) else {
            return;
        };
        let high = level.is_high();
        match port {
            Port::B => update_bits!(self.portb.portb, mask, high),
            Port::C => update_bits!(self.portc.portc, mask, high),
            Port::D => update_bits!(self.portd.portd, mask, high),
        }
    }

    fn output_level(&self, pin: PinId) -> Level {
        let Some((port, mask)) = locate(pin) else {
            return Level::Low;
        };
        let latch = match port {
            Port::B => self.portb.portb.read().bits(),
            Port::C => self.portc.portc.read().bits(),
            Port::D => self.portd.portd.read().bits(),
        };
        Level::from(latch & mask != 0)
    }
}
