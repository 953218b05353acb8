//! ATmega328P implementation of the duomotor HAL
//!
//! Implements the shared `duomotor-hal` traits on the Arduino Uno class
//! ATmega328P:
//!
//! - [`gpio::Pins`]: PORTB/PORTC/PORTD addressed by Arduino pin number
//! - [`timer::Timer1`], [`timer::Timer2`]: the two PWM timers behind the
//!   motor channels
//! - [`clock::Timer0TimeBase`]: the Timer0 overflow time base
//!
//! The Timer0 overflow handler is not defined here. The firmware binary
//! declares it and calls [`clock::on_timer0_overflow`]:
//!
//! ```ignore
//! #[avr_device::interrupt(atmega328p)]
//! fn TIMER0_OVF() {
//!     duomotor_hal_atmega328p::clock::on_timer0_overflow();
//! }
//! ```

#![no_std]

pub mod clock;
pub mod gpio;
pub mod timer;

pub use avr_device::atmega328p as pac;

pub use clock::Timer0TimeBase;
pub use gpio::Pins;
pub use timer::{Timer1, Timer2};

/// CPU clock frequency
pub const F_CPU: u32 = 16_000_000;

/// Board peripherals the motor driver needs
pub struct Platform {
    /// Digital pins
    pub pins: Pins,
    /// Channel A timer
    pub timer2: Timer2,
    /// Channel B timer
    pub timer1: Timer1,
    /// Millisecond time base
    pub time_base: Timer0TimeBase,
}

impl Platform {
    /// Split the device peripherals and start the time base
    ///
    /// Interrupts are left as they are; the firmware enables them once
    /// everything is set up.
    pub fn new(dp: pac::Peripherals) -> Self {
        Self {
            pins: Pins::new(dp.PORTB, dp.PORTC, dp.PORTD),
            timer2: Timer2::new(dp.TC2),
            timer1: Timer1::new(dp.TC1),
            time_base: Timer0TimeBase::new(dp.TC0),
        }
    }
}
