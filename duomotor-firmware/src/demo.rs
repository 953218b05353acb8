//! Demo sequence

use duomotor_core::{Channel, Direction};
use duomotor_drivers::MotorDriver;
use duomotor_hal_atmega328p::{Pins, Timer1, Timer2};
use embedded_hal::delay::DelayNs;

type Motor = MotorDriver<Pins, Timer2, Timer1>;

/// Speed increment per ramp step
const RAMP_STEP: usize = 5;
/// Time per ramp step
const RAMP_STEP_MS: u32 = 20;
/// Pause after each stop
const PAUSE_MS: u32 = 500;

/// One pass over both channels
pub fn run_cycle(motor: &mut Motor, delay: &mut impl DelayNs) {
    for channel in Channel::ALL {
        ramp(motor, delay, channel, Direction::Forward);
        motor.brake(channel);
        delay.delay_ms(PAUSE_MS);

        ramp(motor, delay, channel, Direction::Reverse);
        motor.close(channel);
        delay.delay_ms(PAUSE_MS);

        motor.disable(channel);
        delay.delay_ms(2 * PAUSE_MS);
    }
}

/// Accelerate to full speed and back down
fn ramp(motor: &mut Motor, delay: &mut impl DelayNs, channel: Channel, direction: Direction) {
    for speed in (0..=u8::MAX).step_by(RAMP_STEP) {
        motor.set(channel, speed, direction);
        delay.delay_ms(RAMP_STEP_MS);
    }
    for speed in (0..=u8::MAX).rev().step_by(RAMP_STEP) {
        motor.set(channel, speed, direction);
        delay.delay_ms(RAMP_STEP_MS);
    }
}
