//! Duomotor - Dual-Channel H-Bridge Demo Firmware
//!
//! Runs both channels of the motor board through every primitive in a
//! loop: forward ramp, brake, reverse ramp, close, disable.
//!
//! Build from this directory with a nightly toolchain:
//! `cargo build --release`

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use panic_halt as _;

use duomotor_drivers::MotorDriver;
use duomotor_hal_atmega328p::{pac, Platform};

mod demo;

#[avr_device::interrupt(atmega328p)]
fn TIMER0_OVF() {
    duomotor_hal_atmega328p::clock::on_timer0_overflow();
}

#[avr_device::entry]
fn main() -> ! {
    let Some(dp) = pac::Peripherals::take() else {
        panic!("peripherals already taken");
    };

    let Platform {
        pins,
        timer2,
        timer1,
        time_base,
    } = Platform::new(dp);

    let (mut motor, mut clock) = MotorDriver::with_time_base(pins, timer2, timer1, time_base);

    // SAFETY: all shared state is set up and only touched inside critical sections
    unsafe { avr_device::interrupt::enable() };

    loop {
        demo::run_cycle(&mut motor, &mut clock);
    }
}
