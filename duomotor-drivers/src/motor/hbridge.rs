//! Dual H-bridge motor driver
//!
//! Maps the four channel primitives onto pin writes and timer register
//! writes. The hardware registers are the only state: the driver keeps no
//! mirror of what it wrote, and [`MotorDriver::channel_state`] decodes the
//! registers on demand.
//!
//! # Usage
//!
//! ```ignore
//! let mut motor = MotorDriver::new(pins, timer2, timer1);
//! motor.set(Channel::A, 200, Direction::Forward);
//! motor.brake(Channel::A);
//!
//! // Raw channel numbers from a command parser
//! if motor.close(cmd.channel).is_applied() { /* ... */ }
//! ```
//!
//! # Wiring
//!
//! Each leg idles with its compare output disconnected and its port latch
//! high. Driving a leg connects its compare output in non-inverting mode;
//! the compare register holds the complement of the requested speed
//! because the bridge inputs are active-low.

use duomotor_core::motor::{compare_value, speed_from_compare};
use duomotor_core::timing::PWM_CLOCK;
use duomotor_core::{
    Channel, ChannelPins, ChannelState, ConfigError, Direction, DriveMode, Outcome, PinMap, Speed,
};
use duomotor_hal::{ControlRegister, DigitalPins, PwmTimer, WaveformMode};

#[cfg(feature = "time-compensation")]
use crate::clock::CompensatedClock;
#[cfg(feature = "time-compensation")]
use duomotor_hal::TimeBase;

/// Driver for the dual-channel H-bridge board
///
/// Owns the pin bank and both PWM timers. Constructing the driver is the
/// board initialization; to initialize again, [`release`](Self::release)
/// the hardware and construct a new driver.
pub struct MotorDriver<P, TA, TB> {
    pins: P,
    /// Timer2 on the V2 board
    timer_a: TA,
    /// Timer1 on the V2 board
    timer_b: TB,
    pin_map: PinMap,
}

impl<P, TA, TB> MotorDriver<P, TA, TB>
where
    P: DigitalPins,
    TA: PwmTimer,
    TB: PwmTimer,
{
    /// Initialize the board with the V2 pin map
    ///
    /// Both channels start enabled, not disabled, with both legs idle.
    pub fn new(pins: P, timer_a: TA, timer_b: TB) -> Self {
        Self::init(PinMap::BOARD_V2, pins, timer_a, timer_b)
    }

    /// Initialize the board with a custom pin map
    pub fn with_pin_map(
        pin_map: PinMap,
        pins: P,
        timer_a: TA,
        timer_b: TB,
    ) -> Result<Self, ConfigError> {
        pin_map.validate()?;
        Ok(Self::init(pin_map, pins, timer_a, timer_b))
    }

    /// Initialize the board and take over the platform time base
    ///
    /// The time base timer shares the PWM prescaler, so it is switched to
    /// the same clock and handed back wrapped in a [`CompensatedClock`]
    /// that corrects for it. The raw time base is no longer reachable.
    #[cfg(feature = "time-compensation")]
    pub fn with_time_base<T: TimeBase>(
        pins: P,
        timer_a: TA,
        timer_b: TB,
        time_base: T,
    ) -> (Self, CompensatedClock<T>) {
        let driver = Self::new(pins, timer_a, timer_b);
        (driver, take_time_base(time_base))
    }

    /// Initialize the board with a custom pin map and take over the
    /// platform time base
    ///
    /// The pin map is validated before any hardware is touched, the time
    /// base included.
    #[cfg(feature = "time-compensation")]
    pub fn with_pin_map_and_time_base<T: TimeBase>(
        pin_map: PinMap,
        pins: P,
        timer_a: TA,
        timer_b: TB,
        time_base: T,
    ) -> Result<(Self, CompensatedClock<T>), ConfigError> {
        let driver = Self::with_pin_map(pin_map, pins, timer_a, timer_b)?;
        Ok((driver, take_time_base(time_base)))
    }

    fn init(pin_map: PinMap, pins: P, timer_a: TA, timer_b: TB) -> Self {
        let mut driver = Self {
            pins,
            timer_a,
            timer_b,
            pin_map,
        };
        driver.configure_pins();
        configure_timer(&mut driver.timer_b);
        configure_timer(&mut driver.timer_a);
        info!("motor driver initialized");
        driver
    }

    fn configure_pins(&mut self) {
        let PinMap { a, b } = self.pin_map;

        for pin in [a.enable, a.disable, b.enable, b.disable] {
            self.pins.set_output(pin);
        }
        self.pins.set_low(a.disable);
        self.pins.set_low(b.disable);
        self.pins.set_high(a.enable);
        self.pins.set_high(b.enable);

        for pin in [a.forward_pwm, a.reverse_pwm, b.forward_pwm, b.reverse_pwm] {
            self.pins.set_output(pin);
        }
        for pin in [a.forward_pwm, a.reverse_pwm, b.forward_pwm, b.reverse_pwm] {
            self.pins.set_high(pin);
        }
    }

    /// Drive a channel at `speed` in `direction`
    ///
    /// Enables the bridge, puts the duty cycle on the selected leg, returns
    /// the other leg to idle and clears the disable line.
    pub fn set<C: TryInto<Channel>>(
        &mut self,
        channel: C,
        speed: Speed,
        direction: Direction,
    ) -> Outcome {
        let Ok(channel) = channel.try_into() else {
            trace!("set: invalid channel ignored");
            return Outcome::Ignored;
        };
        trace!("set {:?}: speed={} dir={:?}", channel, speed, direction);

        let pins = *self.pin_map.channel(channel);
        let active = channel.compare_output(direction);
        let idle_pin = match direction {
            Direction::Forward => pins.reverse_pwm,
            Direction::Reverse => pins.forward_pwm,
        };

        self.pins.set_high(pins.enable);
        let timer = self.timer_mut(channel);
        timer.set_compare(active, compare_value(speed));
        timer.connect_exclusive(active);
        self.pins.set_high(idle_pin);
        self.pins.set_low(pins.disable);

        Outcome::Applied
    }

    /// Close a channel: bridge de-energized, motor coasts
    pub fn close<C: TryInto<Channel>>(&mut self, channel: C) -> Outcome {
        let Ok(channel) = channel.try_into() else {
            trace!("close: invalid channel ignored");
            return Outcome::Ignored;
        };
        trace!("close {:?}", channel);

        let pins = *self.pin_map.channel(channel);
        self.pins.set_low(pins.enable);
        self.idle_legs(channel, &pins);
        self.pins.set_low(pins.disable);

        Outcome::Applied
    }

    /// Brake a channel: bridge enabled with both legs idle
    pub fn brake<C: TryInto<Channel>>(&mut self, channel: C) -> Outcome {
        let Ok(channel) = channel.try_into() else {
            trace!("brake: invalid channel ignored");
            return Outcome::Ignored;
        };
        trace!("brake {:?}", channel);

        let pins = *self.pin_map.channel(channel);
        self.pins.set_high(pins.enable);
        self.idle_legs(channel, &pins);
        self.pins.set_low(pins.disable);

        Outcome::Applied
    }

    /// Assert the channel's hardware disable line
    ///
    /// Touches nothing else. The line stays asserted until the next
    /// [`set`](Self::set), [`close`](Self::close) or [`brake`](Self::brake)
    /// on the channel.
    pub fn disable<C: TryInto<Channel>>(&mut self, channel: C) -> Outcome {
        let Ok(channel) = channel.try_into() else {
            trace!("disable: invalid channel ignored");
            return Outcome::Ignored;
        };
        trace!("disable {:?}", channel);

        let disable = self.pin_map.channel(channel).disable;
        self.pins.set_high(disable);

        Outcome::Applied
    }

    /// Decode the channel's current state from the hardware registers
    pub fn channel_state(&self, channel: Channel) -> ChannelState {
        let pins = self.pin_map.channel(channel);
        let timer = self.timer(channel);

        let forward = channel.compare_output(Direction::Forward);
        let reverse = channel.compare_output(Direction::Reverse);

        let mode = if !self.pins.is_set_high(pins.enable) {
            DriveMode::Closed
        } else {
            match (timer.is_connected(forward), timer.is_connected(reverse)) {
                (false, false) => DriveMode::Braked,
                (true, false) => DriveMode::Driving {
                    direction: Direction::Forward,
                    speed: speed_from_compare(timer.compare(forward)),
                },
                (false, true) => DriveMode::Driving {
                    direction: Direction::Reverse,
                    speed: speed_from_compare(timer.compare(reverse)),
                },
                (true, true) => DriveMode::BothLegs,
            }
        };

        ChannelState {
            mode,
            disabled: self.pins.is_set_high(pins.disable),
        }
    }

    /// Pin map in use
    pub fn pin_map(&self) -> &PinMap {
        &self.pin_map
    }

    /// Pin bank
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Channel A's timer
    pub fn timer_a(&self) -> &TA {
        &self.timer_a
    }

    /// Channel B's timer
    pub fn timer_b(&self) -> &TB {
        &self.timer_b
    }

    /// Give the hardware back, leaving registers as they are
    pub fn release(self) -> (P, TA, TB) {
        (self.pins, self.timer_a, self.timer_b)
    }

    fn idle_legs(&mut self, channel: Channel, pins: &ChannelPins) {
        let timer = self.timer_mut(channel);
        timer.disconnect(channel.compare_output(Direction::Reverse));
        timer.disconnect(channel.compare_output(Direction::Forward));
        self.pins.set_high(pins.reverse_pwm);
        self.pins.set_high(pins.forward_pwm);
    }

    fn timer(&self, channel: Channel) -> &dyn PwmTimer {
        match channel {
            Channel::A => &self.timer_a,
            Channel::B => &self.timer_b,
        }
    }

    fn timer_mut(&mut self, channel: Channel) -> &mut dyn PwmTimer {
        match channel {
            Channel::A => &mut self.timer_a,
            Channel::B => &mut self.timer_b,
        }
    }
}

#[cfg(feature = "time-compensation")]
fn take_time_base<T: TimeBase>(mut time_base: T) -> CompensatedClock<T> {
    time_base.set_clock(PWM_CLOCK);
    debug!("time base switched to PWM prescaler");
    CompensatedClock::new(time_base)
}

/// 8-bit phase-correct PWM at the PWM prescaler, compare outputs off
fn configure_timer<T: PwmTimer>(timer: &mut T) {
    timer.write(ControlRegister::A, 0);
    timer.write(ControlRegister::B, 0);
    timer.write(ControlRegister::C, 0);
    timer.set_waveform(WaveformMode::PhaseCorrect8Bit);
    timer.set_clock(PWM_CLOCK);
}
