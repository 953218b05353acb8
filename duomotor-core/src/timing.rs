//! Time base compensation arithmetic
//!
//! Initializing the driver moves the time base timer from its power-on
//! prescaler (clk/64) to the PWM prescaler (clk/8). The overflow interrupt
//! still credits 1.024 ms per overflow, so the raw counters run
//! [`PRESCALER_FACTOR`] times fast. These functions undo that.
//!
//! All arithmetic wraps like the underlying 32-bit counters.

use duomotor_hal::{ClockSelect, RawTicks};

/// Prescaler used for both PWM timers and the shared time base
pub const PWM_CLOCK: ClockSelect = ClockSelect::Div8;

/// Power-on prescaler the time base counters are calibrated for
pub const TIME_BASE_CLOCK: ClockSelect = ClockSelect::Div64;

/// Factor by which the raw counters run fast after initialization
pub const PRESCALER_FACTOR: u32 = PWM_CLOCK.factor();

/// Microseconds credited per 1 ms step of a busy wait
pub const MICROS_PER_MILLI: u16 = 1000;

/// Corrected milliseconds from the raw millisecond counter
pub const fn corrected_millis(raw_millis: u32) -> u32 {
    raw_millis / PRESCALER_FACTOR
}

/// Corrected microseconds from a raw timer snapshot
///
/// A pending overflow flag with the counter below 255 means the counter
/// already wrapped but the interrupt has not run yet, so one overflow is
/// added. `cycles_per_us` above 64 yields zero, as the tick length rounds
/// to nothing; so does a clock of zero cycles per microsecond.
pub const fn corrected_micros(ticks: RawTicks, cycles_per_us: u32) -> u32 {
    let mut overflows = ticks.overflows;
    if ticks.overflow_pending && ticks.counter < 255 {
        overflows = overflows.wrapping_add(1);
    }

    let total_ticks = (overflows << 8).wrapping_add(ticks.counter as u32);
    let us_per_tick = match TIME_BASE_CLOCK.factor().checked_div(cycles_per_us) {
        Some(us) => us,
        None => 0,
    };

    total_ticks.wrapping_mul(us_per_tick) / PRESCALER_FACTOR
}

/// Millisecond busy-wait bookkeeping
///
/// Tracks the low 16 bits of the microsecond clock and steps the reference
/// forward by exactly 1000 us per elapsed millisecond, so long waits do not
/// accumulate drift and survive counter wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MillisCountdown {
    start: u16,
    remaining: u32,
}

impl MillisCountdown {
    /// Start a wait of `ms` milliseconds at time `now_us`
    pub const fn new(ms: u32, now_us: u32) -> Self {
        Self {
            start: now_us as u16,
            remaining: ms,
        }
    }

    /// Milliseconds still to wait
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Check if the wait is over
    pub const fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Feed the current time; returns true once the wait is over
    pub fn poll(&mut self, now_us: u32) -> bool {
        if self.remaining > 0 && (now_us as u16).wrapping_sub(self.start) >= MICROS_PER_MILLI {
            self.remaining -= 1;
            self.start = self.start.wrapping_add(MICROS_PER_MILLI);
        }
        self.is_done()
    }
}
