//! Compensated time base
//!
//! The PWM setup moves the shared time base timer to the PWM prescaler.
//! [`CompensatedClock`] owns the time base from then on and hands out
//! millis, micros and delays that are correct again.

use duomotor_core::timing::{corrected_micros, corrected_millis, MillisCountdown};
use duomotor_hal::TimeBase;
use embedded_hal::delay::DelayNs;

/// Time base corrected for the PWM prescaler
///
/// Obtained from [`MotorDriver::with_time_base`](crate::MotorDriver::with_time_base).
pub struct CompensatedClock<T> {
    time_base: T,
}

impl<T: TimeBase> CompensatedClock<T> {
    const CYCLES_IN_RANGE: () = assert!(
        T::CYCLES_PER_MICROSECOND >= 1 && T::CYCLES_PER_MICROSECOND <= 64,
        "TimeBase::CYCLES_PER_MICROSECOND must be in 1..=64"
    );

    pub(crate) fn new(time_base: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CYCLES_IN_RANGE;
        Self { time_base }
    }

    /// Milliseconds since the time base started
    pub fn millis(&self) -> u32 {
        let raw = critical_section::with(|cs| self.time_base.raw_millis(cs));
        corrected_millis(raw)
    }

    /// Microseconds since the time base started
    ///
    /// Wraps after about 71 minutes.
    pub fn micros(&self) -> u32 {
        let ticks = critical_section::with(|cs| self.time_base.raw_ticks(cs));
        corrected_micros(ticks, T::CYCLES_PER_MICROSECOND)
    }

    /// Busy-wait for `ms` milliseconds
    pub fn delay_ms(&self, ms: u32) {
        let mut wait = MillisCountdown::new(ms, self.micros());
        while !wait.poll(self.micros()) {}
    }

    /// Busy-wait for `us` microseconds
    pub fn delay_us(&self, us: u32) {
        let start = self.micros();
        while self.micros().wrapping_sub(start) < us {}
    }

    /// Underlying time base
    pub fn time_base(&self) -> &T {
        &self.time_base
    }

    /// Give the time base back; its clock stays at the PWM prescaler
    pub fn into_inner(self) -> T {
        self.time_base
    }
}

impl<T: TimeBase> DelayNs for CompensatedClock<T> {
    fn delay_ns(&mut self, ns: u32) {
        CompensatedClock::delay_us(self, ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        CompensatedClock::delay_us(self, us);
    }

    fn delay_ms(&mut self, ms: u32) {
        CompensatedClock::delay_ms(self, ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duomotor_hal::sim::SimTimeBase;
    use duomotor_hal::{ClockSelect, RawTicks};
    use proptest::prelude::*;

    fn clock() -> CompensatedClock<SimTimeBase> {
        let mut tb = SimTimeBase::new();
        tb.set_clock(ClockSelect::Div8);
        CompensatedClock::new(tb)
    }

    #[test]
    fn test_millis_not_torn_by_interrupt() {
        let clock = clock();
        clock.time_base().set_millis(0x0000_00FF);
        clock.time_base().arm_overflow_interrupt();

        assert_eq!(clock.millis(), 0xFF / 8);
        // The deferred interrupt runs once interrupts are unmasked again
        clock.time_base().service_interrupts();
        assert_eq!(clock.time_base().millis_value(), 0x100);
    }

    #[test]
    fn test_unguarded_read_would_tear() {
        let clock = clock();
        clock.time_base().set_millis(0x0000_00FF);
        clock.time_base().arm_overflow_interrupt();

        let torn = clock.time_base().read_millis_unguarded();
        assert_eq!(torn, 0x1FF);
        assert_ne!(corrected_millis(torn), 0xFF / 8);
    }

    #[test]
    fn test_corrected_after_elapse() {
        let clock = clock();
        clock.time_base().elapse_micros(10_000);

        assert_eq!(clock.micros(), 10_000);
        // Raw counter credits 1.024 ms per overflow
        assert!((9..=10).contains(&clock.millis()));
    }

    #[test]
    fn test_micros_counts_pending_overflow() {
        let clock = clock();
        clock.time_base().set_ticks(RawTicks {
            overflows: 1,
            counter: 3,
            overflow_pending: true,
        });
        assert_eq!(clock.micros(), 257);
    }

    #[test]
    fn test_delay_ms_zero_returns() {
        let clock = clock();
        clock.delay_ms(0);
        assert_eq!(clock.micros(), 0);
    }

    #[test]
    fn test_delay_ms_waits_long_enough() {
        let clock = clock();
        // 50 us per read
        clock.time_base().set_ticks_per_read(100);

        let start = clock.micros();
        clock.delay_ms(5);
        let elapsed = clock.micros().wrapping_sub(start);
        assert!(elapsed >= 5000, "elapsed {elapsed}");
        assert!(elapsed < 5200, "elapsed {elapsed}");
    }

    #[test]
    fn test_delay_us() {
        let clock = clock();
        clock.time_base().set_ticks_per_read(7);

        let start = clock.micros();
        clock.delay_us(300);
        assert!(clock.micros().wrapping_sub(start) >= 300);
    }

    #[test]
    fn test_delay_ns_trait() {
        let mut clock = clock();
        clock.time_base().set_ticks_per_read(3);

        let start = clock.micros();
        DelayNs::delay_ns(&mut clock, 1_001);
        assert!(clock.micros().wrapping_sub(start) >= 2);

        let start = clock.micros();
        DelayNs::delay_ms(&mut clock, 2);
        assert!(clock.micros().wrapping_sub(start) >= 2000);
    }

    #[test]
    fn test_into_inner_keeps_pwm_clock() {
        let tb = clock().into_inner();
        assert_eq!(tb.clock(), ClockSelect::Div8);
    }

    proptest! {
        #[test]
        fn prop_delay_ms_across_u16_wrap(
            ms in 1u32..8,
            start_overflows in 0u32..2000,
            ticks_per_read in 1u32..600,
        ) {
            let clock = clock();
            clock.time_base().set_ticks(RawTicks {
                overflows: start_overflows,
                counter: 0,
                overflow_pending: false,
            });
            clock.time_base().set_ticks_per_read(ticks_per_read);

            let start = clock.micros();
            clock.delay_ms(ms);
            prop_assert!(clock.micros().wrapping_sub(start) >= ms * 1000);
        }
    }
}
