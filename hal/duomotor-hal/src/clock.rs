//! Platform time base
//!
//! The platform keeps elapsed time in counters updated by a timer overflow
//! interrupt. Those counters are wider than the CPU's word size, so every
//! read takes a [`CriticalSection`] token: the caller must have masked
//! interrupts for the duration of the read.

use critical_section::CriticalSection;

use crate::timer::ClockSelect;

/// Snapshot of the time base timer for microsecond reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawTicks {
    /// Number of overflow interrupts serviced so far
    pub overflows: u32,
    /// Current counter value (TCNTn)
    pub counter: u8,
    /// Overflow flag set but interrupt not yet serviced (TOVn)
    pub overflow_pending: bool,
}

/// Millisecond/microsecond time base driven by a timer overflow interrupt
pub trait TimeBase {
    /// CPU clock cycles per microsecond (F_CPU / 1_000_000)
    ///
    /// Must be in `1..=64`: microsecond reconstruction divides the clk/64
    /// tick length by it, and a value outside the range yields a clock
    /// that reads zero microseconds.
    const CYCLES_PER_MICROSECOND: u32;

    /// Millisecond counter maintained by the overflow interrupt
    ///
    /// The count assumes the power-on prescaler (clk/64); it runs fast by
    /// the ratio of the prescalers if the timer clock was changed.
    fn raw_millis(&self, cs: CriticalSection<'_>) -> u32;

    /// Overflow count, counter value and pending overflow flag
    fn raw_ticks(&self, cs: CriticalSection<'_>) -> RawTicks;

    /// Change the time base timer's clock source
    fn set_clock(&mut self, clock: ClockSelect);
}
