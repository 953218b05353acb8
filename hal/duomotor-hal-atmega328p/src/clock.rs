//! Timer0 overflow time base
//!
//! Timer0 runs in fast PWM mode at clk/64 and overflows every 256 ticks,
//! 1024 us at 16 MHz. The overflow handler adds whole milliseconds and
//! keeps the remainder in eighths of a microsecond, the same bookkeeping
//! the Arduino core uses, so the millisecond counter stays exact over time.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};
use duomotor_hal::{ClockSelect, RawTicks, TimeBase, WaveformMode};

use crate::pac::TC0;
use crate::F_CPU;

const CYCLES_PER_MICROSECOND: u32 = F_CPU / 1_000_000;
const _: () = assert!(CYCLES_PER_MICROSECOND >= 1 && CYCLES_PER_MICROSECOND <= 64);

/// Overflow period at the power-on prescaler
const MICROS_PER_OVERFLOW: u32 = 64 * 256 / CYCLES_PER_MICROSECOND;

/// Whole milliseconds per overflow
const MILLIS_INC: u32 = MICROS_PER_OVERFLOW / 1000;

/// Remaining microseconds per overflow, in eighths
const FRACT_INC: u8 = ((MICROS_PER_OVERFLOW % 1000) >> 3) as u8;

/// One millisecond, in eighths of a microsecond
const FRACT_MAX: u8 = (1000 >> 3) as u8;

#[derive(Clone, Copy)]
struct Counters {
    millis: u32,
    fract: u8,
    overflows: u32,
}

static COUNTERS: Mutex<Cell<Counters>> = Mutex::new(Cell::new(Counters {
    millis: 0,
    fract: 0,
    overflows: 0,
}));

/// Timer0 overflow interrupt body
///
/// Call from the `TIMER0_OVF` handler.
pub fn on_timer0_overflow() {
    critical_section::with(|cs| {
        let cell = COUNTERS.borrow(cs);
        let mut c = cell.get();

        c.millis = c.millis.wrapping_add(MILLIS_INC);
        c.fract += FRACT_INC;
        if c.fract >= FRACT_MAX {
            c.fract -= FRACT_MAX;
            c.millis = c.millis.wrapping_add(1);
        }
        c.overflows = c.overflows.wrapping_add(1);

        cell.set(c);
    });
}

/// Millisecond time base on Timer/Counter0
pub struct Timer0TimeBase {
    tc0: TC0,
}

impl Timer0TimeBase {
    /// Start Timer0: fast PWM, clk/64, overflow interrupt enabled
    pub fn new(tc0: TC0) -> Self {
        tc0.tccr0a
            .write(|w| unsafe { w.bits(WaveformMode::FastPwm8Bit.control_a_bits()) });
        tc0.tccr0b
            .write(|w| unsafe { w.bits(ClockSelect::Div64.bits()) });
        tc0.timsk0.write(|w| w.toie0().set_bit());
        Self { tc0 }
    }

    /// Stop the overflow interrupt and give the peripheral back
    pub fn release(self) -> TC0 {
        self.tc0.timsk0.write(|w| w.toie0().clear_bit());
        self.tc0
    }
}

impl TimeBase for Timer0TimeBase {
    const CYCLES_PER_MICROSECOND: u32 = CYCLES_PER_MICROSECOND;

    fn raw_millis(&self, cs: CriticalSection<'_>) -> u32 {
        COUNTERS.borrow(cs).get().millis
    }

    fn raw_ticks(&self, cs: CriticalSection<'_>) -> RawTicks {
        let overflows = COUNTERS.borrow(cs).get().overflows;
        let counter = self.tc0.tcnt0.read().bits();
        let overflow_pending = self.tc0.tifr0.read().tov0().bit_is_set();
        RawTicks {
            overflows,
            counter,
            overflow_pending,
        }
    }

    fn set_clock(&mut self, clock: ClockSelect) {
        self.tc0.tccr0b.modify(|r, w| unsafe {
            w.bits((r.bits() & !duomotor_hal::timer::bits::CS_MASK) | clock.bits())
        });
    }
}
