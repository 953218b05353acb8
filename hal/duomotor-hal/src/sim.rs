//! Simulated pins, timers and time base for host-side testing
//!
//! The simulation exposes the same write surface as the hardware and keeps
//! every register in memory so tests can assert on exact register values.
//!
//! Interrupt masking is simulated too: this module installs the
//! `critical-section` implementation for the test binary. Acquiring a
//! critical section masks the simulated interrupt on the current thread;
//! [`SimTimeBase`] only fires its overflow interrupt while unmasked.

#![allow(unsafe_code)]

use std::cell::Cell;

use critical_section::{CriticalSection, RawRestoreState};

use crate::clock::{RawTicks, TimeBase};
use crate::gpio::{DigitalPins, Level, PinId, PinMode};
use crate::timer::{ClockSelect, CompareOutput, ControlRegister, PwmTimer};

/// Number of board pins (D0-D13, A0-A5)
pub const PIN_COUNT: usize = 20;

thread_local! {
    static MASK_DEPTH: Cell<u32> = const { Cell::new(0) };
}

struct SimCriticalSection;
critical_section::set_impl!(SimCriticalSection);

unsafe impl critical_section::Impl for SimCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        MASK_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Default::default()
    }

    unsafe fn release(_restore: RawRestoreState) {
        MASK_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Check if simulated interrupts are masked on this thread
pub fn interrupts_masked() -> bool {
    MASK_DEPTH.with(|depth| depth.get() > 0)
}

/// Simulated pin bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimPins {
    modes: [PinMode; PIN_COUNT],
    levels: [Level; PIN_COUNT],
    writes: usize,
}

impl Default for SimPins {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPins {
    /// All pins inputs, latches low (reset state)
    pub fn new() -> Self {
        Self {
            modes: [PinMode::Input; PIN_COUNT],
            levels: [Level::Low; PIN_COUNT],
            writes: 0,
        }
    }

    /// Configured direction of a pin
    pub fn mode(&self, pin: PinId) -> PinMode {
        self.modes
            .get(pin as usize)
            .copied()
            .unwrap_or(PinMode::Input)
    }

    /// Total number of mode changes and writes seen
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl DigitalPins for SimPins {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        if let Some(slot) = self.modes.get_mut(pin as usize) {
            *slot = mode;
            self.writes += 1;
        }
    }

    fn write(&mut self, pin: PinId, level: Level) {
        if let Some(slot) = self.levels.get_mut(pin as usize) {
            *slot = level;
            self.writes += 1;
        }
    }

    fn output_level(&self, pin: PinId) -> Level {
        self.levels.get(pin as usize).copied().unwrap_or_default()
    }
}

/// Simulated 8-bit PWM timer register file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTimer {
    control: [u8; 3],
    compare: [u8; 2],
    has_control_c: bool,
    writes: usize,
    control_a_log: Vec<u8>,
}

impl SimTimer {
    /// Timer1 layout (has TCCR1C)
    pub fn timer1() -> Self {
        Self {
            control: [0; 3],
            compare: [0; 2],
            has_control_c: true,
            writes: 0,
            control_a_log: Vec::new(),
        }
    }

    /// Timer2 layout (no TCCR2C)
    pub fn timer2() -> Self {
        Self {
            has_control_c: false,
            ..Self::timer1()
        }
    }

    /// Preload a control register, e.g. with a boot loader's leftovers
    pub fn with_control(mut self, reg: ControlRegister, value: u8) -> Self {
        if self.has(reg) {
            self.control[reg as usize] = value;
        }
        self
    }

    /// Total number of register writes seen
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Every value written to TCCRnA, oldest first
    pub fn control_a_writes(&self) -> &[u8] {
        &self.control_a_log
    }

    fn has(&self, reg: ControlRegister) -> bool {
        reg != ControlRegister::C || self.has_control_c
    }
}

impl PwmTimer for SimTimer {
    fn read(&self, reg: ControlRegister) -> u8 {
        if self.has(reg) {
            self.control[reg as usize]
        } else {
            0
        }
    }

    fn write(&mut self, reg: ControlRegister, value: u8) {
        if self.has(reg) {
            self.control[reg as usize] = value;
            self.writes += 1;
            if reg == ControlRegister::A {
                self.control_a_log.push(value);
            }
        }
    }

    fn compare(&self, output: CompareOutput) -> u8 {
        self.compare[output as usize]
    }

    fn set_compare(&mut self, output: CompareOutput, value: u8) {
        self.compare[output as usize] = value;
        self.writes += 1;
    }
}

/// Simulated 16 MHz Timer0 time base
///
/// Mirrors the platform's overflow interrupt: every counter overflow adds
/// 1.024 ms to the millisecond counter (1 ms plus a fractional part kept in
/// eighths of a microsecond), whatever the clock setting. The millisecond
/// counter is stored byte by byte so an interrupt between byte reads
/// produces the same torn value the real 8-bit CPU would see.
#[derive(Debug)]
pub struct SimTimeBase {
    millis: [Cell<u8>; 4],
    fract: Cell<u8>,
    overflows: Cell<u32>,
    counter: Cell<u8>,
    overflow_flag: Cell<bool>,
    armed_interrupts: Cell<u32>,
    ticks_per_read: Cell<u32>,
    clock: ClockSelect,
}

/// Milliseconds added per overflow at clk/64 and 16 MHz
const MILLIS_INC: u32 = 1;
/// Fractional increment per overflow, in eighths of a microsecond
const FRACT_INC: u8 = 3;
/// One millisecond in eighths of a microsecond
const FRACT_MAX: u8 = 125;

impl Default for SimTimeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTimeBase {
    /// Time base at zero, running at the power-on prescaler (clk/64)
    pub fn new() -> Self {
        Self {
            millis: Default::default(),
            fract: Cell::new(0),
            overflows: Cell::new(0),
            counter: Cell::new(0),
            overflow_flag: Cell::new(false),
            armed_interrupts: Cell::new(0),
            ticks_per_read: Cell::new(0),
            clock: ClockSelect::Div64,
        }
    }

    /// Current clock setting
    pub fn clock(&self) -> ClockSelect {
        self.clock
    }

    /// Millisecond counter, read without interrupt interference
    pub fn millis_value(&self) -> u32 {
        u32::from_le_bytes([
            self.millis[0].get(),
            self.millis[1].get(),
            self.millis[2].get(),
            self.millis[3].get(),
        ])
    }

    /// Overwrite the millisecond counter
    pub fn set_millis(&self, value: u32) {
        for (cell, byte) in self.millis.iter().zip(value.to_le_bytes()) {
            cell.set(byte);
        }
    }

    /// Overwrite the timer state
    pub fn set_ticks(&self, ticks: RawTicks) {
        self.overflows.set(ticks.overflows);
        self.counter.set(ticks.counter);
        self.overflow_flag.set(ticks.overflow_pending);
    }

    /// Let `ticks` timer ticks pass before every time base read
    ///
    /// Models the time a caller spends between reads, with interrupts
    /// enabled, so busy-wait loops make progress.
    pub fn set_ticks_per_read(&self, ticks: u32) {
        self.ticks_per_read.set(ticks);
    }

    /// Raise the overflow flag with its interrupt still to be serviced
    ///
    /// The interrupt fires at the next bus access made while interrupts
    /// are unmasked.
    pub fn arm_overflow_interrupt(&self) {
        self.overflow_flag.set(true);
        self.armed_interrupts
            .set(self.armed_interrupts.get().saturating_add(1));
    }

    /// Run any armed overflow interrupt, unless interrupts are masked
    pub fn service_interrupts(&self) {
        if interrupts_masked() {
            return;
        }
        while self.armed_interrupts.get() > 0 {
            self.armed_interrupts.set(self.armed_interrupts.get() - 1);
            self.overflow_isr();
        }
    }

    /// Advance the timer by `ticks` counter ticks
    ///
    /// Overflows are serviced immediately when interrupts are unmasked,
    /// otherwise they stay pending.
    pub fn elapse_ticks(&self, ticks: u32) {
        let total = self.counter.get() as u64 + ticks as u64;
        self.counter.set((total % 256) as u8);
        for _ in 0..total / 256 {
            self.arm_overflow_interrupt();
        }
        self.service_interrupts();
    }

    /// Advance the timer by `us` microseconds of real time
    pub fn elapse_micros(&self, us: u32) {
        let factor = self.clock.factor();
        if factor == 0 {
            return;
        }
        let ticks = us as u64 * Self::CYCLES_PER_MICROSECOND as u64 / factor as u64;
        self.elapse_ticks(ticks as u32);
    }

    /// Read the millisecond counter byte by byte without masking interrupts
    pub fn read_millis_unguarded(&self) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            if i > 0 {
                self.service_interrupts();
            }
            *byte = self.millis[i].get();
        }
        u32::from_le_bytes(bytes)
    }

    fn overflow_isr(&self) {
        let mut m = self.millis_value().wrapping_add(MILLIS_INC);
        let mut f = self.fract.get() + FRACT_INC;
        if f >= FRACT_MAX {
            f -= FRACT_MAX;
            m = m.wrapping_add(1);
        }
        self.fract.set(f);
        self.set_millis(m);
        self.overflows.set(self.overflows.get().wrapping_add(1));
        self.overflow_flag.set(false);
    }

    fn advance_between_reads(&self) {
        let ticks = self.ticks_per_read.get();
        if ticks == 0 {
            return;
        }
        let total = self.counter.get() as u64 + ticks as u64;
        self.counter.set((total % 256) as u8);
        for _ in 0..total / 256 {
            self.overflow_isr();
        }
    }
}

impl TimeBase for SimTimeBase {
    const CYCLES_PER_MICROSECOND: u32 = 16;

    fn raw_millis(&self, _cs: CriticalSection<'_>) -> u32 {
        self.advance_between_reads();
        self.read_millis_unguarded()
    }

    fn raw_ticks(&self, _cs: CriticalSection<'_>) -> RawTicks {
        self.advance_between_reads();
        let overflows = self.overflows.get();
        self.service_interrupts();
        let counter = self.counter.get();
        self.service_interrupts();
        RawTicks {
            overflows,
            counter,
            overflow_pending: self.overflow_flag.get(),
        }
    }

    fn set_clock(&mut self, clock: ClockSelect) {
        self.clock = clock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_section_masks_interrupts() {
        assert!(!interrupts_masked());
        critical_section::with(|_| {
            assert!(interrupts_masked());
            critical_section::with(|_| assert!(interrupts_masked()));
            assert!(interrupts_masked());
        });
        assert!(!interrupts_masked());
    }

    #[test]
    fn test_unguarded_read_can_tear() {
        let tb = SimTimeBase::new();
        tb.set_millis(0x0000_00FF);
        tb.arm_overflow_interrupt();

        // Low byte read before the interrupt, high byte after it
        assert_eq!(tb.read_millis_unguarded(), 0x0000_01FF);
        assert_eq!(tb.millis_value(), 0x0000_0100);
    }

    #[test]
    fn test_masked_read_defers_interrupt() {
        let tb = SimTimeBase::new();
        tb.set_millis(0x0000_00FF);
        tb.arm_overflow_interrupt();

        let m = critical_section::with(|cs| tb.raw_millis(cs));
        assert_eq!(m, 0x0000_00FF);

        tb.service_interrupts();
        assert_eq!(tb.millis_value(), 0x0000_0100);
    }

    #[test]
    fn test_overflow_accounting() {
        let tb = SimTimeBase::new();

        // 125 overflows at 1.024 ms each = 128 ms
        tb.elapse_ticks(125 * 256);
        assert_eq!(tb.millis_value(), 128);

        let ticks = critical_section::with(|cs| tb.raw_ticks(cs));
        assert_eq!(ticks.overflows, 125);
        assert_eq!(ticks.counter, 0);
        assert!(!ticks.overflow_pending);
    }

    #[test]
    fn test_elapse_while_masked_leaves_flag_pending() {
        let tb = SimTimeBase::new();
        tb.set_ticks(RawTicks {
            overflows: 3,
            counter: 250,
            overflow_pending: false,
        });

        let ticks = critical_section::with(|cs| {
            tb.elapse_ticks(10);
            tb.raw_ticks(cs)
        });
        assert_eq!(ticks.overflows, 3);
        assert_eq!(ticks.counter, 4);
        assert!(ticks.overflow_pending);

        tb.service_interrupts();
        let ticks = critical_section::with(|cs| tb.raw_ticks(cs));
        assert_eq!(ticks.overflows, 4);
        assert!(!ticks.overflow_pending);
    }

    #[test]
    fn test_elapse_micros_follows_clock() {
        let mut tb = SimTimeBase::new();
        // clk/64 at 16 MHz: 4 us per tick
        tb.elapse_micros(400);
        let ticks = critical_section::with(|cs| tb.raw_ticks(cs));
        assert_eq!(ticks.counter, 100);

        tb.set_clock(ClockSelect::Div8);
        // clk/8 at 16 MHz: 0.5 us per tick
        tb.elapse_micros(50);
        let ticks = critical_section::with(|cs| tb.raw_ticks(cs));
        assert_eq!(ticks.counter, 200);
    }

    #[test]
    fn test_unknown_pins_ignored() {
        let mut pins = SimPins::new();
        pins.set_high(PIN_COUNT as PinId);
        pins.set_output(200);
        assert_eq!(pins.write_count(), 0);
        assert_eq!(pins.output_level(200), Level::Low);
    }

    #[test]
    fn test_timer2_has_no_control_c() {
        let mut t = SimTimer::timer2();
        t.write(ControlRegister::C, 0xFF);
        assert_eq!(t.read(ControlRegister::C), 0);
        assert_eq!(t.write_count(), 0);

        let mut t = SimTimer::timer1();
        t.write(ControlRegister::C, 0x80);
        assert_eq!(t.read(ControlRegister::C), 0x80);
    }

    #[test]
    fn test_control_a_write_log() {
        let mut t = SimTimer::timer2().with_control(ControlRegister::A, 0x55);
        assert!(t.control_a_writes().is_empty());

        t.write(ControlRegister::A, 0x01);
        t.write(ControlRegister::B, 0x02);
        t.connect_exclusive(CompareOutput::A);
        assert_eq!(t.control_a_writes(), &[0x01, 0x81]);
    }
}
