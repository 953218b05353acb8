//! PWM timer/counter abstractions
//!
//! Models the AVR 8-bit PWM timer surface: control registers TCCRnA/B/C and
//! output compare registers OCRnA/B. The bit layout of the fields the
//! driver touches is identical on Timer0, Timer1 (in 8-bit modes) and
//! Timer2, so one set of named bit constants serves all of them.

/// Control register bit positions
pub mod bits {
    /// TCCRnA: waveform generation mode bit 0
    pub const WGM0: u8 = 1 << 0;
    /// TCCRnA: waveform generation mode bit 1
    pub const WGM1: u8 = 1 << 1;
    /// TCCRnA: compare output mode B, bit 0
    pub const COMB0: u8 = 1 << 4;
    /// TCCRnA: compare output mode B, bit 1
    pub const COMB1: u8 = 1 << 5;
    /// TCCRnA: compare output mode A, bit 0
    pub const COMA0: u8 = 1 << 6;
    /// TCCRnA: compare output mode A, bit 1
    pub const COMA1: u8 = 1 << 7;

    /// TCCRnB: clock select bit 0
    pub const CS0: u8 = 1 << 0;
    /// TCCRnB: clock select bit 1
    pub const CS1: u8 = 1 << 1;
    /// TCCRnB: clock select bit 2
    pub const CS2: u8 = 1 << 2;
    /// TCCRnB: all clock select bits
    pub const CS_MASK: u8 = CS0 | CS1 | CS2;
}

/// Timer control register selector (TCCRnA/B/C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlRegister {
    /// TCCRnA - compare output modes, low waveform bits
    A,
    /// TCCRnB - clock select, high waveform bits
    B,
    /// TCCRnC - force output compare (Timer1 only)
    C,
}

/// Output compare unit selector (OCRnA/OCRnB and the matching OCnx pin)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompareOutput {
    /// Compare unit A
    A,
    /// Compare unit B
    B,
}

impl CompareOutput {
    /// The other compare unit of the same timer
    pub const fn opposite(self) -> Self {
        match self {
            CompareOutput::A => CompareOutput::B,
            CompareOutput::B => CompareOutput::A,
        }
    }

    /// TCCRnA bit that connects this unit's pin in non-inverting mode
    pub const fn connect_bit(self) -> u8 {
        match self {
            CompareOutput::A => bits::COMA1,
            CompareOutput::B => bits::COMB1,
        }
    }

    /// All TCCRnA compare output mode bits for this unit
    pub const fn mode_mask(self) -> u8 {
        match self {
            CompareOutput::A => bits::COMA1 | bits::COMA0,
            CompareOutput::B => bits::COMB1 | bits::COMB0,
        }
    }
}

/// Waveform generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaveformMode {
    /// Phase-correct PWM, TOP = 0xFF (same encoding on Timer0/1/2)
    PhaseCorrect8Bit,
    /// Fast PWM, TOP = 0xFF (Timer0/Timer2 encoding)
    FastPwm8Bit,
}

impl WaveformMode {
    /// WGM bits as they appear in TCCRnA
    pub const fn control_a_bits(self) -> u8 {
        match self {
            WaveformMode::PhaseCorrect8Bit => bits::WGM0,
            WaveformMode::FastPwm8Bit => bits::WGM0 | bits::WGM1,
        }
    }
}

/// Timer clock source / prescaler selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSelect {
    /// No clock source (timer stopped)
    #[default]
    Stopped,
    /// clk_io / 1
    Div1,
    /// clk_io / 8
    Div8,
    /// clk_io / 64
    Div64,
    /// clk_io / 256
    Div256,
    /// clk_io / 1024
    Div1024,
}

impl ClockSelect {
    /// CS bits as they appear in TCCRnB
    pub const fn bits(self) -> u8 {
        match self {
            ClockSelect::Stopped => 0,
            ClockSelect::Div1 => bits::CS0,
            ClockSelect::Div8 => bits::CS1,
            ClockSelect::Div64 => bits::CS1 | bits::CS0,
            ClockSelect::Div256 => bits::CS2,
            ClockSelect::Div1024 => bits::CS2 | bits::CS0,
        }
    }

    /// Decode the CS bits of a TCCRnB value
    ///
    /// External clock selections (CS = 6, 7) decode as `None`.
    pub const fn from_bits(value: u8) -> Option<Self> {
        match value & bits::CS_MASK {
            0 => Some(ClockSelect::Stopped),
            1 => Some(ClockSelect::Div1),
            2 => Some(ClockSelect::Div8),
            3 => Some(ClockSelect::Div64),
            4 => Some(ClockSelect::Div256),
            5 => Some(ClockSelect::Div1024),
            _ => None,
        }
    }

    /// Division factor (0 when stopped)
    pub const fn factor(self) -> u32 {
        match self {
            ClockSelect::Stopped => 0,
            ClockSelect::Div1 => 1,
            ClockSelect::Div8 => 8,
            ClockSelect::Div64 => 64,
            ClockSelect::Div256 => 256,
            ClockSelect::Div1024 => 1024,
        }
    }
}

/// Register-level access to one PWM timer/counter
///
/// Implementations map the selectors to the chip's registers. Writes to a
/// register the timer does not have (TCCR2C) are ignored and read as zero.
pub trait PwmTimer {
    /// Read a control register
    fn read(&self, reg: ControlRegister) -> u8;

    /// Write a control register
    fn write(&mut self, reg: ControlRegister, value: u8);

    /// Read an output compare register
    fn compare(&self, output: CompareOutput) -> u8;

    /// Write an output compare register
    fn set_compare(&mut self, output: CompareOutput, value: u8);

    /// Read-modify-write a control register: clear `clear`, then set `set`
    fn update(&mut self, reg: ControlRegister, clear: u8, set: u8) {
        let value = self.read(reg);
        self.write(reg, (value & !clear) | set);
    }

    /// Clear bits in a control register (`cbi`)
    fn clear_bits(&mut self, reg: ControlRegister, mask: u8) {
        self.update(reg, mask, 0);
    }

    /// Select the waveform generation mode bits held in TCCRnA
    fn set_waveform(&mut self, mode: WaveformMode) {
        self.update(
            ControlRegister::A,
            bits::WGM0 | bits::WGM1,
            mode.control_a_bits(),
        );
    }

    /// Select the clock source
    fn set_clock(&mut self, clock: ClockSelect) {
        self.update(ControlRegister::B, bits::CS_MASK, clock.bits());
    }

    /// Current clock source, if it is an internal prescaler setting
    fn clock(&self) -> Option<ClockSelect> {
        ClockSelect::from_bits(self.read(ControlRegister::B))
    }

    /// Connect the compare unit to its pin (non-inverting PWM) and
    /// disconnect the other unit
    ///
    /// Both changes land in a single TCCRnA write, so the two pins are
    /// never driven by the timer at the same time.
    fn connect_exclusive(&mut self, output: CompareOutput) {
        self.update(
            ControlRegister::A,
            output.mode_mask() | output.opposite().mode_mask(),
            output.connect_bit(),
        );
    }

    /// Disconnect the compare unit; the pin falls back to its port latch
    fn disconnect(&mut self, output: CompareOutput) {
        self.clear_bits(ControlRegister::A, output.mode_mask());
    }

    /// Check if the compare unit drives its pin
    fn is_connected(&self, output: CompareOutput) -> bool {
        self.read(ControlRegister::A) & output.mode_mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RegisterFile {
        control: [u8; 3],
        compare: [u8; 2],
        writes: usize,
    }

    impl PwmTimer for RegisterFile {
        fn read(&self, reg: ControlRegister) -> u8 {
            self.control[reg as usize]
        }

        fn write(&mut self, reg: ControlRegister, value: u8) {
            self.control[reg as usize] = value;
            self.writes += 1;
        }

        fn compare(&self, output: CompareOutput) -> u8 {
            self.compare[output as usize]
        }

        fn set_compare(&mut self, output: CompareOutput, value: u8) {
            self.compare[output as usize] = value;
        }
    }

    fn timer() -> RegisterFile {
        RegisterFile {
            control: [0; 3],
            compare: [0; 2],
            writes: 0,
        }
    }

    #[test]
    fn test_clock_select_bits() {
        assert_eq!(ClockSelect::Div8.bits(), bits::CS1);
        assert_eq!(ClockSelect::Div64.bits(), 0b011);
        for clock in [
            ClockSelect::Stopped,
            ClockSelect::Div1,
            ClockSelect::Div8,
            ClockSelect::Div64,
            ClockSelect::Div256,
            ClockSelect::Div1024,
        ] {
            assert_eq!(ClockSelect::from_bits(clock.bits()), Some(clock));
        }
        assert_eq!(ClockSelect::from_bits(0b110), None);
    }

    #[test]
    fn test_set_clock_preserves_other_bits() {
        let mut t = timer();
        t.write(ControlRegister::B, 0b1100_0011);
        t.set_clock(ClockSelect::Div8);
        assert_eq!(t.read(ControlRegister::B), 0b1100_0010);
        assert_eq!(t.clock(), Some(ClockSelect::Div8));
    }

    #[test]
    fn test_waveform_bits() {
        let mut t = timer();
        t.write(ControlRegister::A, bits::COMA1 | bits::WGM1);
        t.set_waveform(WaveformMode::PhaseCorrect8Bit);
        assert_eq!(t.read(ControlRegister::A), bits::COMA1 | bits::WGM0);
    }

    #[test]
    fn test_connect_disconnect() {
        let mut t = timer();
        t.set_waveform(WaveformMode::PhaseCorrect8Bit);

        t.connect_exclusive(CompareOutput::B);
        assert!(t.is_connected(CompareOutput::B));
        assert!(!t.is_connected(CompareOutput::A));
        assert_eq!(t.read(ControlRegister::A), bits::COMB1 | bits::WGM0);

        t.disconnect(CompareOutput::B);
        assert!(!t.is_connected(CompareOutput::B));
        assert_eq!(t.read(ControlRegister::A), bits::WGM0);
    }

    #[test]
    fn test_connect_exclusive_switches_in_one_write() {
        let mut t = timer();
        t.set_waveform(WaveformMode::PhaseCorrect8Bit);
        t.connect_exclusive(CompareOutput::A);

        // Leftover inverting-mode bits on B are cleared too
        t.update(ControlRegister::A, 0, bits::COMB0);
        let writes = t.writes;
        t.connect_exclusive(CompareOutput::B);

        assert_eq!(t.writes, writes + 1);
        assert_eq!(t.read(ControlRegister::A), bits::COMB1 | bits::WGM0);
        assert!(!t.is_connected(CompareOutput::A));
    }

    #[test]
    fn test_opposite_output() {
        assert_eq!(CompareOutput::A.opposite(), CompareOutput::B);
        assert_eq!(CompareOutput::B.opposite(), CompareOutput::A);
    }
}
