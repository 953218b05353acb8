//! Timer1 and Timer2 as PWM timers
//!
//! Timer1 is 16-bit, but in the 8-bit PWM modes only the low byte of
//! OCR1A/OCR1B takes part in the compare.

use duomotor_hal::{CompareOutput, ControlRegister, PwmTimer};

use crate::pac::{TC1, TC2};

/// Timer/Counter1 (OC1A = D9, OC1B = D10)
pub struct Timer1 {
    tc1: TC1,
}

impl Timer1 {
    /// Take ownership of TC1; registers are left as they are
    pub fn new(tc1: TC1) -> Self {
        Self { tc1 }
    }

    /// Give the peripheral back
    pub fn release(self) -> TC1 {
        self.tc1
    }
}

impl PwmTimer for Timer1 {
    fn read(&self, reg: ControlRegister) -> u8 {
        match reg {
            ControlRegister::A => self.tc1.tccr1a.read().bits(),
            ControlRegister::B => self.tc1.tccr1b.read().bits(),
            ControlRegister::C => self.tc1.tccr1c.read().bits(),
        }
    }

    fn write(&mut self, reg: ControlRegister, value: u8) {
        match reg {
            ControlRegister::A => self.tc1.tccr1a.write(|w| unsafe { w.bits(value) }),
            ControlRegister::B => self.tc1.tccr1b.write(|w| unsafe { w.bits(value) }),
            ControlRegister::C => self.tc1.tccr1c.write(|w| unsafe { w.bits(value) }),
        }
    }

    fn compare(&self, output: CompareOutput) -> u8 {
        let value = critical_section::with(|_| match output {
            CompareOutput::A => self.tc1.ocr1a.read().bits(),
            CompareOutput::B => self.tc1.ocr1b.read().bits(),
        });
        value as u8
    }

    fn set_compare(&mut self, output: CompareOutput, value: u8) {
        // 16-bit accesses share the TEMP register
        critical_section::with(|_| match output {
            CompareOutput::A => self.tc1.ocr1a.write(|w| unsafe { w.bits(value as u16) }),
            CompareOutput::B => self.tc1.ocr1b.write(|w| unsafe { w.bits(value as u16) }),
        });
    }
}

/// Timer/Counter2 (OC2A = D11, OC2B = D3)
pub struct Timer2 {
    tc2: TC2,
}

impl Timer2 {
    /// Take ownership of TC2; registers are left as they are
    pub fn new(tc2: TC2) -> Self {
        Self { tc2 }
    }

    /// Give the peripheral back
    pub fn release(self) -> TC2 {
        self.tc2
    }
}

impl PwmTimer for Timer2 {
    fn read(&self, reg: ControlRegister) -> u8 {
        match reg {
            ControlRegister::A => self.tc2.tccr2a.read().bits(),
            ControlRegister::B => self.tc2.tccr2b.read().bits(),
            // No TCCR2C
            ControlRegister::C => 0,
        }
    }

    fn write(&mut self, reg: ControlRegister, value: u8) {
        match reg {
            ControlRegister::A => self.tc2.tccr2a.write(|w| unsafe { w.bits(value) }),
            ControlRegister::B => self.tc2.tccr2b.write(|w| unsafe { w.bits(value) }),
            ControlRegister::C => {}
        }
    }

    fn compare(&self, output: CompareOutput) -> u8 {
        match output {
            CompareOutput::A => self.tc2.ocr2a.read().bits(),
            CompareOutput::B => self.tc2.ocr2b.read().bits(),
        }
    }

    fn set_compare(&mut self, output: CompareOutput, value: u8) {
        match output {
            CompareOutput::A => self.tc2.ocr2a.write(|w| unsafe { w.bits(value) }),
            CompareOutput::B => self.tc2.ocr2b.write(|w| unsafe { w.bits(value) }),
        }
    }
}
