//! 6502 status register.
//!
//! The processor status register packs seven flags into one byte. Bit 5
//! does not physically exist as a flag and always reads as 1; bit 4 (the
//! B flag) only exists on the copy of the status byte pushed to the stack.

use bitflags::bitflags;

bitflags! {
    /// Processor status flags.
    ///
    /// ```text
    /// 7654 3210
    /// NV1B DIZC
    /// |||| ||||
    /// |||| |||+- Carry
    /// |||| ||+-- Zero
    /// |||| |+--- IRQ disable
    /// |||| +---- Decimal (ignored on the 2A03)
    /// |||+------ Break (stack copies only)
    /// ||+------- Unused, always 1
    /// |+-------- Overflow
    /// +--------- Negative
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Carry flag.
        const CARRY = 0x01;
        /// Zero flag.
        const ZERO = 0x02;
        /// IRQ disable flag.
        const IRQ_DISABLE = 0x04;
        /// Decimal mode flag (has no effect on the 2A03).
        const DECIMAL = 0x08;
        /// Break flag (only meaningful on pushed status bytes).
        const BREAK = 0x10;
        /// Unused bit, hardwired to 1.
        const UNUSED = 0x20;
        /// Overflow flag.
        const OVERFLOW = 0x40;
        /// Negative flag.
        const NEGATIVE = 0x80;
    }
}

impl Status {
    /// Power-on value: IRQ disabled, unused bit set ($24).
    #[must_use]
    pub const fn power_on() -> Self {
        Self::from_bits_truncate(0x24)
    }

    /// Build status from a byte pulled off the stack.
    ///
    /// The B flag is discarded and the unused bit is forced to 1, matching
    /// what PLP and RTI do in hardware.
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        let mut status = Self::from_bits_truncate(value);
        status.remove(Self::BREAK);
        status.insert(Self::UNUSED);
        status
    }

    /// Produce the byte pushed to the stack.
    ///
    /// BRK and PHP push with B set; hardware interrupts push with B clear.
    /// The unused bit is always set in the pushed copy.
    #[must_use]
    pub fn to_stack_byte(self, break_flag: bool) -> u8 {
        let mut value = self.bits() | Self::UNUSED.bits();
        if break_flag {
            value |= Self::BREAK.bits();
        } else {
            value &= !Self::BREAK.bits();
        }
        value
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::power_on()
    }
}
