//! Opcode decode table.
//!
//! All 256 opcodes decode to a `(mnemonic, addressing mode)` pair with a
//! base cycle count and a page-cross penalty flag. Unofficial opcodes are
//! marked; the JAM group halts the CPU rather than executing.

use crate::addressing::AddrMode;

/// Instruction mnemonic.
///
/// The 56 documented mnemonics plus the commonly used unofficial ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // The variants are the 6502 mnemonics themselves.
pub enum Mnemonic {
    // Official
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Unofficial
    Alr, Anc, Arr, Axs, Dcp, Isc, Jam, Las, Lax, Lxa, Rla, Rra, Sax, Sha,
    Shx, Shy, Slo, Sre, Tas, Xaa,
}

impl Mnemonic {
    /// Three-letter assembler name, as it appears in trace logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Adc => "ADC", Self::And => "AND", Self::Asl => "ASL",
            Self::Bcc => "BCC", Self::Bcs => "BCS", Self::Beq => "BEQ",
            Self::Bit => "BIT", Self::Bmi => "BMI", Self::Bne => "BNE",
            Self::Bpl => "BPL", Self::Brk => "BRK", Self::Bvc => "BVC",
            Self::Bvs => "BVS", Self::Clc => "CLC", Self::Cld => "CLD",
            Self::Cli => "CLI", Self::Clv => "CLV", Self::Cmp => "CMP",
            Self::Cpx => "CPX", Self::Cpy => "CPY", Self::Dec => "DEC",
            Self::Dex => "DEX", Self::Dey => "DEY", Self::Eor => "EOR",
            Self::Inc => "INC", Self::Inx => "INX", Self::Iny => "INY",
            Self::Jmp => "JMP", Self::Jsr => "JSR", Self::Lda => "LDA",
            Self::Ldx => "LDX", Self::Ldy => "LDY", Self::Lsr => "LSR",
            Self::Nop => "NOP", Self::Ora => "ORA", Self::Pha => "PHA",
            Self::Php => "PHP", Self::Pla => "PLA", Self::Plp => "PLP",
            Self::Rol => "ROL", Self::Ror => "ROR", Self::Rti => "RTI",
            Self::Rts => "RTS", Self::Sbc => "SBC", Self::Sec => "SEC",
            Self::Sed => "SED", Self::Sei => "SEI", Self::Sta => "STA",
            Self::Stx => "STX", Self::Sty => "STY", Self::Tax => "TAX",
            Self::Tay => "TAY", Self::Tsx => "TSX", Self::Txa => "TXA",
            Self::Txs => "TXS", Self::Tya => "TYA", Self::Alr => "ALR",
            Self::Anc => "ANC", Self::Arr => "ARR", Self::Axs => "AXS",
            Self::Dcp => "DCP", Self::Isc => "ISC", Self::Jam => "JAM",
            Self::Las => "LAS", Self::Lax => "LAX", Self::Lxa => "LXA",
            Self::Rla => "RLA", Self::Rra => "RRA", Self::Sax => "SAX",
            Self::Sha => "SHA", Self::Shx => "SHX", Self::Shy => "SHY",
            Self::Slo => "SLO", Self::Sre => "SRE", Self::Tas => "TAS",
            Self::Xaa => "XAA",
        }
    }
}

/// One decode table entry.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Instruction mnemonic.
    pub mnemonic: Mnemonic,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count (without page-cross or branch penalties).
    pub cycles: u8,
    /// True if crossing a page boundary costs one extra cycle.
    pub page_penalty: bool,
    /// True for unofficial opcodes.
    pub unofficial: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic, mode, cycles, page_penalty: false, unofficial: false }
}

const fn opp(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic, mode, cycles, page_penalty: true, unofficial: false }
}

const fn unof(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic, mode, cycles, page_penalty: false, unofficial: true }
}

const fn unofp(mnemonic: Mnemonic, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { mnemonic, mode, cycles, page_penalty: true, unofficial: true }
}

use AddrMode::{
    Absolute as Abs, AbsoluteX as AbX, AbsoluteY as AbY, Accumulator as Acc,
    Immediate as Imm, Implied as Imp, Indirect as Ind, IndirectX as IzX,
    IndirectY as IzY, Relative as Rel, ZeroPage as Zp, ZeroPageX as ZpX,
    ZeroPageY as ZpY,
};
use Mnemonic::*;

/// Complete 256-entry decode table, indexed by opcode byte.
#[rustfmt::skip]
pub const OPCODE_TABLE: [Opcode; 256] = [
    // 0x00
    op(Brk, Imp, 7),   op(Ora, IzX, 6),   unof(Jam, Imp, 2), unof(Slo, IzX, 8),
    unof(Nop, Zp, 3),  op(Ora, Zp, 3),    op(Asl, Zp, 5),    unof(Slo, Zp, 5),
    op(Php, Imp, 3),   op(Ora, Imm, 2),   op(Asl, Acc, 2),   unof(Anc, Imm, 2),
    unof(Nop, Abs, 4), op(Ora, Abs, 4),   op(Asl, Abs, 6),   unof(Slo, Abs, 6),
    // 0x10
    opp(Bpl, Rel, 2),  opp(Ora, IzY, 5),  unof(Jam, Imp, 2), unof(Slo, IzY, 8),
    unof(Nop, ZpX, 4), op(Ora, ZpX, 4),   op(Asl, ZpX, 6),   unof(Slo, ZpX, 6),
    op(Clc, Imp, 2),   opp(Ora, AbY, 4),  unof(Nop, Imp, 2), unof(Slo, AbY, 7),
    unofp(Nop, AbX, 4), opp(Ora, AbX, 4), op(Asl, AbX, 7),   unof(Slo, AbX, 7),
    // 0x20
    op(Jsr, Abs, 6),   op(And, IzX, 6),   unof(Jam, Imp, 2), unof(Rla, IzX, 8),
    op(Bit, Zp, 3),    op(And, Zp, 3),    op(Rol, Zp, 5),    unof(Rla, Zp, 5),
    op(Plp, Imp, 4),   op(And, Imm, 2),   op(Rol, Acc, 2),   unof(Anc, Imm, 2),
    op(Bit, Abs, 4),   op(And, Abs, 4),   op(Rol, Abs, 6),   unof(Rla, Abs, 6),
    // 0x30
    opp(Bmi, Rel, 2),  opp(And, IzY, 5),  unof(Jam, Imp, 2), unof(Rla, IzY, 8),
    unof(Nop, ZpX, 4), op(And, ZpX, 4),   op(Rol, ZpX, 6),   unof(Rla, ZpX, 6),
    op(Sec, Imp, 2),   opp(And, AbY, 4),  unof(Nop, Imp, 2), unof(Rla, AbY, 7),
    unofp(Nop, AbX, 4), opp(And, AbX, 4), op(Rol, AbX, 7),   unof(Rla, AbX, 7),
    // 0x40
    op(Rti, Imp, 6),   op(Eor, IzX, 6),   unof(Jam, Imp, 2), unof(Sre, IzX, 8),
    unof(Nop, Zp, 3),  op(Eor, Zp, 3),    op(Lsr, Zp, 5),    unof(Sre, Zp, 5),
    op(Pha, Imp, 3),   op(Eor, Imm, 2),   op(Lsr, Acc, 2),   unof(Alr, Imm, 2),
    op(Jmp, Abs, 3),   op(Eor, Abs, 4),   op(Lsr, Abs, 6),   unof(Sre, Abs, 6),
    // 0x50
    opp(Bvc, Rel, 2),  opp(Eor, IzY, 5),  unof(Jam, Imp, 2), unof(Sre, IzY, 8),
    unof(Nop, ZpX, 4), op(Eor, ZpX, 4),   op(Lsr, ZpX, 6),   unof(Sre, ZpX, 6),
    op(Cli, Imp, 2),   opp(Eor, AbY, 4),  unof(Nop, Imp, 2), unof(Sre, AbY, 7),
    unofp(Nop, AbX, 4), opp(Eor, AbX, 4), op(Lsr, AbX, 7),   unof(Sre, AbX, 7),
    // 0x60
    op(Rts, Imp, 6),   op(Adc, IzX, 6),   unof(Jam, Imp, 2), unof(Rra, IzX, 8),
    unof(Nop, Zp, 3),  op(Adc, Zp, 3),    op(Ror, Zp, 5),    unof(Rra, Zp, 5),
    op(Pla, Imp, 4),   op(Adc, Imm, 2),   op(Ror, Acc, 2),   unof(Arr, Imm, 2),
    op(Jmp, Ind, 5),   op(Adc, Abs, 4),   op(Ror, Abs, 6),   unof(Rra, Abs, 6),
    // 0x70
    opp(Bvs, Rel, 2),  opp(Adc, IzY, 5),  unof(Jam, Imp, 2), unof(Rra, IzY, 8),
    unof(Nop, ZpX, 4), op(Adc, ZpX, 4),   op(Ror, ZpX, 6),   unof(Rra, ZpX, 6),
    op(Sei, Imp, 2),   opp(Adc, AbY, 4),  unof(Nop, Imp, 2), unof(Rra, AbY, 7),
    unofp(Nop, AbX, 4), opp(Adc, AbX, 4), op(Ror, AbX, 7),   unof(Rra, AbX, 7),
    // 0x80
    unof(Nop, Imm, 2), op(Sta, IzX, 6),   unof(Nop, Imm, 2), unof(Sax, IzX, 6),
    op(Sty, Zp, 3),    op(Sta, Zp, 3),    op(Stx, Zp, 3),    unof(Sax, Zp, 3),
    op(Dey, Imp, 2),   unof(Nop, Imm, 2), op(Txa, Imp, 2),   unof(Xaa, Imm, 2),
    op(Sty, Abs, 4),   op(Sta, Abs, 4),   op(Stx, Abs, 4),   unof(Sax, Abs, 4),
    // 0x90
    opp(Bcc, Rel, 2),  op(Sta, IzY, 6),   unof(Jam, Imp, 2), unof(Sha, IzY, 6),
    op(Sty, ZpX, 4),   op(Sta, ZpX, 4),   op(Stx, ZpY, 4),   unof(Sax, ZpY, 4),
    op(Tya, Imp, 2),   op(Sta, AbY, 5),   op(Txs, Imp, 2),   unof(Tas, AbY, 5),
    unof(Shy, AbX, 5), op(Sta, AbX, 5),   unof(Shx, AbY, 5), unof(Sha, AbY, 5),
    // 0xA0
    op(Ldy, Imm, 2),   op(Lda, IzX, 6),   op(Ldx, Imm, 2),   unof(Lax, IzX, 6),
    op(Ldy, Zp, 3),    op(Lda, Zp, 3),    op(Ldx, Zp, 3),    unof(Lax, Zp, 3),
    op(Tay, Imp, 2),   op(Lda, Imm, 2),   op(Tax, Imp, 2),   unof(Lxa, Imm, 2),
    op(Ldy, Abs, 4),   op(Lda, Abs, 4),   op(Ldx, Abs, 4),   unof(Lax, Abs, 4),
    // 0xB0
    opp(Bcs, Rel, 2),  opp(Lda, IzY, 5),  unof(Jam, Imp, 2), unofp(Lax, IzY, 5),
    op(Ldy, ZpX, 4),   op(Lda, ZpX, 4),   op(Ldx, ZpY, 4),   unof(Lax, ZpY, 4),
    op(Clv, Imp, 2),   opp(Lda, AbY, 4),  op(Tsx, Imp, 2),   unofp(Las, AbY, 4),
    opp(Ldy, AbX, 4),  opp(Lda, AbX, 4),  opp(Ldx, AbY, 4),  unofp(Lax, AbY, 4),
    // 0xC0
    op(Cpy, Imm, 2),   op(Cmp, IzX, 6),   unof(Nop, Imm, 2), unof(Dcp, IzX, 8),
    op(Cpy, Zp, 3),    op(Cmp, Zp, 3),    op(Dec, Zp, 5),    unof(Dcp, Zp, 5),
    op(Iny, Imp, 2),   op(Cmp, Imm, 2),   op(Dex, Imp, 2),   unof(Axs, Imm, 2),
    op(Cpy, Abs, 4),   op(Cmp, Abs, 4),   op(Dec, Abs, 6),   unof(Dcp, Abs, 6),
    // 0xD0
    opp(Bne, Rel, 2),  opp(Cmp, IzY, 5),  unof(Jam, Imp, 2), unof(Dcp, IzY, 8),
    unof(Nop, ZpX, 4), op(Cmp, ZpX, 4),   op(Dec, ZpX, 6),   unof(Dcp, ZpX, 6),
    op(Cld, Imp, 2),   opp(Cmp, AbY, 4),  unof(Nop, Imp, 2), unof(Dcp, AbY, 7),
    unofp(Nop, AbX, 4), opp(Cmp, AbX, 4), op(Dec, AbX, 7),   unof(Dcp, AbX, 7),
    // 0xE0
    op(Cpx, Imm, 2),   op(Sbc, IzX, 6),   unof(Nop, Imm, 2), unof(Isc, IzX, 8),
    op(Cpx, Zp, 3),    op(Sbc, Zp, 3),    op(Inc, Zp, 5),    unof(Isc, Zp, 5),
    op(Inx, Imp, 2),   op(Sbc, Imm, 2),   op(Nop, Imp, 2),   unof(Sbc, Imm, 2),
    op(Cpx, Abs, 4),   op(Sbc, Abs, 4),   op(Inc, Abs, 6),   unof(Isc, Abs, 6),
    // 0xF0
    opp(Beq, Rel, 2),  opp(Sbc, IzY, 5),  unof(Jam, Imp, 2), unof(Isc, IzY, 8),
    unof(Nop, ZpX, 4), op(Sbc, ZpX, 4),   op(Inc, ZpX, 6),   unof(Isc, ZpX, 6),
    op(Sed, Imp, 2),   opp(Sbc, AbY, 4),  unof(Nop, Imp, 2), unof(Isc, AbY, 7),
    unofp(Nop, AbX, 4), opp(Sbc, AbX, 4), op(Inc, AbX, 7),   unof(Isc, AbX, 7),
];
