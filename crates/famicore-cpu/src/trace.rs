//! nestest-format execution trace.
//!
//! Renders one log line per instruction boundary in the format used by
//! the nestest golden log:
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7
//! ```
//!
//! The line is built from a side-effect-free `peek` so tracing never
//! perturbs emulation (reading PPU or APU ports through the live bus
//! would).

use crate::addressing::AddrMode;
use crate::cpu::Cpu;
use crate::opcodes::OPCODE_TABLE;

use std::fmt::Write as _;

/// Render the trace line for the instruction at the current PC.
///
/// `peek` must read memory without side effects.
#[must_use]
pub fn trace_line<F: FnMut(u16) -> u8>(cpu: &Cpu, mut peek: F) -> String {
    let pc = cpu.pc;
    let opcode = peek(pc);
    let info = &OPCODE_TABLE[opcode as usize];

    let operand_len = info.mode.operand_len();
    let lo = if operand_len >= 1 { peek(pc.wrapping_add(1)) } else { 0 };
    let hi = if operand_len >= 2 { peek(pc.wrapping_add(2)) } else { 0 };

    let bytes = match operand_len {
        0 => format!("{opcode:02X}"),
        1 => format!("{opcode:02X} {lo:02X}"),
        _ => format!("{opcode:02X} {lo:02X} {hi:02X}"),
    };

    let operand = format_operand(info.mode, pc, lo, hi);
    let marker = if info.unofficial { '*' } else { ' ' };

    let mut line = String::with_capacity(80);
    let _ = write!(line, "{pc:04X}  {bytes:<8} {marker}{} {operand}", info.mnemonic.name());
    // Pad the disassembly column to align the register dump.
    while line.len() < 48 {
        line.push(' ');
    }
    let _ = write!(
        line,
        "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status.bits(),
        cpu.sp,
        cpu.cycles()
    );
    line
}

fn format_operand(mode: AddrMode, pc: u16, lo: u8, hi: u8) -> String {
    let abs = u16::from_le_bytes([lo, hi]);
    match mode {
        AddrMode::Implied => String::new(),
        AddrMode::Accumulator => "A".to_string(),
        AddrMode::Immediate => format!("#${lo:02X}"),
        AddrMode::ZeroPage => format!("${lo:02X}"),
        AddrMode::ZeroPageX => format!("${lo:02X},X"),
        AddrMode::ZeroPageY => format!("${lo:02X},Y"),
        AddrMode::Absolute => format!("${abs:04X}"),
        AddrMode::AbsoluteX => format!("${abs:04X},X"),
        AddrMode::AbsoluteY => format!("${abs:04X},Y"),
        AddrMode::Indirect => format!("(${abs:04X})"),
        AddrMode::IndirectX => format!("(${lo:02X},X)"),
        AddrMode::IndirectY => format!("(${lo:02X}),Y"),
        AddrMode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
            format!("${target:04X}")
        }
    }
}
