//! 6502 CPU core.
//!
//! The 2A03's CPU is a 6502 without decimal mode. This module implements
//! the register file, table-driven decode, addressing-mode resolution with
//! page-cross penalties, the interrupt sequences, and cycle accounting.
//!
//! Execution is instruction-atomic: [`Cpu::step`] runs one whole
//! instruction and returns its cycle cost. [`Cpu::tick`] layers a
//! cycle-granular view on top by burning the remaining cycles of the
//! in-flight instruction, so an orchestrator can drive the CPU one cycle
//! at a time and gate it behind DMA stalls.

use crate::addressing::AddrMode;
use crate::opcodes::{Mnemonic, OPCODE_TABLE};
use crate::status::Status;
use crate::vectors;

/// Memory bus seen by the CPU.
///
/// The CPU never owns memory; every access goes through this trait so the
/// system bus can route reads and writes to RAM, PPU/APU registers, and
/// the cartridge.
pub trait Bus {
    /// Read one byte.
    fn read(&mut self, addr: u16) -> u8;

    /// Write one byte.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a little-endian word.
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
}

/// NES 6502 CPU.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer into page $01.
    pub sp: u8,
    /// Status flags.
    pub status: Status,
    /// Total cycles executed since power-on.
    cycles: u64,
    /// Cycles left before the in-flight instruction completes (tick mode).
    cycles_left: u8,
    /// Outstanding DMA stall cycles.
    stall: u32,
    /// Edge-latched NMI request.
    nmi_pending: bool,
    /// Level-triggered IRQ line.
    irq_line: bool,
    /// I flag as sampled at the previous instruction boundary. CLI, SEI,
    /// and PLP take effect one instruction late for IRQ polling.
    prev_irq_inhibit: bool,
    /// Set once a JAM opcode executes; only reset recovers.
    jammed: bool,
}

impl Cpu {
    /// Create a CPU in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::power_on(),
            cycles: 0,
            cycles_left: 0,
            stall: 0,
            nmi_pending: false,
            irq_line: false,
            prev_irq_inhibit: true,
            jammed: false,
        }
    }

    /// Reset the CPU.
    ///
    /// Loads PC from the reset vector, forces SP to $FD and P to $24, and
    /// burns the 7-cycle reset sequence.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.sp = 0xFD;
        self.status = Status::power_on();
        self.pc = bus.read_u16(vectors::RESET);
        self.cycles = 7;
        self.cycles_left = 0;
        self.stall = 0;
        self.nmi_pending = false;
        self.irq_line = false;
        self.prev_irq_inhibit = true;
        self.jammed = false;
    }

    /// Edge-latch an NMI request.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Drive the level-triggered IRQ line.
    pub fn set_irq(&mut self, active: bool) {
        self.irq_line = active;
    }

    /// Add DMA stall cycles. Stalled ticks burn time without executing.
    pub fn add_stall(&mut self, cycles: u32) {
        self.stall += cycles;
    }

    /// Total cycles executed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// True if a JAM opcode halted the CPU.
    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// Advance one CPU cycle.
    ///
    /// Returns true on the cycle where the in-flight instruction
    /// completes, i.e. the next call may fetch a new opcode.
    pub fn tick(&mut self, bus: &mut impl Bus) -> bool {
        if self.stall > 0 {
            self.stall -= 1;
            self.cycles += 1;
            return false;
        }
        if self.jammed {
            self.cycles += 1;
            return false;
        }
        if self.cycles_left == 0 {
            self.cycles_left = self.step(bus);
        }
        self.cycles_left -= 1;
        self.cycles_left == 0
    }

    /// Execute one instruction (or interrupt sequence) and return its
    /// cycle cost. Interrupts are polled at the boundary: NMI beats IRQ,
    /// and IRQ is taken only with the I flag clear.
    pub fn step(&mut self, bus: &mut impl Bus) -> u8 {
        if self.jammed {
            self.cycles += 1;
            return 1;
        }

        let irq_inhibit = self.status.contains(Status::IRQ_DISABLE);

        if self.nmi_pending {
            self.nmi_pending = false;
            self.prev_irq_inhibit = true;
            return self.interrupt(bus, vectors::NMI);
        }

        if self.irq_line && !self.prev_irq_inhibit {
            self.prev_irq_inhibit = true;
            return self.interrupt(bus, vectors::IRQ);
        }

        self.prev_irq_inhibit = irq_inhibit;

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        let info = &OPCODE_TABLE[opcode as usize];

        let extra = self.execute(bus, opcode, info.mnemonic, info.mode, info.page_penalty);
        let total = info.cycles + extra;
        self.cycles += u64::from(total);
        total
    }

    /// Enter an interrupt sequence: push PC and status (B clear), set I,
    /// load the vector. Costs 7 cycles.
    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u8 {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::IRQ_DISABLE);
        self.pc = bus.read_u16(vector);
        self.cycles += 7;
        7
    }

    // ---------------------------------------------------------------------
    // Addressing
    // ---------------------------------------------------------------------

    /// Resolve the effective address for a memory-operand mode.
    ///
    /// Returns the address and whether indexing crossed a page boundary.
    fn resolve(&mut self, bus: &mut impl Bus, mode: AddrMode) -> (u16, bool) {
        match mode {
            AddrMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            AddrMode::ZeroPage => {
                let addr = u16::from(self.fetch(bus));
                (addr, false)
            }
            AddrMode::ZeroPageX => {
                let base = self.fetch(bus);
                (u16::from(base.wrapping_add(self.x)), false)
            }
            AddrMode::ZeroPageY => {
                let base = self.fetch(bus);
                (u16::from(base.wrapping_add(self.y)), false)
            }
            AddrMode::Absolute => (self.fetch_u16(bus), false),
            AddrMode::AbsoluteX => {
                let base = self.fetch_u16(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                (addr, page_crossed(base, addr))
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_u16(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, page_crossed(base, addr))
            }
            AddrMode::Indirect => {
                // JMP ($xxFF) wraps within the page when fetching the high
                // byte of the target.
                let ptr = self.fetch_u16(bus);
                let lo = bus.read(ptr);
                let hi_addr = (ptr & 0xFF00) | u16::from((ptr as u8).wrapping_add(1));
                let hi = bus.read(hi_addr);
                (u16::from_le_bytes([lo, hi]), false)
            }
            AddrMode::IndirectX => {
                let base = self.fetch(bus).wrapping_add(self.x);
                let lo = bus.read(u16::from(base));
                let hi = bus.read(u16::from(base.wrapping_add(1)));
                (u16::from_le_bytes([lo, hi]), false)
            }
            AddrMode::IndirectY => {
                let ptr = self.fetch(bus);
                let lo = bus.read(u16::from(ptr));
                let hi = bus.read(u16::from(ptr.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, page_crossed(base, addr))
            }
            AddrMode::Implied | AddrMode::Accumulator | AddrMode::Relative => {
                unreachable!("no effective address for {mode:?}")
            }
        }
    }

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Execute a decoded instruction. Returns extra cycles (page crossing
    /// on reads, branch penalties).
    #[allow(clippy::too_many_lines)]
    fn execute(
        &mut self,
        bus: &mut impl Bus,
        opcode: u8,
        mnemonic: Mnemonic,
        mode: AddrMode,
        page_penalty: bool,
    ) -> u8 {
        use Mnemonic::*;

        // Read-type instructions share the operand-load path; the extra
        // page-cross cycle applies only where the table says so.
        macro_rules! load {
            () => {{
                let (addr, crossed) = self.resolve(bus, mode);
                (bus.read(addr), u8::from(crossed && page_penalty))
            }};
        }
        // RMW instructions: read, write back the original, write the new
        // value. The double write is the documented hardware sequence.
        macro_rules! modify {
            ($f:expr) => {{
                if mode == AddrMode::Accumulator {
                    let value = self.a;
                    let result = ($f)(self, value);
                    self.a = result;
                } else {
                    let (addr, _) = self.resolve(bus, mode);
                    let value = bus.read(addr);
                    bus.write(addr, value);
                    let result = ($f)(self, value);
                    bus.write(addr, result);
                }
                0
            }};
        }
        macro_rules! store {
            ($value:expr) => {{
                let (addr, _) = self.resolve(bus, mode);
                bus.write(addr, $value);
                0
            }};
        }

        match mnemonic {
            // Loads
            Lda => {
                let (value, extra) = load!();
                self.a = value;
                self.set_zn(self.a);
                extra
            }
            Ldx => {
                let (value, extra) = load!();
                self.x = value;
                self.set_zn(self.x);
                extra
            }
            Ldy => {
                let (value, extra) = load!();
                self.y = value;
                self.set_zn(self.y);
                extra
            }

            // Stores
            Sta => store!(self.a),
            Stx => store!(self.x),
            Sty => store!(self.y),

            // Arithmetic
            Adc => {
                let (value, extra) = load!();
                self.adc(value);
                extra
            }
            Sbc => {
                let (value, extra) = load!();
                self.adc(!value);
                extra
            }
            Cmp => {
                let (value, extra) = load!();
                self.compare(self.a, value);
                extra
            }
            Cpx => {
                let (value, extra) = load!();
                self.compare(self.x, value);
                extra
            }
            Cpy => {
                let (value, extra) = load!();
                self.compare(self.y, value);
                extra
            }

            // Logic
            And => {
                let (value, extra) = load!();
                self.a &= value;
                self.set_zn(self.a);
                extra
            }
            Ora => {
                let (value, extra) = load!();
                self.a |= value;
                self.set_zn(self.a);
                extra
            }
            Eor => {
                let (value, extra) = load!();
                self.a ^= value;
                self.set_zn(self.a);
                extra
            }
            Bit => {
                let (value, extra) = load!();
                self.status.set(Status::ZERO, self.a & value == 0);
                self.status.set(Status::OVERFLOW, value & 0x40 != 0);
                self.status.set(Status::NEGATIVE, value & 0x80 != 0);
                extra
            }

            // Shifts and rotates
            Asl => modify!(Self::asl_value),
            Lsr => modify!(Self::lsr_value),
            Rol => modify!(Self::rol_value),
            Ror => modify!(Self::ror_value),

            // Increment / decrement
            Inc => modify!(|cpu: &mut Self, v: u8| {
                let result = v.wrapping_add(1);
                cpu.set_zn(result);
                result
            }),
            Dec => modify!(|cpu: &mut Self, v: u8| {
                let result = v.wrapping_sub(1);
                cpu.set_zn(result);
                result
            }),
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
                0
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
                0
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
                0
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
                0
            }

            // Register transfers
            Tax => {
                self.x = self.a;
                self.set_zn(self.x);
                0
            }
            Tay => {
                self.y = self.a;
                self.set_zn(self.y);
                0
            }
            Txa => {
                self.a = self.x;
                self.set_zn(self.a);
                0
            }
            Tya => {
                self.a = self.y;
                self.set_zn(self.a);
                0
            }
            Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
                0
            }
            Txs => {
                self.sp = self.x;
                0
            }

            // Stack
            Pha => {
                self.push(bus, self.a);
                0
            }
            Php => {
                self.push(bus, self.status.to_stack_byte(true));
                0
            }
            Pla => {
                self.a = self.pull(bus);
                self.set_zn(self.a);
                0
            }
            Plp => {
                self.status = Status::from_stack_byte(self.pull(bus));
                0
            }

            // Jumps and subroutines
            Jmp => {
                let (addr, _) = self.resolve(bus, mode);
                self.pc = addr;
                0
            }
            Jsr => {
                let target = self.fetch_u16(bus);
                self.push_u16(bus, self.pc.wrapping_sub(1));
                self.pc = target;
                0
            }
            Rts => {
                self.pc = self.pull_u16(bus).wrapping_add(1);
                0
            }
            Rti => {
                self.status = Status::from_stack_byte(self.pull(bus));
                self.pc = self.pull_u16(bus);
                // A restored I=1 blocks IRQs for the very next instruction.
                if self.status.contains(Status::IRQ_DISABLE) {
                    self.prev_irq_inhibit = true;
                }
                0
            }
            Brk => {
                // BRK pushes PC+2 and status with B set, then vectors
                // through $FFFE.
                self.pc = self.pc.wrapping_add(1);
                self.push_u16(bus, self.pc);
                self.push(bus, self.status.to_stack_byte(true));
                self.status.insert(Status::IRQ_DISABLE);
                self.pc = bus.read_u16(vectors::IRQ);
                0
            }

            // Branches
            Bcc => self.branch(bus, !self.status.contains(Status::CARRY)),
            Bcs => self.branch(bus, self.status.contains(Status::CARRY)),
            Bne => self.branch(bus, !self.status.contains(Status::ZERO)),
            Beq => self.branch(bus, self.status.contains(Status::ZERO)),
            Bpl => self.branch(bus, !self.status.contains(Status::NEGATIVE)),
            Bmi => self.branch(bus, self.status.contains(Status::NEGATIVE)),
            Bvc => self.branch(bus, !self.status.contains(Status::OVERFLOW)),
            Bvs => self.branch(bus, self.status.contains(Status::OVERFLOW)),

            // Flag operations
            Clc => {
                self.status.remove(Status::CARRY);
                0
            }
            Sec => {
                self.status.insert(Status::CARRY);
                0
            }
            Cli => {
                self.status.remove(Status::IRQ_DISABLE);
                0
            }
            Sei => {
                self.status.insert(Status::IRQ_DISABLE);
                0
            }
            Clv => {
                self.status.remove(Status::OVERFLOW);
                0
            }
            Cld => {
                self.status.remove(Status::DECIMAL);
                0
            }
            Sed => {
                self.status.insert(Status::DECIMAL);
                0
            }

            // NOPs, official and multi-byte unofficial ones. The operand
            // read still happens so bus traffic matches hardware.
            Nop => match mode {
                AddrMode::Implied => 0,
                _ => {
                    let (_, extra) = load!();
                    extra
                }
            },

            // Unofficial opcodes with stable, well-defined behavior.
            Lax => {
                let (value, extra) = load!();
                self.a = value;
                self.x = value;
                self.set_zn(value);
                extra
            }
            Sax => store!(self.a & self.x),
            Slo => modify!(|cpu: &mut Self, v: u8| {
                let result = cpu.asl_value(v);
                cpu.a |= result;
                cpu.set_zn(cpu.a);
                result
            }),
            Rla => modify!(|cpu: &mut Self, v: u8| {
                let result = cpu.rol_value(v);
                cpu.a &= result;
                cpu.set_zn(cpu.a);
                result
            }),
            Sre => modify!(|cpu: &mut Self, v: u8| {
                let result = cpu.lsr_value(v);
                cpu.a ^= result;
                cpu.set_zn(cpu.a);
                result
            }),
            Rra => modify!(|cpu: &mut Self, v: u8| {
                let result = cpu.ror_value(v);
                cpu.adc(result);
                result
            }),
            Dcp => modify!(|cpu: &mut Self, v: u8| {
                let result = v.wrapping_sub(1);
                cpu.compare(cpu.a, result);
                result
            }),
            Isc => modify!(|cpu: &mut Self, v: u8| {
                let result = v.wrapping_add(1);
                cpu.adc(!result);
                result
            }),
            Anc => {
                let (value, extra) = load!();
                self.a &= value;
                self.set_zn(self.a);
                self.status.set(Status::CARRY, self.a & 0x80 != 0);
                extra
            }
            Alr => {
                let (value, extra) = load!();
                self.a &= value;
                self.a = self.lsr_value(self.a);
                extra
            }
            Arr => {
                let (value, extra) = load!();
                self.a &= value;
                let carry_in = self.status.contains(Status::CARRY);
                self.a = (self.a >> 1) | (u8::from(carry_in) << 7);
                self.set_zn(self.a);
                self.status.set(Status::CARRY, self.a & 0x40 != 0);
                self.status.set(
                    Status::OVERFLOW,
                    ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0,
                );
                extra
            }
            Axs => {
                let (value, extra) = load!();
                let operand = self.a & self.x;
                self.status.set(Status::CARRY, operand >= value);
                self.x = operand.wrapping_sub(value);
                self.set_zn(self.x);
                extra
            }
            Las => {
                let (value, extra) = load!();
                let result = value & self.sp;
                self.a = result;
                self.x = result;
                self.sp = result;
                self.set_zn(result);
                extra
            }
            Xaa => {
                let (value, extra) = load!();
                self.a = (self.a | 0xEE) & self.x & value;
                self.set_zn(self.a);
                extra
            }
            Lxa => {
                let (value, extra) = load!();
                self.a = (self.a | 0xEE) & value;
                self.x = self.a;
                self.set_zn(self.a);
                extra
            }
            Sha => {
                let (addr, _) = self.resolve(bus, mode);
                let value = self.a & self.x & ((addr >> 8) as u8).wrapping_add(1);
                bus.write(addr, value);
                0
            }
            Shx => {
                let (addr, _) = self.resolve(bus, mode);
                let value = self.x & ((addr >> 8) as u8).wrapping_add(1);
                bus.write(addr, value);
                0
            }
            Shy => {
                let (addr, _) = self.resolve(bus, mode);
                let value = self.y & ((addr >> 8) as u8).wrapping_add(1);
                bus.write(addr, value);
                0
            }
            Tas => {
                let (addr, _) = self.resolve(bus, mode);
                self.sp = self.a & self.x;
                let value = self.sp & ((addr >> 8) as u8).wrapping_add(1);
                bus.write(addr, value);
                0
            }
            Jam => {
                log::warn!("JAM opcode ${opcode:02X} at ${:04X}; CPU halted", self.pc.wrapping_sub(1));
                self.jammed = true;
                0
            }
        }
    }

    /// Take a branch if the condition holds. Taken branches cost one extra
    /// cycle, two if the target lands in a different page.
    fn branch(&mut self, bus: &mut impl Bus, condition: bool) -> u8 {
        let offset = self.fetch(bus) as i8;
        if !condition {
            return 0;
        }
        let target = self.pc.wrapping_add(offset as u16);
        let extra = if page_crossed(self.pc, target) { 2 } else { 1 };
        self.pc = target;
        extra
    }

    // ---------------------------------------------------------------------
    // ALU helpers
    // ---------------------------------------------------------------------

    fn adc(&mut self, value: u8) {
        let carry = u16::from(self.status.contains(Status::CARRY));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;
        self.status.set(Status::CARRY, sum > 0xFF);
        self.status.set(
            Status::OVERFLOW,
            (self.a ^ result) & (value ^ result) & 0x80 != 0,
        );
        self.a = result;
        self.set_zn(self.a);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(Status::CARRY, register >= value);
        self.set_zn(register.wrapping_sub(value));
    }

    fn asl_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.set_zn(result);
        result
    }

    fn lsr_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.set_zn(result);
        result
    }

    fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::CARRY));
        self.status.set(Status::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_zn(result);
        result
    }

    fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::CARRY));
        self.status.set(Status::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        self.set_zn(result);
        result
    }

    fn set_zn(&mut self, value: u8) {
        self.status.set(Status::ZERO, value == 0);
        self.status.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    // ---------------------------------------------------------------------
    // Stack
    // ---------------------------------------------------------------------

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    fn pull_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

const fn page_crossed(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}
