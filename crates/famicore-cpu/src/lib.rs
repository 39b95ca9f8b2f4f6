//! Cycle-accurate 6502 CPU core for NES emulation.
//!
//! The 2A03's CPU is a MOS 6502 with decimal mode removed. This crate
//! provides:
//!
//! - All 256 opcodes, official and unofficial, via a table-driven decoder
//! - Cycle accounting including page-cross and branch penalties
//! - NMI/IRQ/BRK handling with correct stack and vector behavior
//! - DMA stall support for OAM and DMC transfers
//! - A nestest-format trace writer for validation against golden logs
//!
//! # Architecture
//!
//! Memory access goes through the [`Bus`] trait so the CPU can be wired
//! to any memory subsystem.
//!
//! # Example
//!
//! ```
//! use famicore_cpu::{Bus, Cpu};
//!
//! struct FlatBus {
//!     memory: [u8; 65536],
//! }
//!
//! impl Bus for FlatBus {
//!     fn read(&mut self, addr: u16) -> u8 {
//!         self.memory[addr as usize]
//!     }
//!
//!     fn write(&mut self, addr: u16, value: u8) {
//!         self.memory[addr as usize] = value;
//!     }
//! }
//!
//! let mut bus = FlatBus { memory: [0; 65536] };
//! bus.memory[0xFFFC] = 0x00;
//! bus.memory[0xFFFD] = 0x80;
//!
//! let mut cpu = Cpu::new();
//! cpu.reset(&mut bus);
//! assert_eq!(cpu.pc, 0x8000);
//! ```

mod addressing;
mod cpu;
mod opcodes;
mod status;
mod trace;

pub use addressing::AddrMode;
pub use cpu::{Bus, Cpu};
pub use opcodes::{Mnemonic, Opcode, OPCODE_TABLE};
pub use status::Status;
pub use trace::trace_line;

/// Interrupt vector addresses.
pub mod vectors {
    /// NMI vector.
    pub const NMI: u16 = 0xFFFA;
    /// Reset vector.
    pub const RESET: u16 = 0xFFFC;
    /// IRQ/BRK vector.
    pub const IRQ: u16 = 0xFFFE;
}
