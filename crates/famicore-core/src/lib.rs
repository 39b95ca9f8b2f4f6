//! NES emulation core.
//!
//! Wires the CPU, PPU, APU, and cartridge into a console behind a small
//! host API: load a ROM, run frames, read pixels and audio, feed
//! controller input.
//!
//! ```no_run
//! use famicore_core::{Button, Console};
//!
//! let rom = std::fs::read("game.nes").expect("failed to read ROM");
//! let mut console = Console::new(&rom).expect("failed to load ROM");
//!
//! console.set_button(0, Button::Start, true);
//! console.run_frame();
//!
//! let pixels = console.framebuffer(); // 256x240 RGB
//! let audio = console.take_audio_samples();
//! # let _ = (pixels, audio);
//! ```
//!
//! The simulation is single-threaded and deterministic: the orchestrator
//! in [`Console`] is the only clock, and host input is queued to CPU
//! cycle boundaries. Once construction succeeds, nothing in the frame
//! loop can fail.

mod bus;
mod console;
mod controller;
mod dma;
mod palette;

pub use bus::CpuBus;
pub use console::{timing, Console};
pub use controller::{Button, Controller};
pub use dma::{DmaStep, OamDma};
pub use palette::NES_PALETTE;

use famicore_mappers::RomError;

/// Errors surfaced while constructing a [`Console`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The ROM image failed to parse or uses an unsupported mapper.
    #[error(transparent)]
    Rom(#[from] RomError),
}

/// Convenience constructor matching the host-facing naming.
///
/// # Errors
///
/// See [`Console::new`].
pub fn load_rom(rom_bytes: &[u8]) -> Result<Console, CoreError> {
    Console::new(rom_bytes)
}
