//! Cycle-accurate 2C02 PPU emulation.
//!
//! One [`Ppu::step`] call advances one dot of the 341x262 NTSC frame.
//! The background pipeline runs the 8-dot shift-register fetch cycle
//! against the "loopy" scroll registers; the sprite pipeline evaluates
//! OAM per scanline (with the hardware's 8-sprite limit and overflow
//! bug) and muxes the winning sprite pixel against the background.
//!
//! The PPU reaches pattern tables and nametables through [`PpuBus`];
//! palette RAM and OAM live inside the chip. CPU-visible state is
//! exposed through the eight register ports, including the open-bus
//! latch, buffered PPUDATA reads, and VBlank/NMI signalling.

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod timing;

pub use oam::{Oam, SecondaryOam, Sprite};
pub use ppu::{Ppu, PpuBus, StepResult, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::Scroll;
pub use sprites::{evaluate_sprites, EvaluationResult, SpritePixel, SpriteRenderer};
pub use timing::Timing;
