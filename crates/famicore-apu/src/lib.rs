//! 2A03 APU emulation.
//!
//! Five synthesis channels (two pulses, triangle, noise, DMC) built from
//! shared sub-units (envelope, sweep, length counter, divider), a frame
//! counter sequencing their low-frequency clocks, and the console's
//! non-linear mixer.
//!
//! The APU is clocked once per CPU cycle via [`Apu::clock`]. DMC sample
//! fetches are surfaced as DMA requests ([`Apu::dmc_dma_request`]) so the
//! orchestrator performs the actual bus read and charges the CPU stall.

mod apu;
mod divider;
mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod noise;
mod pulse;
mod sweep;
mod triangle;

pub use apu::Apu;
pub use divider::Divider;
pub use dmc::Dmc;
pub use envelope::Envelope;
pub use frame_counter::{FrameClocks, FrameCounter, FrameMode};
pub use length_counter::{LengthCounter, LENGTH_TABLE};
pub use noise::Noise;
pub use pulse::Pulse;
pub use sweep::{PulseChannel, Sweep};
pub use triangle::Triangle;
