//! Property tests for PPU invariants.

use famicore_ppu::{Ppu, PpuBus, Timing};
use proptest::prelude::*;

struct FlatBus {
    memory: Vec<u8>,
}

impl FlatBus {
    fn new() -> Self {
        Self { memory: vec![0; 0x4000] }
    }
}

impl PpuBus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[(addr as usize) & 0x3FFF]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.memory[(addr as usize) & 0x3FFF] = value;
    }
}

proptest! {
    /// v and t stay within 15 bits and the dot/scanline counters stay in
    /// range, no matter what the CPU writes at the ports.
    #[test]
    fn registers_stay_in_range(
        writes in proptest::collection::vec((0u16..8, any::<u8>()), 0..64),
    ) {
        let mut ppu = Ppu::new();
        let mut bus = FlatBus::new();

        for (port, value) in writes {
            ppu.write_register(0x2000 | port, value, &mut bus);
            prop_assert!(ppu.vram_addr() < 0x8000);
            prop_assert!(ppu.temp_vram_addr() < 0x8000);
            prop_assert!(ppu.fine_x() < 8);
        }

        for _ in 0..2000 {
            ppu.step(&mut bus);
            prop_assert!(ppu.scanline() < Timing::SCANLINES);
            prop_assert!(ppu.dot() < Timing::DOTS);
        }
    }

    /// The frame buffer only ever holds 6-bit color indices.
    #[test]
    fn frame_buffer_holds_valid_colors(mask in any::<u8>()) {
        let mut ppu = Ppu::new();
        let mut bus = FlatBus::new();
        ppu.write_register(0x2001, mask, &mut bus);

        while !ppu.step(&mut bus).frame_complete {}
        for &color in ppu.frame_buffer() {
            prop_assert!(color < 64);
        }
    }
}
