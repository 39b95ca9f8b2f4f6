//! Property tests for APU invariants.

use famicore_apu::{Apu, Dmc, LengthCounter};
use proptest::prelude::*;

proptest! {
    /// The noise LFSR never reaches the stuck all-zero state, whatever
    /// registers are written.
    #[test]
    fn lfsr_never_zero(writes in proptest::collection::vec((0x4000u16..=0x4017, any::<u8>()), 0..64)) {
        let mut apu = Apu::new();
        for (addr, value) in writes {
            apu.write(addr, value);
        }
        for _ in 0..10_000 {
            apu.clock();
            prop_assert_ne!(apu.noise_lfsr(), 0);
        }
    }

    /// Mixer output stays within [0, 1] under arbitrary register abuse.
    #[test]
    fn mixer_output_bounded(writes in proptest::collection::vec((0x4000u16..=0x4017, any::<u8>()), 0..64)) {
        let mut apu = Apu::new();
        for (addr, value) in writes {
            apu.write(addr, value);
        }
        for _ in 0..2_000 {
            apu.clock();
            let sample = apu.output();
            prop_assert!((0.0..=1.0).contains(&sample));
        }
    }

    /// The DMC's 7-bit output level never leaves [0, 127], whatever its
    /// registers hold and whatever sample bytes the reader delivers.
    #[test]
    fn dmc_output_level_bounded(
        writes in proptest::collection::vec((0u8..4, any::<u8>()), 0..32),
        samples in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut dmc = Dmc::new();
        for (register, value) in writes {
            match register {
                0 => dmc.write_ctrl(value),
                1 => dmc.write_direct_load(value),
                2 => dmc.write_sample_address(value),
                _ => dmc.write_sample_length(value),
            }
        }
        dmc.set_enabled(true);

        let mut feed = samples.iter().cycle();
        for _ in 0..20_000 {
            if dmc.dma_request().is_some() {
                dmc.load_sample(*feed.next().unwrap());
            }
            dmc.clock_timer();
            prop_assert!(dmc.output() <= 127);
        }
    }

    /// Length counters stay within [0, 254] under any sequence of
    /// loads, halts, enables, and clocks; an expired counter never
    /// decrements further.
    #[test]
    fn length_counter_bounded(ops in proptest::collection::vec((0u8..4, any::<u8>()), 0..128)) {
        let mut counter = LengthCounter::new();
        for (op, value) in ops {
            match op {
                0 => counter.load(value),
                1 => counter.set_halt(value & 1 != 0),
                2 => counter.set_enabled(value & 1 != 0),
                _ => counter.clock(),
            }
            prop_assert!(counter.value() <= 254);
        }

        counter.set_enabled(false); // forces the counter to zero
        counter.set_halt(false);
        counter.clock();
        prop_assert_eq!(counter.value(), 0);
    }
}
