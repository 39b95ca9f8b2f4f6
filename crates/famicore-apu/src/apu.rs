//! APU top level: register file, per-cycle clocking, and the mixer.
//!
//! The APU is clocked once per CPU cycle. The triangle and DMC timers run
//! at that rate; pulse and noise timers run at half of it. Quarter- and
//! half-frame events from the frame counter drive the envelopes, linear
//! counter, length counters, and sweeps.

use crate::dmc::Dmc;
use crate::frame_counter::{FrameCounter, FrameMode};
use crate::noise::Noise;
use crate::pulse::Pulse;
use crate::sweep::PulseChannel;
use crate::triangle::Triangle;

/// Pulse mixer lookup: `95.88 / (8128 / n + 100)` for n = p1 + p2.
#[allow(clippy::cast_precision_loss)]
const PULSE_TABLE: [f32; 31] = {
    let mut table = [0.0f32; 31];
    let mut i = 1;
    while i < 31 {
        table[i] = 95.88 / (8128.0 / (i as f32) + 100.0);
        i += 1;
    }
    table
};

/// 2A03 APU.
#[derive(Debug, Clone)]
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame_counter: FrameCounter,
    /// CPU cycle parity for the half-rate timers and $4017 write delay.
    cycle: u64,
}

impl Apu {
    /// Create an APU with every channel silent and disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pulse1: Pulse::new(PulseChannel::One),
            pulse2: Pulse::new(PulseChannel::Two),
            triangle: Triangle::new(),
            noise: Noise::new(),
            dmc: Dmc::new(),
            frame_counter: FrameCounter::new(),
            cycle: 0,
        }
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Write an APU register ($4000-$4013, $4015, $4017).
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_ctrl(value),
            0x4001 => self.pulse1.write_sweep(value),
            0x4002 => self.pulse1.write_timer_lo(value),
            0x4003 => self.pulse1.write_timer_hi(value),

            0x4004 => self.pulse2.write_ctrl(value),
            0x4005 => self.pulse2.write_sweep(value),
            0x4006 => self.pulse2.write_timer_lo(value),
            0x4007 => self.pulse2.write_timer_hi(value),

            0x4008 => self.triangle.write_linear(value),
            0x400A => self.triangle.write_timer_lo(value),
            0x400B => self.triangle.write_timer_hi(value),

            0x400C => self.noise.write_ctrl(value),
            0x400E => self.noise.write_period(value),
            0x400F => self.noise.write_length(value),

            0x4010 => self.dmc.write_ctrl(value),
            0x4011 => self.dmc.write_direct_load(value),
            0x4012 => self.dmc.write_sample_address(value),
            0x4013 => self.dmc.write_sample_length(value),

            0x4015 => {
                self.pulse1.set_enabled(value & 0x01 != 0);
                self.pulse2.set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }

            0x4017 => {
                let on_odd_cycle = self.cycle & 1 != 0;
                self.frame_counter.write(value, on_odd_cycle);
            }

            _ => {
                log::debug!("write to unmapped APU register ${addr:04X}");
            }
        }
    }

    /// Read $4015: channel activity, frame IRQ (cleared by the read),
    /// DMC IRQ.
    pub fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.frame_counter.clear_irq();
        status
    }

    /// $4015 without the IRQ-clearing side effect.
    #[must_use]
    pub fn peek_status(&self) -> u8 {
        let mut status = 0u8;
        if self.pulse1.active() {
            status |= 0x01;
        }
        if self.pulse2.active() {
            status |= 0x02;
        }
        if self.triangle.active() {
            status |= 0x04;
        }
        if self.noise.active() {
            status |= 0x08;
        }
        if self.dmc.active() {
            status |= 0x10;
        }
        if self.frame_counter.irq_pending() {
            status |= 0x40;
        }
        if self.dmc.irq_pending() {
            status |= 0x80;
        }
        status
    }

    /// Clock the APU one CPU cycle.
    pub fn clock(&mut self) {
        // Triangle and DMC timers run at CPU rate.
        self.triangle.clock_timer();
        self.dmc.clock_timer();

        // Pulse and noise timers run at half rate.
        if self.cycle & 1 == 1 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }

        let clocks = self.frame_counter.clock();
        if clocks.quarter {
            self.pulse1.clock_envelope();
            self.pulse2.clock_envelope();
            self.triangle.clock_linear_counter();
            self.noise.clock_envelope();
        }
        if clocks.half {
            self.pulse1.clock_half_frame();
            self.pulse2.clock_half_frame();
            self.triangle.clock_length();
            self.noise.clock_length();
        }

        self.cycle = self.cycle.wrapping_add(1);
    }

    /// Pending DMC DMA fetch address, if any.
    #[must_use]
    pub fn dmc_dma_request(&self) -> Option<u16> {
        self.dmc.dma_request()
    }

    /// Deliver a DMA-fetched byte to the DMC.
    pub fn dmc_load_sample(&mut self, value: u8) {
        self.dmc.load_sample(value);
    }

    /// Aggregated IRQ line: frame IRQ (already gated by the inhibit
    /// flag) or DMC IRQ.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// Mixed output sample in [0, 1].
    ///
    /// Pulse pair through the 31-entry lookup table; triangle, noise,
    /// and DMC through the exact non-linear formula
    /// `159.79 / (1 / (t/8227 + n/12241 + d/22638) + 100)`.
    #[must_use]
    pub fn output(&self) -> f32 {
        let pulse_sum = usize::from(self.pulse1.output()) + usize::from(self.pulse2.output());
        let pulse_out = PULSE_TABLE[pulse_sum];

        let triangle = f32::from(self.triangle.output());
        let noise = f32::from(self.noise.output());
        let dmc = f32::from(self.dmc.output());

        let tnd_sum = triangle / 8227.0 + noise / 12241.0 + dmc / 22638.0;
        let tnd_out = if tnd_sum > 0.0 {
            159.79 / (1.0 / tnd_sum + 100.0)
        } else {
            0.0
        };

        pulse_out + tnd_out
    }

    /// Frame counter mode, exposed for tests and debugging.
    #[must_use]
    pub fn frame_mode(&self) -> FrameMode {
        self.frame_counter.mode()
    }

    /// CPU cycles clocked so far.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Noise LFSR value, exposed for invariant checks.
    #[must_use]
    pub fn noise_lfsr(&self) -> u16 {
        self.noise.lfsr()
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_starts_clear() {
        let mut apu = Apu::new();
        assert_eq!(apu.read_status(), 0);
    }

    #[test]
    fn length_load_reflects_in_status() {
        let mut apu = Apu::new();
        apu.write(0x4015, 0x0F);
        apu.write(0x4003, 0x08);
        apu.write(0x4007, 0x08);
        apu.write(0x400B, 0x08);
        apu.write(0x400F, 0x08);

        assert_eq!(apu.read_status() & 0x0F, 0x0F);
    }

    #[test]
    fn disable_clears_length_immediately() {
        let mut apu = Apu::new();
        apu.write(0x4015, 0x01);
        apu.write(0x4003, 0x08);
        assert_eq!(apu.read_status() & 0x01, 0x01);

        apu.write(0x4015, 0x00);
        assert_eq!(apu.read_status() & 0x01, 0x00);
    }

    #[test]
    fn length_load_while_disabled_is_ignored() {
        let mut apu = Apu::new();
        apu.write(0x4003, 0x08);
        assert_eq!(apu.read_status() & 0x01, 0x00);
    }

    #[test]
    fn frame_irq_sets_bit6_and_read_clears_it() {
        let mut apu = Apu::new();
        for _ in 0..29829 {
            apu.clock();
        }
        assert_eq!(apu.read_status() & 0x40, 0x40);
        assert_eq!(apu.read_status() & 0x40, 0x00);
    }

    #[test]
    fn five_step_mode_produces_no_irq() {
        let mut apu = Apu::new();
        apu.write(0x4017, 0x80);
        for _ in 0..80000 {
            apu.clock();
        }
        assert_eq!(apu.peek_status() & 0x40, 0);
        assert_eq!(apu.frame_mode(), FrameMode::FiveStep);
    }

    #[test]
    fn dmc_dma_handshake() {
        let mut apu = Apu::new();
        apu.write(0x4012, 0x00);
        apu.write(0x4013, 0x00); // 1-byte sample
        apu.write(0x4015, 0x10);

        let addr = apu.dmc_dma_request().expect("DMC should want a byte");
        assert_eq!(addr, 0xC000);

        apu.dmc_load_sample(0xFF);
        assert!(apu.dmc_dma_request().is_none());
        assert_eq!(apu.peek_status() & 0x10, 0); // sample exhausted
    }

    #[test]
    fn mixer_silence_is_zero() {
        let apu = Apu::new();
        assert!(apu.output().abs() < f32::EPSILON);
    }

    #[test]
    fn mixer_output_stays_normalized() {
        let mut apu = Apu::new();
        // Crank everything audible and sweep a few thousand cycles.
        apu.write(0x4015, 0x1F);
        apu.write(0x4000, 0x7F);
        apu.write(0x4002, 0x40);
        apu.write(0x4003, 0x08);
        apu.write(0x4004, 0x7F);
        apu.write(0x4006, 0x40);
        apu.write(0x4007, 0x08);
        apu.write(0x4008, 0xFF);
        apu.write(0x400A, 0x40);
        apu.write(0x400B, 0x08);
        apu.write(0x400C, 0x3F);
        apu.write(0x400F, 0x08);
        apu.write(0x4011, 0x7F);

        for _ in 0..10_000 {
            apu.clock();
            let sample = apu.output();
            assert!((0.0..=1.0).contains(&sample), "sample {sample} out of range");
        }
    }

    #[test]
    fn pulse_table_matches_formula() {
        for n in 1..31usize {
            #[allow(clippy::cast_precision_loss)]
            let expected = 95.88 / (8128.0 / (n as f32) + 100.0);
            assert!((PULSE_TABLE[n] - expected).abs() < 1e-6);
        }
        assert_eq!(PULSE_TABLE[0], 0.0);
    }
}
