//! The console orchestrator.
//!
//! [`Console`] owns every component and is the only clock in the system:
//! a master dot counter advances the PPU once per tick and the CPU-side
//! machinery (controllers, OAM DMA, APU, CPU) every third tick. Given the
//! same ROM, inputs, and tick count, output is bit-identical across runs.

use famicore_cpu::{Bus, Cpu};
use famicore_mappers::{create_mapper, Rom};
use famicore_ppu::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::bus::CpuBus;
use crate::controller::{Button, Controller};
use crate::dma::{DmaStep, OamDma};
use crate::palette::NES_PALETTE;
use crate::CoreError;

/// NTSC timing constants.
pub mod timing {
    /// Master (PPU dot) clocks per CPU cycle.
    pub const DOTS_PER_CPU_CYCLE: u64 = 3;
    /// CPU cycles per frame, approximate (89342 dots / 3).
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_781;
    /// CPU clock rate.
    pub const CPU_HZ: f64 = 1_789_773.0;
    /// Host audio sample rate targeted by the downsampler.
    pub const SAMPLE_RATE: u32 = 44_100;
    /// CPU cycles averaged into one output sample.
    pub const CYCLES_PER_SAMPLE: u32 = 40;
}

/// DMC DMA steals about four CPU cycles per fetched byte.
const DMC_STALL_CYCLES: u32 = 4;

/// A complete emulated NES.
pub struct Console {
    cpu: Cpu,
    bus: CpuBus,
    oam_dma: OamDma,
    /// Master dot counter; the CPU runs on every third dot.
    master_dot: u64,
    /// CPU cycles executed (for DMA alignment parity).
    cpu_cycles: u64,
    /// RGB framebuffer, refreshed at each frame boundary.
    framebuffer: Vec<u8>,
    /// Audio accumulated since the last take.
    audio: Vec<f32>,
    sample_sum: f32,
    sample_count: u32,
    frame_count: u64,
}

impl Console {
    /// Build a console from iNES ROM bytes and run the reset sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] when the image fails to parse or names an
    /// unsupported mapper.
    pub fn new(rom_bytes: &[u8]) -> Result<Self, CoreError> {
        let rom = Rom::load(rom_bytes)?;
        let mapper = create_mapper(&rom)?;
        log::debug!(
            "loaded {}: {} KiB PRG, {} KiB CHR",
            mapper.mapper_name(),
            rom.prg_rom.len() / 1024,
            rom.chr_rom.len() / 1024
        );

        let mut bus = CpuBus::new(mapper);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        Ok(Self {
            cpu,
            bus,
            oam_dma: OamDma::new(),
            master_dot: 0,
            cpu_cycles: 0,
            framebuffer: vec![0; FRAME_WIDTH * FRAME_HEIGHT * 3],
            audio: Vec::with_capacity(1024),
            sample_sum: 0.0,
            sample_count: 0,
            frame_count: 0,
        })
    }

    /// Reset the machine: devices to power-on state, CPU through the
    /// reset vector.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.oam_dma = OamDma::new();
        self.master_dot = 0;
        self.cpu_cycles = 0;
        self.audio.clear();
        self.sample_sum = 0.0;
        self.sample_count = 0;
    }

    /// Run until the PPU completes the current frame, then latch the
    /// framebuffer. Audio accumulates until taken.
    pub fn run_frame(&mut self) {
        while !self.tick_master() {}
        self.latch_framebuffer();
        self.frame_count += 1;
    }

    /// One master tick: one PPU dot, plus one CPU cycle every third
    /// tick. Returns true at the frame boundary.
    pub fn tick_master(&mut self) -> bool {
        self.master_dot += 1;

        let ppu_result = self.bus.step_ppu_dot();
        if ppu_result.nmi {
            self.cpu.trigger_nmi();
        }

        if self.master_dot % timing::DOTS_PER_CPU_CYCLE == 0 {
            self.cpu_cycle();
        }

        ppu_result.frame_complete
    }

    /// One CPU-side cycle: input commit, DMA arbitration, APU clocking,
    /// IRQ routing, then the CPU itself (unless a DMA owns the cycle).
    fn cpu_cycle(&mut self) {
        self.bus.controller1.apply_pending();
        self.bus.controller2.apply_pending();

        if let Some(page) = self.bus.take_oam_dma_request() {
            let on_odd_cycle = self.cpu_cycles & 1 == 1;
            self.oam_dma.start(page, on_odd_cycle);
        }

        self.bus.apu.clock();

        // DMC memory reader: the read goes through the CPU bus and the
        // stall is charged to the CPU.
        if let Some(addr) = self.bus.apu.dmc_dma_request() {
            let value = self.bus.read(addr);
            self.bus.apu.dmc_load_sample(value);
            self.cpu.add_stall(DMC_STALL_CYCLES);
        }

        self.cpu
            .set_irq(self.bus.apu.irq_pending() || self.bus.mapper.irq_pending());

        if self.oam_dma.active() {
            match self.oam_dma.tick() {
                DmaStep::Wait => {}
                DmaStep::Read(addr) => {
                    let value = self.bus.read(addr);
                    self.oam_dma.set_latch(value);
                }
                DmaStep::Write(value) => self.bus.ppu.write_oam_byte(value),
            }
        } else {
            self.cpu.tick(&mut self.bus);
        }

        self.cpu_cycles += 1;
        self.accumulate_audio();
    }

    /// Average the APU output down to the host sample rate.
    fn accumulate_audio(&mut self) {
        self.sample_sum += self.bus.apu.output();
        self.sample_count += 1;
        if self.sample_count >= timing::CYCLES_PER_SAMPLE {
            #[allow(clippy::cast_precision_loss)]
            let sample = self.sample_sum / self.sample_count as f32;
            self.audio.push(sample);
            self.sample_sum = 0.0;
            self.sample_count = 0;
        }
    }

    /// Convert the PPU's color indices to RGB.
    fn latch_framebuffer(&mut self) {
        for (i, &index) in self.bus.ppu.frame_buffer().iter().enumerate() {
            let (r, g, b) = NES_PALETTE[usize::from(index) & 0x3F];
            let offset = i * 3;
            self.framebuffer[offset] = r;
            self.framebuffer[offset + 1] = g;
            self.framebuffer[offset + 2] = b;
        }
    }

    /// The last completed frame as 256x240 RGB triples.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Drain the audio accumulated since the last call.
    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.audio)
    }

    /// Stage a button change; it lands at the next CPU cycle boundary.
    pub fn set_button(&mut self, port: usize, button: Button, pressed: bool) {
        let controller = match port {
            0 => &mut self.bus.controller1,
            _ => &mut self.bus.controller2,
        };
        controller.set_button(button, pressed);
    }

    /// Frames completed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total CPU cycles executed.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// CPU access for tests and debuggers.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable CPU access (e.g. forcing PC for a test harness).
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Split borrow of CPU and bus, for harnesses that drive the CPU
    /// directly (nestest-style validation).
    pub fn cpu_and_bus_mut(&mut self) -> (&mut Cpu, &mut CpuBus) {
        (&mut self.cpu, &mut self.bus)
    }

    /// Bus access for tests and debuggers.
    #[must_use]
    pub fn bus(&self) -> &CpuBus {
        &self.bus
    }

    /// Mutable bus access.
    pub fn bus_mut(&mut self) -> &mut CpuBus {
        &mut self.bus
    }

    /// Controller access (testing).
    #[must_use]
    pub fn controller(&self, port: usize) -> &Controller {
        match port {
            0 => &self.bus.controller1,
            _ => &self.bus.controller2,
        }
    }

    /// Read memory without side effects.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }
}
