//! CPU-side system bus.
//!
//! Address decode for the 2A03's memory map:
//!
//! ```text
//! $0000-$1FFF  2 KiB internal RAM, mirrored (mask $07FF)
//! $2000-$3FFF  PPU register ports, mirrored every 8 bytes (mask $0007)
//! $4000-$4013  APU channel registers
//! $4014        OAM DMA trigger
//! $4015        APU status
//! $4016        Controller 1 (read) / strobe (write)
//! $4017        Controller 2 (read) / APU frame counter (write)
//! $4020-$FFFF  Cartridge
//! ```
//!
//! Every transfer updates the open-bus latch; reads of unmapped or
//! write-only addresses return it, writes there are dropped.

use famicore_apu::Apu;
use famicore_cpu::Bus;
use famicore_mappers::{Mapper, Mirroring};
use famicore_ppu::{Ppu, PpuBus, StepResult};

use crate::controller::Controller;

/// Nametable address space seen by the PPU, backed by the console's
/// 2 KiB of RAM (CIRAM) with cartridge-selected mirroring, or by the
/// cartridge's own RAM on four-screen boards.
struct PpuMemory<'a> {
    mapper: &'a mut dyn Mapper,
    ciram: &'a mut [u8; 2048],
}

/// Where a nametable address lands.
enum NametableSlot {
    Ciram(usize),
    Cartridge(u16),
}

impl PpuMemory<'_> {
    /// Apply mirroring to a $2000-$2FFF address.
    fn nametable_slot(&self, addr: u16) -> NametableSlot {
        let addr = addr & 0x0FFF;
        let offset = (addr & 0x03FF) as usize;

        match self.mapper.mirroring() {
            Mirroring::Horizontal => {
                // A11 selects the CIRAM bank; $2000/$2400 alias.
                let bank = usize::from(addr >> 11 & 1);
                NametableSlot::Ciram(bank * 0x400 + offset)
            }
            Mirroring::Vertical => {
                // A10 selects the bank; $2000/$2800 alias.
                let bank = usize::from(addr >> 10 & 1);
                NametableSlot::Ciram(bank * 0x400 + offset)
            }
            Mirroring::SingleScreenLower => NametableSlot::Ciram(offset),
            Mirroring::SingleScreenUpper => NametableSlot::Ciram(0x400 + offset),
            Mirroring::FourScreen => {
                // CIRAM covers the first two tables, cartridge RAM the
                // rest.
                if addr < 0x0800 {
                    NametableSlot::Ciram(addr as usize)
                } else {
                    NametableSlot::Cartridge(addr & 0x07FF)
                }
            }
        }
    }
}

impl PpuBus for PpuMemory<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.mapper.read_chr(addr),
            0x2000..=0x3EFF => match self.nametable_slot(addr) {
                NametableSlot::Ciram(index) => self.ciram[index],
                NametableSlot::Cartridge(offset) => self.mapper.read_aux_nametable(offset),
            },
            // $3F00-$3FFF arrives only as the PPUDATA buffer refill,
            // which mirrors the nametable underneath.
            0x3F00..=0x3FFF => match self.nametable_slot(addr - 0x1000) {
                NametableSlot::Ciram(index) => self.ciram[index],
                NametableSlot::Cartridge(offset) => self.mapper.read_aux_nametable(offset),
            },
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.mapper.write_chr(addr, value),
            0x2000..=0x3EFF => match self.nametable_slot(addr) {
                NametableSlot::Ciram(index) => self.ciram[index] = value,
                NametableSlot::Cartridge(offset) => {
                    self.mapper.write_aux_nametable(offset, value);
                }
            },
            _ => {}
        }
    }
}

/// The system bus and the devices hanging off it.
pub struct CpuBus {
    /// 2 KiB internal RAM.
    pub ram: [u8; 2048],
    /// 2 KiB nametable RAM (CIRAM).
    pub ciram: [u8; 2048],
    /// Picture processing unit.
    pub ppu: Ppu,
    /// Audio processing unit.
    pub apu: Apu,
    /// Cartridge mapper.
    pub mapper: Box<dyn Mapper>,
    /// Controller port 1.
    pub controller1: Controller,
    /// Controller port 2.
    pub controller2: Controller,
    /// Open-bus latch: the last byte transferred.
    open_bus: u8,
    /// Page written to $4014, until the orchestrator picks it up.
    oam_dma_request: Option<u8>,
}

impl CpuBus {
    /// Assemble the bus around a mapper.
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        Self {
            ram: [0; 2048],
            ciram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(),
            mapper,
            controller1: Controller::new(),
            controller2: Controller::new(),
            open_bus: 0,
            oam_dma_request: None,
        }
    }

    /// Reset RAM and the attached devices.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ciram.fill(0);
        self.ppu.reset();
        self.apu.reset();
        self.mapper.reset();
        self.controller1 = Controller::new();
        self.controller2 = Controller::new();
        self.open_bus = 0;
        self.oam_dma_request = None;
    }

    /// Advance the PPU one dot.
    pub fn step_ppu_dot(&mut self) -> StepResult {
        let mut memory = PpuMemory {
            mapper: self.mapper.as_mut(),
            ciram: &mut self.ciram,
        };
        self.ppu.step(&mut memory)
    }

    /// Take a pending $4014 write, if any.
    pub fn take_oam_dma_request(&mut self) -> Option<u8> {
        self.oam_dma_request.take()
    }

    /// The open-bus latch value.
    #[must_use]
    pub fn open_bus(&self) -> u8 {
        self.open_bus
    }

    /// Read without side effects, for tracing and debugging. PPU and
    /// controller ports return the latch instead of disturbing state.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.open_bus,
            0x4015 => self.apu.peek_status(),
            0x4000..=0x401F => self.open_bus,
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        }
    }
}

impl Bus for CpuBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            0x2000..=0x3FFF => {
                let mut memory = PpuMemory {
                    mapper: self.mapper.as_mut(),
                    ciram: &mut self.ciram,
                };
                self.ppu.read_register(addr & 0x0007, &mut memory)
            }

            0x4015 => self.apu.read_status(),
            0x4016 => self.controller1.read() | (self.open_bus & 0xE0),
            0x4017 => self.controller2.read() | (self.open_bus & 0xE0),

            // Write-only APU/IO registers read as open bus.
            0x4000..=0x401F => self.open_bus,

            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        };

        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;

        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,

            0x2000..=0x3FFF => {
                let mut memory = PpuMemory {
                    mapper: self.mapper.as_mut(),
                    ciram: &mut self.ciram,
                };
                self.ppu.write_register(addr & 0x0007, value, &mut memory);
            }

            0x4014 => self.oam_dma_request = Some(value),
            0x4016 => {
                self.controller1.write_strobe(value);
                self.controller2.write_strobe(value);
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),
            0x4018..=0x401F => {}

            0x4020..=0xFFFF => self.mapper.write_prg(addr, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use famicore_mappers::{Nrom, Rom, RomHeader};

    fn test_bus(mirroring: Mirroring) -> CpuBus {
        let rom = Rom {
            header: RomHeader {
                prg_rom_size: 32 * 1024,
                chr_rom_size: 0,
                mapper_number: 0,
                mirroring,
                has_battery: false,
                has_trainer: false,
                nes2: false,
            },
            trainer: None,
            prg_rom: vec![0; 32 * 1024],
            chr_rom: Vec::new(),
        };
        CpuBus::new(Box::new(Nrom::new(&rom).unwrap()))
    }

    #[test]
    fn ram_is_mirrored_four_times() {
        let mut bus = test_bus(Mirroring::Horizontal);
        bus.write(0x0000, 0x42);
        assert_eq!(bus.read(0x0800), 0x42);
        assert_eq!(bus.read(0x1000), 0x42);
        assert_eq!(bus.read(0x1800), 0x42);

        bus.write(0x1234, 0xAB);
        assert_eq!(bus.read(0x0234), 0xAB);
    }

    #[test]
    fn open_bus_latch_tracks_transfers() {
        let mut bus = test_bus(Mirroring::Horizontal);
        bus.write(0x0000, 0xAB);
        assert_eq!(bus.open_bus(), 0xAB);
        let _ = bus.read(0x0000);
        assert_eq!(bus.open_bus(), 0xAB);

        // Unmapped/write-only register reads return the latch.
        assert_eq!(bus.read(0x4002), 0xAB);
    }

    #[test]
    fn ppu_ports_mirror_every_eight_bytes() {
        let mut bus = test_bus(Mirroring::Horizontal);
        // $2006/$2007 via a distant mirror.
        bus.write(0x3FF6, 0x21);
        bus.write(0x3FF6, 0x00);
        bus.write(0x3FF7, 0x99);

        bus.write(0x2006, 0x21);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x99);
    }

    #[test]
    fn horizontal_mirroring_pairs_nametables() {
        let mut bus = test_bus(Mirroring::Horizontal);
        // Write to $2000 via PPUDATA, read back via $2400.
        bus.write(0x2006, 0x20);
        bus.write(0x2006, 0x00);
        bus.write(0x2007, 0x5A);

        bus.write(0x2006, 0x24);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x5A);

        // $2800 is the other physical table.
        bus.write(0x2006, 0x28);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x00);
    }

    #[test]
    fn vertical_mirroring_pairs_nametables() {
        let mut bus = test_bus(Mirroring::Vertical);
        bus.write(0x2006, 0x20);
        bus.write(0x2006, 0x00);
        bus.write(0x2007, 0x5A);

        bus.write(0x2006, 0x28);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x5A);

        bus.write(0x2006, 0x24);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x00);
    }

    #[test]
    fn oam_dma_write_is_latched_for_the_orchestrator() {
        let mut bus = test_bus(Mirroring::Horizontal);
        bus.write(0x4014, 0x02);
        assert_eq!(bus.take_oam_dma_request(), Some(0x02));
        assert_eq!(bus.take_oam_dma_request(), None);
    }

    #[test]
    fn controller_reads_compose_open_bus() {
        let mut bus = test_bus(Mirroring::Horizontal);
        bus.controller1.set_button(crate::controller::Button::A, true);
        bus.controller1.apply_pending();

        bus.write(0x4016, 1);
        bus.write(0x4016, 0);

        // The $4016 write leaves $00 on the bus; bit 0 carries the data.
        assert_eq!(bus.read(0x4016) & 1, 1);
    }

    #[test]
    fn chr_ram_reachable_through_ppudata() {
        let mut bus = test_bus(Mirroring::Horizontal);
        bus.write(0x2006, 0x10);
        bus.write(0x2006, 0x00);
        bus.write(0x2007, 0x77);

        bus.write(0x2006, 0x10);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x77);
    }
}
