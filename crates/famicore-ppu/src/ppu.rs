//! 2C02 PPU top level.
//!
//! Owns the register file, OAM, palette RAM, and the background and
//! sprite pipelines. Pattern tables and nametables are reached through
//! the [`PpuBus`] trait, which the console implements over the cartridge
//! and its 2 KiB of nametable RAM.
//!
//! One [`Ppu::step`] call is one dot. The caller runs three dots per CPU
//! cycle and routes the returned NMI edge to the CPU.

use crate::background::Background;
use crate::oam::{Oam, SecondaryOam, Sprite};
use crate::registers::{PpuCtrl, PpuMask, PpuStatus};
use crate::scroll::Scroll;
use crate::sprites::{evaluate_sprites, SpriteRenderer};
use crate::timing::Timing;

/// Frame width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Frame height in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Pixels per frame.
pub const FRAME_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// The PPU's own address bus: pattern tables ($0000-$1FFF, cartridge
/// CHR) and nametables ($2000-$3EFF, console RAM with cartridge-chosen
/// mirroring). Palette RAM is internal to the PPU and never reaches this
/// bus.
pub trait PpuBus {
    /// Read one byte of pattern or nametable memory.
    fn read(&mut self, addr: u16) -> u8;

    /// Write one byte of pattern (CHR-RAM) or nametable memory.
    fn write(&mut self, addr: u16, value: u8);
}

/// What one dot produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepResult {
    /// The frame ended on this dot.
    pub frame_complete: bool,
    /// An NMI edge fired on this dot (VBlank began with NMI enabled, or
    /// NMI was enabled mid-VBlank).
    pub nmi: bool,
}

/// Picture processing unit.
pub struct Ppu {
    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    scroll: Scroll,
    timing: Timing,

    background: Background,
    oam: Oam,
    secondary_oam: SecondaryOam,
    sprite_renderer: SpriteRenderer,
    /// Sprite 0 was selected for the line currently being drawn.
    sprite_zero_on_line: bool,

    /// 32 bytes of palette RAM, with the $3F1x mirrors applied on
    /// access.
    palette: [u8; 32],
    /// PPUDATA read buffer.
    read_buffer: u8,
    /// Last value driven on the register bus.
    open_bus: u8,
    nmi_pending: bool,

    /// Output: one 6-bit color index per pixel.
    frame: Vec<u8>,
}

impl Ppu {
    /// Power-on PPU.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            scroll: Scroll::new(),
            timing: Timing::new(),
            background: Background::new(),
            oam: Oam::new(),
            secondary_oam: SecondaryOam::new(),
            sprite_renderer: SpriteRenderer::new(),
            sprite_zero_on_line: false,
            palette: [0; 32],
            read_buffer: 0,
            open_bus: 0,
            nmi_pending: false,
            frame: vec![0; FRAME_SIZE],
        }
    }

    /// Reset to power-on state. The frame buffer is kept; it will be
    /// overwritten as rendering resumes.
    pub fn reset(&mut self) {
        self.ctrl = PpuCtrl::empty();
        self.mask = PpuMask::empty();
        self.status = PpuStatus::empty();
        self.scroll = Scroll::new();
        self.timing = Timing::new();
        self.background = Background::new();
        self.secondary_oam.clear();
        self.sprite_renderer.clear();
        self.sprite_zero_on_line = false;
        self.read_buffer = 0;
        self.open_bus = 0;
        self.nmi_pending = false;
    }

    // ---------------------------------------------------------------------
    // CPU-visible register ports ($2000-$2007, mirrored through $3FFF)
    // ---------------------------------------------------------------------

    /// Read a register port.
    pub fn read_register(&mut self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        match addr & 0x07 {
            // Write-only ports read back the open-bus latch.
            0 | 1 | 3 | 5 | 6 => self.open_bus,

            2 => {
                // Only bits 7-5 are driven; 4-0 come from the latch.
                let value = (self.status.bits() & 0xE0) | (self.open_bus & 0x1F);

                // Reading on the exact VBlank-set dot suppresses the NMI
                // for this frame.
                if self.timing.at_vblank_set() {
                    self.nmi_pending = false;
                }

                self.status.remove(PpuStatus::VBLANK);
                self.scroll.reset_toggle();
                self.open_bus = value;
                value
            }

            4 => {
                let value = self.oam.read();
                self.open_bus = value;
                value
            }

            7 => {
                let vaddr = self.scroll.vram_addr() & 0x3FFF;

                let value = if vaddr >= 0x3F00 {
                    // Palette reads bypass the buffer; the buffer still
                    // refills from the nametable underneath.
                    let value = (self.palette_read(vaddr) & 0x3F) | (self.open_bus & 0xC0);
                    self.read_buffer = bus.read(vaddr - 0x1000);
                    value
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = bus.read(vaddr);
                    buffered
                };

                self.increment_vram_addr();
                self.open_bus = value;
                value
            }

            _ => unreachable!(),
        }
    }

    /// Write a register port.
    pub fn write_register(&mut self, addr: u16, value: u8, bus: &mut impl PpuBus) {
        self.open_bus = value;

        match addr & 0x07 {
            0 => {
                let nmi_was_enabled = self.ctrl.nmi_enabled();
                self.ctrl = PpuCtrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);

                // Enabling NMI mid-VBlank fires one immediately.
                if !nmi_was_enabled
                    && self.ctrl.nmi_enabled()
                    && self.status.contains(PpuStatus::VBLANK)
                {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = PpuMask::from_bits_truncate(value),
            2 => {}
            3 => self.oam.set_addr(value),
            4 => self.oam.write(value),
            5 => self.scroll.write_scroll(value),
            6 => self.scroll.write_addr(value),
            7 => {
                let vaddr = self.scroll.vram_addr() & 0x3FFF;
                if vaddr >= 0x3F00 {
                    self.palette_write(vaddr, value);
                } else {
                    bus.write(vaddr, value);
                }
                self.increment_vram_addr();
            }
            _ => unreachable!(),
        }
    }

    /// OAM DMA deposit: one byte at the current OAMADDR.
    pub fn write_oam_byte(&mut self, value: u8) {
        self.oam.dma_write(value);
    }

    /// PPUDATA access increments `v` by 1 or 32, except while rendering,
    /// where the hardware reuses the scroll increment datapath.
    fn increment_vram_addr(&mut self) {
        if self.mask.rendering_enabled() && self.timing.on_rendering_scanline() {
            self.scroll.increment_x();
            self.scroll.increment_y();
        } else {
            self.scroll.increment_vram(self.ctrl.vram_increment());
        }
    }

    // ---------------------------------------------------------------------
    // Palette RAM
    // ---------------------------------------------------------------------

    /// Palette index with the $3F10/$14/$18/$1C mirrors folded in.
    fn palette_index(addr: u16) -> usize {
        let mut index = (addr & 0x1F) as usize;
        if index & 0x13 == 0x10 {
            index &= !0x10;
        }
        index
    }

    fn palette_read(&self, addr: u16) -> u8 {
        self.palette[Self::palette_index(addr)]
    }

    fn palette_write(&mut self, addr: u16, value: u8) {
        self.palette[Self::palette_index(addr)] = value & 0x3F;
    }

    // ---------------------------------------------------------------------
    // Dot pipeline
    // ---------------------------------------------------------------------

    /// Advance one dot.
    pub fn step(&mut self, bus: &mut impl PpuBus) -> StepResult {
        let rendering = self.mask.rendering_enabled();
        let frame_complete = self.timing.tick(rendering);

        if self.timing.at_vblank_set() {
            self.status.insert(PpuStatus::VBLANK);
            if self.ctrl.nmi_enabled() {
                self.nmi_pending = true;
            }
        }
        if self.timing.at_vblank_clear() {
            self.status
                .remove(PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW);
            self.nmi_pending = false;
        }

        if rendering && self.timing.on_rendering_scanline() {
            self.run_background_pipeline(bus);
            self.run_sprite_pipeline(bus);
        }

        if rendering && self.timing.on_visible_scanline() && self.timing.on_visible_dot() {
            self.render_pixel();
            self.sprite_renderer.tick();
        }

        let nmi = self.nmi_pending;
        if nmi {
            self.nmi_pending = false;
        }

        StepResult { frame_complete, nmi }
    }

    /// Background fetches and scroll-register side effects for this dot.
    fn run_background_pipeline(&mut self, bus: &mut impl PpuBus) {
        let dot = self.timing.dot();

        if self.timing.on_visible_dot() || self.timing.on_prefetch_dot() {
            self.background.shift();

            match dot % 8 {
                1 => {
                    let value = bus.read(self.scroll.nametable_addr());
                    self.background.set_nametable_byte(value);
                }
                3 => {
                    let value = bus.read(self.scroll.attribute_addr());
                    self.background
                        .set_attribute_byte(value, self.scroll.coarse_x(), self.scroll.coarse_y());
                }
                5 => {
                    let addr = self.background_pattern_addr();
                    let value = bus.read(addr);
                    self.background.set_pattern_lo(value);
                }
                7 => {
                    let addr = self.background_pattern_addr() + 8;
                    let value = bus.read(addr);
                    self.background.set_pattern_hi(value);
                }
                0 => {
                    self.background.reload_shifters();
                    self.scroll.increment_x();
                }
                _ => {}
            }

            if dot == 256 {
                self.scroll.increment_y();
            }
        }

        if dot == 257 {
            self.scroll.copy_horizontal();
        }
        if self.timing.in_vertical_copy_window() {
            self.scroll.copy_vertical();
        }
    }

    fn background_pattern_addr(&self) -> u16 {
        self.ctrl.background_table_addr()
            | (u16::from(self.background.nametable_byte()) << 4)
            | u16::from(self.scroll.fine_y())
    }

    /// Sprite evaluation and pattern fetch, batched at dot 257.
    ///
    /// Hardware spreads evaluation over dots 65-256 and fetches over
    /// 257-320; the observable outcome (secondary OAM, overflow flag,
    /// loaded shifters) is produced here in one step. The pre-render
    /// line runs no evaluation, so line 0 never shows sprites.
    fn run_sprite_pipeline(&mut self, bus: &mut impl PpuBus) {
        if self.timing.dot() != 257 {
            return;
        }

        self.sprite_renderer.clear();
        self.sprite_zero_on_line = false;

        if !self.timing.on_visible_scanline() {
            return;
        }

        let line = self.timing.scanline();
        let result = evaluate_sprites(
            self.oam.data(),
            line,
            self.ctrl.sprite_height(),
            &mut self.secondary_oam,
        );
        if result.overflow {
            self.status.insert(PpuStatus::SPRITE_OVERFLOW);
        }
        self.sprite_zero_on_line = result.sprite_zero_selected;

        for index in 0..self.secondary_oam.len() as usize {
            let sprite = self.secondary_oam.sprites()[index];
            let (lo, hi) = self.fetch_sprite_pattern(bus, sprite, line);
            self.sprite_renderer
                .load(index, sprite, lo, hi, sprite.oam_index == 0);
        }
    }

    /// Fetch both pattern planes for one sprite row, honoring size and
    /// flip bits.
    fn fetch_sprite_pattern(
        &mut self,
        bus: &mut impl PpuBus,
        sprite: Sprite,
        line: u16,
    ) -> (u8, u8) {
        let height = self.ctrl.sprite_height();
        let mut row = line.saturating_sub(u16::from(sprite.y)).min(height - 1);
        if sprite.flip_vertical() {
            row = height - 1 - row;
        }

        let (base, mut tile) = if height == 16 {
            // 8x16 sprites: bit 0 selects the pattern bank, the rest is
            // the top tile index.
            (
                u16::from(sprite.tile & 0x01) << 12,
                u16::from(sprite.tile & 0xFE),
            )
        } else {
            (self.ctrl.sprite_table_addr(), u16::from(sprite.tile))
        };
        if row >= 8 {
            tile += 1;
            row -= 8;
        }

        let addr = base | (tile << 4) | row;
        let mut lo = bus.read(addr);
        let mut hi = bus.read(addr + 8);
        if sprite.flip_horizontal() {
            lo = lo.reverse_bits();
            hi = hi.reverse_bits();
        }
        (lo, hi)
    }

    /// Resolve and store the pixel for the current dot.
    fn render_pixel(&mut self) {
        let x = usize::from(self.timing.dot()) - 1;
        let y = usize::from(self.timing.scanline());

        let mut bg_pixel = 0;
        let mut bg_palette = 0;
        if self.mask.show_background()
            && (x >= 8 || self.mask.contains(PpuMask::SHOW_BACKGROUND_LEFT))
        {
            let (pixel, palette) = self.background.pixel(self.scroll.fine_x());
            bg_pixel = pixel;
            bg_palette = palette;
        }

        let sprite = if self.mask.show_sprites()
            && (x >= 8 || self.mask.contains(PpuMask::SHOW_SPRITES_LEFT))
        {
            self.sprite_renderer.pixel()
        } else {
            None
        };

        if let Some(sp) = sprite {
            if sp.is_sprite_zero
                && self.sprite_zero_on_line
                && bg_pixel != 0
                && x != 255
                && !self.status.contains(PpuStatus::SPRITE_ZERO_HIT)
            {
                self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
            }
        }

        let palette_entry = match (bg_pixel, sprite) {
            (0, None) => 0,
            (0, Some(sp)) => 0x10 | (sp.palette << 2) | sp.pixel,
            (_, None) => (bg_palette << 2) | bg_pixel,
            (_, Some(sp)) => {
                if sp.behind_background {
                    (bg_palette << 2) | bg_pixel
                } else {
                    0x10 | (sp.palette << 2) | sp.pixel
                }
            }
        };

        let color = self.palette_read(0x3F00 | u16::from(palette_entry)) & 0x3F;
        self.frame[y * FRAME_WIDTH + x] = color;
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// Frame buffer of 6-bit color indices, row-major 256x240.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame
    }

    /// Current scanline (0-261).
    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.timing.scanline()
    }

    /// Current dot (0-340).
    #[must_use]
    pub fn dot(&self) -> u16 {
        self.timing.dot()
    }

    /// Current VRAM address (`v`).
    #[must_use]
    pub fn vram_addr(&self) -> u16 {
        self.scroll.vram_addr()
    }

    /// Temporary VRAM address (`t`).
    #[must_use]
    pub fn temp_vram_addr(&self) -> u16 {
        self.scroll.temp_addr()
    }

    /// Fine X scroll.
    #[must_use]
    pub fn fine_x(&self) -> u8 {
        self.scroll.fine_x()
    }

    /// Status register bits (testing and debugging).
    #[must_use]
    pub fn status_bits(&self) -> u8 {
        self.status.bits()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
