//! PPU control, mask, and status registers.

use bitflags::bitflags;

bitflags! {
    /// $2000 PPUCTRL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        /// Base nametable select, bit 0.
        const NAMETABLE_LO = 0x01;
        /// Base nametable select, bit 1.
        const NAMETABLE_HI = 0x02;
        /// PPUDATA address increment: 0 adds 1, 1 adds 32.
        const VRAM_INCREMENT_32 = 0x04;
        /// Sprite pattern table select (8x8 sprites only).
        const SPRITE_TABLE = 0x08;
        /// Background pattern table select.
        const BACKGROUND_TABLE = 0x10;
        /// Sprite size: 0 is 8x8, 1 is 8x16.
        const SPRITE_SIZE_16 = 0x20;
        /// PPU master/slave select (unused on the NES).
        const MASTER_SLAVE = 0x40;
        /// Generate NMI at VBlank start.
        const NMI_ENABLE = 0x80;
    }
}

impl PpuCtrl {
    /// PPUDATA increment step.
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT_32) {
            32
        } else {
            1
        }
    }

    /// Background pattern table base address.
    #[must_use]
    pub fn background_table_addr(self) -> u16 {
        if self.contains(Self::BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite pattern table base address (ignored for 8x16 sprites).
    #[must_use]
    pub fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in lines.
    #[must_use]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE_16) {
            16
        } else {
            8
        }
    }

    /// NMI output enabled?
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// $2001 PPUMASK.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        /// Grayscale output.
        const GRAYSCALE = 0x01;
        /// Show background in the leftmost 8 pixels.
        const SHOW_BACKGROUND_LEFT = 0x02;
        /// Show sprites in the leftmost 8 pixels.
        const SHOW_SPRITES_LEFT = 0x04;
        /// Background rendering enable.
        const SHOW_BACKGROUND = 0x08;
        /// Sprite rendering enable.
        const SHOW_SPRITES = 0x10;
        /// Red emphasis.
        const EMPHASIZE_RED = 0x20;
        /// Green emphasis.
        const EMPHASIZE_GREEN = 0x40;
        /// Blue emphasis.
        const EMPHASIZE_BLUE = 0x80;
    }
}

impl PpuMask {
    /// True when either layer is being rendered. Gates the whole fetch
    /// pipeline and the scroll-register side effects.
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BACKGROUND | Self::SHOW_SPRITES)
    }

    /// Background layer on?
    #[must_use]
    pub fn show_background(self) -> bool {
        self.contains(Self::SHOW_BACKGROUND)
    }

    /// Sprite layer on?
    #[must_use]
    pub fn show_sprites(self) -> bool {
        self.contains(Self::SHOW_SPRITES)
    }
}

bitflags! {
    /// $2002 PPUSTATUS. Only bits 7-5 are driven; the rest read as open
    /// bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        /// More than eight sprites on a scanline (with the hardware's
        /// buggy scan).
        const SPRITE_OVERFLOW = 0x20;
        /// Sprite 0 opaque pixel overlapped an opaque background pixel.
        const SPRITE_ZERO_HIT = 0x40;
        /// Currently in vertical blank.
        const VBLANK = 0x80;
    }
}
