//! iNES ROM image parsing.
//!
//! The iNES format is a 16-byte header followed by an optional 512-byte
//! trainer, then PRG-ROM and CHR-ROM:
//!
//! ```text
//! Byte 0-3:  Magic "NES" + MS-DOS EOF ($4E $45 $53 $1A)
//! Byte 4:    PRG-ROM size in 16 KiB units
//! Byte 5:    CHR-ROM size in 8 KiB units (0 = 8 KiB CHR-RAM)
//! Byte 6:    Flags: mirroring, battery, trainer, four-screen, mapper low nibble
//! Byte 7:    Flags: NES 2.0 tag (bits 2-3 = 2), mapper high nibble
//! Byte 8-15: Reserved / NES 2.0 extensions
//! ```

use crate::Mirroring;

/// Errors raised while parsing a ROM image.
#[derive(Debug, thiserror::Error)]
pub enum RomError {
    /// File shorter than the data the header promises.
    #[error("ROM file truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required by the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// First four bytes are not the iNES magic.
    #[error("invalid iNES magic: expected [4E 45 53 1A], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// PRG bank count of zero.
    #[error("PRG-ROM size cannot be zero")]
    EmptyPrg,

    /// PRG-ROM size the selected mapper cannot address.
    #[error("invalid PRG-ROM size: {0}")]
    InvalidPrgSize(String),

    /// CHR size the selected mapper cannot address.
    #[error("invalid CHR size: {0}")]
    InvalidChrSize(String),

    /// Mapper number without a registered implementation.
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u16),
}

/// Parsed iNES header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// PRG-ROM size in bytes.
    pub prg_rom_size: usize,
    /// CHR-ROM size in bytes; 0 means the board carries 8 KiB CHR-RAM.
    pub chr_rom_size: usize,
    /// iNES mapper number (low and high nibbles combined).
    pub mapper_number: u16,
    /// Nametable mirroring from flags 6.
    pub mirroring: Mirroring,
    /// Battery-backed work RAM present.
    pub has_battery: bool,
    /// 512-byte trainer precedes PRG-ROM.
    pub has_trainer: bool,
    /// NES 2.0 tag detected in flags 7.
    pub nes2: bool,
}

impl RomHeader {
    /// iNES magic: "NES" followed by MS-DOS EOF.
    const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

    /// Header length in bytes.
    pub const LEN: usize = 16;

    /// Parse the 16-byte header.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] when the buffer is too short, the magic is
    /// wrong, or the PRG bank count is zero.
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < Self::LEN {
            return Err(RomError::Truncated {
                expected: Self::LEN,
                actual: data.len(),
            });
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != Self::MAGIC {
            return Err(RomError::InvalidMagic(magic));
        }

        let prg_rom_size = data[4] as usize * 16 * 1024;
        if prg_rom_size == 0 {
            return Err(RomError::EmptyPrg);
        }
        let chr_rom_size = data[5] as usize * 8 * 1024;

        let mirroring = if data[6] & 0x08 != 0 {
            Mirroring::FourScreen
        } else if data[6] & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mapper_number = u16::from((data[7] & 0xF0) | (data[6] >> 4));

        Ok(Self {
            prg_rom_size,
            chr_rom_size,
            mapper_number,
            mirroring,
            has_battery: data[6] & 0x02 != 0,
            has_trainer: data[6] & 0x04 != 0,
            nes2: data[7] & 0x0C == 0x08,
        })
    }
}

/// A parsed ROM image: header plus the PRG/CHR payloads.
#[derive(Debug, Clone)]
pub struct Rom {
    /// Header fields.
    pub header: RomHeader,
    /// Trainer payload, when the header flags one.
    pub trainer: Option<Vec<u8>>,
    /// PRG-ROM bytes.
    pub prg_rom: Vec<u8>,
    /// CHR-ROM bytes; empty when the board uses CHR-RAM.
    pub chr_rom: Vec<u8>,
}

impl Rom {
    /// Parse a complete ROM file.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] when the header is invalid or the file is
    /// shorter than the header's bank counts require.
    pub fn load(data: &[u8]) -> Result<Self, RomError> {
        let header = RomHeader::parse(data)?;
        let mut offset = RomHeader::LEN;

        let trainer = if header.has_trainer {
            let end = offset + 512;
            if data.len() < end {
                return Err(RomError::Truncated {
                    expected: end,
                    actual: data.len(),
                });
            }
            let trainer = data[offset..end].to_vec();
            offset = end;
            Some(trainer)
        } else {
            None
        };

        let prg_end = offset + header.prg_rom_size;
        if data.len() < prg_end {
            return Err(RomError::Truncated {
                expected: prg_end,
                actual: data.len(),
            });
        }
        let prg_rom = data[offset..prg_end].to_vec();
        offset = prg_end;

        let chr_end = offset + header.chr_rom_size;
        if data.len() < chr_end {
            return Err(RomError::Truncated {
                expected: chr_end,
                actual: data.len(),
            });
        }
        let chr_rom = data[offset..chr_end].to_vec();

        Ok(Self {
            header,
            trainer,
            prg_rom,
            chr_rom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(prg: u8, chr: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, prg, chr, flags6, flags7];
        data.extend_from_slice(&[0; 8]);
        data
    }

    #[test]
    fn header_fields_round_trip() {
        // Mapper 0x42, vertical mirroring, battery.
        let data = header_bytes(2, 1, 0x20 | 0x02 | 0x01, 0x40);
        let header = RomHeader::parse(&data).unwrap();

        assert_eq!(header.prg_rom_size, 32 * 1024);
        assert_eq!(header.chr_rom_size, 8 * 1024);
        assert_eq!(header.mapper_number, 0x42);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert!(header.has_battery);
        assert!(!header.has_trainer);
        assert!(!header.nes2);
    }

    #[test]
    fn four_screen_flag_wins_over_mirroring_bit() {
        let data = header_bytes(1, 1, 0x08 | 0x01, 0x00);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn nes2_tag_detected() {
        let data = header_bytes(1, 1, 0x00, 0x08);
        assert!(RomHeader::parse(&data).unwrap().nes2);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut data = header_bytes(1, 1, 0, 0);
        data[0] = 0x4D;
        assert!(matches!(
            RomHeader::parse(&data),
            Err(RomError::InvalidMagic(_))
        ));
    }

    #[test]
    fn short_header_rejected() {
        assert!(matches!(
            RomHeader::parse(&[0x4E, 0x45, 0x53]),
            Err(RomError::Truncated { .. })
        ));
    }

    #[test]
    fn zero_prg_rejected() {
        let data = header_bytes(0, 1, 0, 0);
        assert!(matches!(RomHeader::parse(&data), Err(RomError::EmptyPrg)));
    }

    #[test]
    fn load_splits_prg_and_chr() {
        let mut data = header_bytes(1, 1, 0, 0);
        data.extend(std::iter::repeat(0xAA).take(16 * 1024));
        data.extend(std::iter::repeat(0xBB).take(8 * 1024));

        let rom = Rom::load(&data).unwrap();
        assert_eq!(rom.prg_rom.len(), 16 * 1024);
        assert_eq!(rom.chr_rom.len(), 8 * 1024);
        assert_eq!(rom.prg_rom[0], 0xAA);
        assert_eq!(rom.chr_rom[0], 0xBB);
        assert!(rom.trainer.is_none());
    }

    #[test]
    fn load_with_trainer() {
        let mut data = header_bytes(1, 0, 0x04, 0);
        data.extend(std::iter::repeat(0x11).take(512));
        data.extend(std::iter::repeat(0xAA).take(16 * 1024));

        let rom = Rom::load(&data).unwrap();
        let trainer = rom.trainer.unwrap();
        assert_eq!(trainer.len(), 512);
        assert_eq!(trainer[0], 0x11);
        assert_eq!(rom.prg_rom[0], 0xAA);
    }

    #[test]
    fn truncated_payload_rejected() {
        let mut data = header_bytes(2, 1, 0, 0);
        data.extend(std::iter::repeat(0xAA).take(1024));
        assert!(matches!(Rom::load(&data), Err(RomError::Truncated { .. })));
    }
}
