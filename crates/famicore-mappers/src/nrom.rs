//! Mapper 0: NROM.
//!
//! The launch-era board with no banking at all. 16 KiB PRG boards mirror
//! their single bank across the 32 KiB window; CHR is 8 KiB of ROM or RAM.
//! Four-screen NROM boards (rare, but the header allows it) carry the
//! extra 2 KiB of nametable RAM here.

use crate::{Mapper, Mirroring, Rom, RomError};

const PRG_BANK: usize = 16 * 1024;
const CHR_SIZE: usize = 8 * 1024;

/// NROM (mapper 0).
pub struct Nrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_writable: bool,
    mirroring: Mirroring,
    has_battery: bool,
    aux_nametable: Option<Vec<u8>>,
}

impl Nrom {
    /// Build an NROM board from a parsed ROM.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] if the PRG payload is not 16 or 32 KiB, or
    /// CHR-ROM is present but not 8 KiB. The header only constrains bank
    /// counts to be nonzero, so the board-level layout is checked here.
    pub fn new(rom: &Rom) -> Result<Self, RomError> {
        if rom.prg_rom.len() != PRG_BANK && rom.prg_rom.len() != 2 * PRG_BANK {
            return Err(RomError::InvalidPrgSize(format!(
                "NROM requires 16 KiB or 32 KiB PRG-ROM, got {} bytes",
                rom.prg_rom.len()
            )));
        }

        let chr_writable = rom.chr_rom.is_empty();
        let chr = if chr_writable {
            vec![0; CHR_SIZE]
        } else {
            if rom.chr_rom.len() != CHR_SIZE {
                return Err(RomError::InvalidChrSize(format!(
                    "NROM requires 8 KiB CHR, got {} bytes",
                    rom.chr_rom.len()
                )));
            }
            rom.chr_rom.clone()
        };

        let aux_nametable = if rom.header.mirroring == Mirroring::FourScreen {
            Some(vec![0; 2048])
        } else {
            None
        };

        Ok(Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            chr_writable,
            mirroring: rom.header.mirroring,
            has_battery: rom.header.has_battery,
            aux_nametable,
        })
    }
}

impl Mapper for Nrom {
    fn read_prg(&self, addr: u16) -> u8 {
        if addr < 0x8000 {
            // No work RAM on NROM; reads float.
            return 0;
        }
        let offset = (addr as usize - 0x8000) & (self.prg_rom.len() - 1);
        self.prg_rom[offset]
    }

    fn write_prg(&mut self, _addr: u16, _value: u8) {
        // No registers, no PRG-RAM.
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr[(addr as usize) & (CHR_SIZE - 1)]
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        if self.chr_writable {
            self.chr[(addr as usize) & (CHR_SIZE - 1)] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn read_aux_nametable(&self, addr: u16) -> u8 {
        self.aux_nametable
            .as_ref()
            .map_or(0, |ram| ram[(addr as usize) & 0x07FF])
    }

    fn write_aux_nametable(&mut self, addr: u16, value: u8) {
        if let Some(ram) = self.aux_nametable.as_mut() {
            ram[(addr as usize) & 0x07FF] = value;
        }
    }

    fn mapper_number(&self) -> u16 {
        0
    }

    fn mapper_name(&self) -> &'static str {
        "NROM"
    }

    fn has_battery(&self) -> bool {
        self.has_battery
    }
}
