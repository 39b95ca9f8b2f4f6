//! Cartridge support: iNES parsing and mapper implementations.
//!
//! The [`Mapper`] trait is the seam between the console core and
//! cartridge hardware. [`create_mapper`] is the registry: mapper numbers
//! resolve to boards here, and unsupported numbers surface as
//! [`RomError::UnsupportedMapper`] before the console is constructed.
//!
//! Only NROM (mapper 0) ships with the core; bank-switching boards slot
//! in behind the same trait.
//!
//! # Example
//!
//! ```no_run
//! use famicore_mappers::{create_mapper, Rom};
//!
//! let data = std::fs::read("game.nes").expect("failed to read ROM");
//! let rom = Rom::load(&data).expect("failed to parse ROM");
//! let mapper = create_mapper(&rom).expect("unsupported mapper");
//!
//! let reset_lo = mapper.read_prg(0xFFFC);
//! ```

mod mapper;
mod nrom;
mod rom;

pub use mapper::{Mapper, Mirroring};
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};

/// Build the mapper for a parsed ROM.
///
/// # Errors
///
/// Returns [`RomError::UnsupportedMapper`] for mapper numbers without a
/// registered board, or the board's own [`RomError`] when the PRG/CHR
/// layout does not fit it.
pub fn create_mapper(rom: &Rom) -> Result<Box<dyn Mapper>, RomError> {
    match rom.header.mapper_number {
        0 => {
            log::debug!("cartridge: NROM, {} KiB PRG", rom.prg_rom.len() / 1024);
            Ok(Box::new(Nrom::new(rom)?))
        }
        n => Err(RomError::UnsupportedMapper(n)),
    }
}
