// Cartridge module - iNES image parsing and the mapper seam
//
// A `Cartridge` is the raw ROM contents plus the header facts the bus and
// mappers need. Address translation is behind the `Mapper` trait so that
// new board types slot in without touching the bus.

pub mod mappers;

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

pub use mappers::{create_mapper, MapperError};

/// iNES header magic ("NES" followed by an EOF byte)
const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
/// Header length in bytes
const HEADER_LEN: usize = 16;
/// Optional trainer blob length
const TRAINER_LEN: usize = 512;
/// PRG-ROM bank granularity
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR bank granularity
pub const CHR_BANK_SIZE: usize = 8 * 1024;

/// Nametable mirroring arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Error type for iNES image parsing
#[derive(Debug)]
pub enum INesError {
    /// The file does not start with the iNES magic
    InvalidMagic,
    /// The image is shorter than the header claims
    Truncated { expected: usize, actual: usize },
    /// A header with zero PRG banks describes no program at all
    NoPrgRom,
    /// Underlying file I/O failed
    Io(std::io::Error),
}

impl fmt::Display for INesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            INesError::InvalidMagic => write!(f, "not an iNES image (bad magic)"),
            INesError::Truncated { expected, actual } => {
                write!(f, "truncated iNES image: need {} bytes, have {}", expected, actual)
            }
            INesError::NoPrgRom => write!(f, "iNES header declares zero PRG-ROM banks"),
            INesError::Io(err) => write!(f, "failed to read iNES image: {}", err),
        }
    }
}

impl Error for INesError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            INesError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for INesError {
    fn from(err: std::io::Error) -> Self {
        INesError::Io(err)
    }
}

/// Decoded iNES (v1) header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct INesHeader {
    /// Number of 16KB PRG-ROM banks
    pub prg_banks: u8,
    /// Number of 8KB CHR-ROM banks (0 means the board carries CHR-RAM)
    pub chr_banks: u8,
    /// Mapper number from the two flag nibbles
    pub mapper: u8,
    /// Nametable arrangement
    pub mirroring: Mirroring,
    /// Whether a 512-byte trainer precedes PRG data
    pub has_trainer: bool,
    /// Whether the board carries battery-backed PRG-RAM
    pub has_battery: bool,
}

impl INesHeader {
    /// Decode the 16-byte header
    pub fn parse(data: &[u8]) -> Result<Self, INesError> {
        if data.len() < HEADER_LEN {
            return Err(INesError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if data[0..4] != INES_MAGIC {
            return Err(INesError::InvalidMagic);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(INesHeader {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper: (flags7 & 0xF0) | (flags6 >> 4),
            mirroring,
            has_trainer: flags6 & 0x04 != 0,
            has_battery: flags6 & 0x02 != 0,
        })
    }
}

/// ROM contents ready for a mapper
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// PRG-ROM data (multiple of 16KB)
    pub prg_rom: Vec<u8>,
    /// CHR-ROM data, or a zero-filled 8KB CHR-RAM allocation
    pub chr_rom: Vec<u8>,
    /// Whether CHR memory is writable
    pub chr_is_ram: bool,
    /// Mapper number from the header
    pub mapper: u8,
    /// Nametable mirroring arrangement
    pub mirroring: Mirroring,
}

impl Cartridge {
    /// Parse a complete iNES image from memory
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, INesError> {
        let header = INesHeader::parse(data)?;
        if header.prg_banks == 0 {
            return Err(INesError::NoPrgRom);
        }

        let prg_len = header.prg_banks as usize * PRG_BANK_SIZE;
        let chr_len = header.chr_banks as usize * CHR_BANK_SIZE;
        let trainer_len = if header.has_trainer { TRAINER_LEN } else { 0 };

        let prg_start = HEADER_LEN + trainer_len;
        let chr_start = prg_start + prg_len;
        let expected = chr_start + chr_len;
        if data.len() < expected {
            return Err(INesError::Truncated {
                expected,
                actual: data.len(),
            });
        }

        let prg_rom = data[prg_start..chr_start].to_vec();
        let chr_is_ram = header.chr_banks == 0;
        let chr_rom = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            data[chr_start..expected].to_vec()
        };

        Ok(Cartridge {
            prg_rom,
            chr_rom,
            chr_is_ram,
            mapper: header.mapper,
            mirroring: header.mirroring,
        })
    }

    /// Load and parse an iNES image from disk
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, INesError> {
        let data = fs::read(path)?;
        Self::from_ines_bytes(&data)
    }
}

/// The address-translation seam between the bus and a cartridge board
///
/// `cpu_*` cover $4020-$FFFF on the CPU bus; `ppu_*` cover $0000-$1FFF on
/// the PPU bus. `on_scanline` is the hook boards with scanline counters
/// (IRQ-generating mappers) use; the default is a no-op.
pub trait Mapper {
    /// Read from the cartridge's CPU address window
    fn cpu_read(&self, address: u16) -> u8;
    /// Write to the cartridge's CPU address window
    fn cpu_write(&mut self, address: u16, value: u8);
    /// Read pattern memory
    fn ppu_read(&self, address: u16) -> u8;
    /// Write pattern memory (ignored for CHR-ROM boards)
    fn ppu_write(&mut self, address: u16, value: u8);
    /// Current nametable mirroring (boards can switch it at runtime)
    fn mirroring(&self) -> Mirroring;
    /// Notification that a PPU scanline completed
    fn on_scanline(&mut self) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a minimal iNES image in memory
    pub(crate) fn build_ines(prg_banks: u8, chr_banks: u8, mapper: u8, flags6_low: u8) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[0..4].copy_from_slice(&INES_MAGIC);
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = (mapper << 4) | flags6_low;
        data[7] = mapper & 0xF0;
        data.extend(std::iter::repeat(0).take(prg_banks as usize * PRG_BANK_SIZE));
        data.extend(std::iter::repeat(0).take(chr_banks as usize * CHR_BANK_SIZE));
        data
    }

    #[test]
    fn test_header_parse() {
        let data = build_ines(2, 1, 0, 0x01);
        let header = INesHeader::parse(&data).unwrap();
        assert_eq!(header.prg_banks, 2);
        assert_eq!(header.chr_banks, 1);
        assert_eq!(header.mapper, 0);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert!(!header.has_trainer);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut data = build_ines(1, 1, 0, 0);
        data[0] = 0x00;
        assert!(matches!(
            Cartridge::from_ines_bytes(&data),
            Err(INesError::InvalidMagic)
        ));
    }

    #[test]
    fn test_truncated_image_rejected() {
        let data = build_ines(2, 1, 0, 0);
        let short = &data[..data.len() - 100];
        match Cartridge::from_ines_bytes(short) {
            Err(INesError::Truncated { expected, actual }) => {
                assert!(expected > actual);
            }
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_chr_ram_allocation() {
        let data = build_ines(1, 0, 0, 0);
        let cart = Cartridge::from_ines_bytes(&data).unwrap();
        assert!(cart.chr_is_ram);
        assert_eq!(cart.chr_rom.len(), CHR_BANK_SIZE, "8KB CHR-RAM allocated");
    }

    #[test]
    fn test_zero_prg_banks_rejected() {
        let data = build_ines(0, 1, 0, 0);
        assert!(matches!(
            Cartridge::from_ines_bytes(&data),
            Err(INesError::NoPrgRom)
        ));
    }

    #[test]
    fn test_mapper_number_from_both_nibbles() {
        let data = build_ines(1, 1, 2, 0);
        let cart = Cartridge::from_ines_bytes(&data).unwrap();
        assert_eq!(cart.mapper, 2);
    }
}
