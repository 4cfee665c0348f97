// Mapper 0 (NROM) - no bank switching
//
// Memory layout:
// - CPU $8000-$BFFF: first 16KB of PRG-ROM
// - CPU $C000-$FFFF: last 16KB of PRG-ROM (mirror of the first for 16KB boards)
// - PPU $0000-$1FFF: 8KB CHR-ROM or CHR-RAM

use crate::cartridge::{Cartridge, Mapper, MapperError, Mirroring, PRG_BANK_SIZE};

/// Mapper 0 implementation (NROM)
pub struct Mapper0 {
    /// PRG-ROM data (16KB or 32KB)
    prg_rom: Vec<u8>,
    /// CHR-ROM or CHR-RAM data (8KB)
    chr_mem: Vec<u8>,
    /// Whether CHR memory is writable
    chr_is_ram: bool,
    /// Mirroring type (fixed on this board)
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Build from a parsed cartridge, validating board constraints
    pub fn new(cartridge: Cartridge) -> Result<Self, MapperError> {
        let prg_len = cartridge.prg_rom.len();
        if prg_len != PRG_BANK_SIZE && prg_len != 2 * PRG_BANK_SIZE {
            return Err(MapperError::InvalidConfiguration(format!(
                "NROM requires 16KB or 32KB PRG-ROM, got {} bytes",
                prg_len
            )));
        }

        Ok(Mapper0 {
            prg_rom: cartridge.prg_rom,
            chr_mem: cartridge.chr_rom,
            chr_is_ram: cartridge.chr_is_ram,
            mirroring: cartridge.mirroring,
        })
    }
}

impl Mapper for Mapper0 {
    fn cpu_read(&self, address: u16) -> u8 {
        match address {
            0x8000..=0xFFFF => {
                // Modulo folds 16KB boards across both halves
                let index = (address - 0x8000) as usize;
                self.prg_rom[index % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    /// NROM has no registers; writes into ROM space are ignored
    fn cpu_write(&mut self, _address: u16, _value: u8) {}

    fn ppu_read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x1FFF => self.chr_mem[address as usize],
            _ => 0,
        }
    }

    fn ppu_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            if let 0x0000..=0x1FFF = address {
                self.chr_mem[address as usize] = value;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
