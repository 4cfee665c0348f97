// Mapper 2 (UxROM) - switchable 16KB PRG bank plus a fixed top bank
//
// Memory layout:
// - CPU $8000-$BFFF: switchable 16KB PRG-ROM bank
// - CPU $C000-$FFFF: fixed to the last 16KB bank
// - PPU $0000-$1FFF: 8KB CHR-RAM (UxROM boards ship without CHR-ROM)
//
// Any write to $8000-$FFFF selects the bank from the low bits of the value.

use crate::cartridge::{Cartridge, Mapper, MapperError, Mirroring, PRG_BANK_SIZE};

/// Mapper 2 implementation (UxROM)
pub struct Mapper2 {
    prg_rom: Vec<u8>,
    chr_mem: Vec<u8>,
    chr_is_ram: bool,
    mirroring: Mirroring,
    /// Currently selected low bank
    bank_select: usize,
    /// Total number of 16KB banks
    bank_count: usize,
}

impl Mapper2 {
    pub fn new(cartridge: Cartridge) -> Result<Self, MapperError> {
        let prg_len = cartridge.prg_rom.len();
        if prg_len == 0 || prg_len % PRG_BANK_SIZE != 0 {
            return Err(MapperError::InvalidConfiguration(format!(
                "UxROM requires a multiple of 16KB PRG-ROM, got {} bytes",
                prg_len
            )));
        }

        Ok(Mapper2 {
            bank_count: prg_len / PRG_BANK_SIZE,
            prg_rom: cartridge.prg_rom,
            chr_mem: cartridge.chr_rom,
            chr_is_ram: cartridge.chr_is_ram,
            mirroring: cartridge.mirroring,
            bank_select: 0,
        })
    }
}

impl Mapper for Mapper2 {
    fn cpu_read(&self, address: u16) -> u8 {
        match address {
            0x8000..=0xBFFF => {
                let base = self.bank_select * PRG_BANK_SIZE;
                self.prg_rom[base + (address - 0x8000) as usize]
            }
            0xC000..=0xFFFF => {
                let base = (self.bank_count - 1) * PRG_BANK_SIZE;
                self.prg_rom[base + (address - 0xC000) as usize]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        if address >= 0x8000 {
            // Bank register; out-of-range selections wrap
            self.bank_select = value as usize % self.bank_count;
        }
    }

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
