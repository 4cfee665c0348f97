// The eight external PPU registers ($2000-$2007 before bus mirroring)
//
// Reads and writes here are the CPU-visible surface of the PPU. Several
// of them carry side effects (the shared write latch, the PPUDATA read
// buffer, VBlank clearing), so the debugger path uses `peek_register`
// instead of `read_register`.

use crate::cartridge::Mapper;
use crate::ppu::constants::*;
use crate::ppu::Ppu;

/// Register indices after the bus folds $2000-$3FFF down to eight slots
pub const PPUCTRL: u16 = 0;
pub const PPUMASK: u16 = 1;
pub const PPUSTATUS: u16 = 2;
pub const OAMADDR: u16 = 3;
pub const OAMDATA: u16 = 4;
pub const PPUSCROLL: u16 = 5;
pub const PPUADDR: u16 = 6;
pub const PPUDATA: u16 = 7;

impl Ppu {
    fn vram_increment(&self) -> u16 {
        if self.ctrl & CTRL_INCREMENT_32 != 0 {
            32
        } else {
            1
        }
    }

    /// CPU read of a PPU register, with all hardware side effects
    pub fn read_register(&mut self, mapper: Option<&dyn Mapper>, index: u16) -> u8 {
        match index {
            PPUSTATUS => {
                // Top three bits are flags; the rest decay to the last
                // value driven onto the register bus
                let value = (self.status & 0xE0) | (self.last_write & 0x1F);
                self.status &= !STATUS_VBLANK;
                self.write_latch = false;
                // Reading on the flag-set dot races the NMI and loses it
                if self.scanline == VBLANK_SCANLINE && self.dot <= STATUS_DOT + 1 {
                    self.take_nmi();
                }
                value
            }
            OAMDATA => self.oam[self.oam_addr as usize],
            PPUDATA => {
                let address = self.v & 0x3FFF;
                let fetched = self.vram_peek(mapper, address);
                let value = if address >= 0x3F00 {
                    // Palette reads bypass the buffer; the buffer still
                    // loads from the nametable underneath
                    self.read_buffer = self.vram_peek(mapper, address - 0x1000);
                    fetched
                } else {
                    std::mem::replace(&mut self.read_buffer, fetched)
                };
                self.v = self.v.wrapping_add(self.vram_increment()) & 0x7FFF;
                value
            }
            // Write-only registers read back the bus
            _ => self.last_write,
        }
    }

    /// Debugger read of a PPU register with no side effects
    pub fn peek_register(&self, mapper: Option<&dyn Mapper>, index: u16) -> u8 {
        match index {
            PPUSTATUS => (self.status & 0xE0) | (self.last_write & 0x1F),
            OAMDATA => self.oam[self.oam_addr as usize],
            PPUDATA => {
                let address = self.v & 0x3FFF;
                if address >= 0x3F00 {
                    self.vram_peek(mapper, address)
                } else {
                    self.read_buffer
                }
            }
            _ => self.last_write,
        }
    }

    /// CPU write to a PPU register
    pub fn write_register(
        &mut self,
        mapper: Option<&mut (dyn Mapper + 'static)>,
        index: u16,
        value: u8,
    ) {
        self.last_write = value;
        match index {
            PPUCTRL => {
                let nmi_was_enabled = self.ctrl & CTRL_NMI_ENABLE != 0;
                self.ctrl = value;
                // Nametable select lands in t
                self.t = (self.t & !0x0C00) | ((value as u16 & 0x03) << 10);
                // Enabling NMI mid-VBlank fires one immediately
                if !nmi_was_enabled
                    && value & CTRL_NMI_ENABLE != 0
                    && self.status & STATUS_VBLANK != 0
                {
                    self.nmi_line = true;
                }
            }
            PPUMASK => self.mask = value,
            PPUSTATUS => {} // read-only
            OAMADDR => self.oam_addr = value,
            OAMDATA => {
                self.oam[self.oam_addr as usize] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            PPUSCROLL => {
                if self.write_latch {
                    // Second write: coarse and fine Y
                    self.t = (self.t & !0x73E0)
                        | ((value as u16 & 0xF8) << 2)
                        | ((value as u16 & 0x07) << 12);
                } else {
                    // First write: coarse X and fine X
                    self.fine_x = value & 0x07;
                    self.t = (self.t & !0x001F) | (value as u16 >> 3);
                }
                self.write_latch = !self.write_latch;
            }
            PPUADDR => {
                if self.write_latch {
                    // Second write: low byte, then v latches from t
                    self.t = (self.t & 0xFF00) | value as u16;
                    self.v = self.t;
                } else {
                    // First write: high six bits (bit 14 clears)
                    self.t = (self.t & 0x00FF) | ((value as u16 & 0x3F) << 8);
                }
                self.write_latch = !self.write_latch;
            }
            PPUDATA => {
                self.vram_write(mapper, self.v & 0x3FFF, value);
                self.v = self.v.wrapping_add(self.vram_increment()) & 0x7FFF;
            }
            _ => unreachable!("register index is pre-masked to 0-7"),
        }
    }
}
