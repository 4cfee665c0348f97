// PPU address space
//
// $0000-$1FFF pattern memory (cartridge CHR), $2000-$3EFF nametables
// (internal 2KB folded through the cartridge's mirroring arrangement),
// $3F00-$3FFF palette RAM with its backdrop-entry mirrors.

use crate::cartridge::{Mapper, Mirroring};
use crate::ppu::constants::NAMETABLE_SIZE;
use crate::ppu::Ppu;

/// Fold a $2000-$3EFF address into the 2KB internal VRAM
fn nametable_index(mirroring: Mirroring, address: u16) -> usize {
    let index = (address & 0x0FFF) as usize;
    let table = index / NAMETABLE_SIZE;
    let offset = index % NAMETABLE_SIZE;
    let physical = match mirroring {
        // Tables stacked vertically share columns: 0,0,1,1
        Mirroring::Horizontal => [0, 0, 1, 1][table],
        // Tables side by side share rows: 0,1,0,1
        Mirroring::Vertical => [0, 1, 0, 1][table],
        // Four-screen boards carry their own RAM; fold into what we have
        Mirroring::FourScreen => table % 2,
    };
    physical * NAMETABLE_SIZE + offset
}

/// Fold a palette address, collapsing the sprite backdrop mirrors
fn palette_index(address: u16) -> usize {
    let index = (address & 0x1F) as usize;
    match index {
        0x10 | 0x14 | 0x18 | 0x1C => index - 0x10,
        _ => index,
    }
}

impl Ppu {
    fn mirroring(&self, mapper: Option<&dyn Mapper>) -> Mirroring {
        mapper.map_or(Mirroring::Horizontal, Mapper::mirroring)
    }

    /// Read a byte of PPU address space without side effects
    pub fn vram_peek(&self, mapper: Option<&dyn Mapper>, address: u16) -> u8 {
        let address = address & 0x3FFF;
        match address {
            0x0000..=0x1FFF => mapper.map_or(0, |m| m.ppu_read(address)),
            0x2000..=0x3EFF => {
                let mirroring = self.mirroring(mapper);
                self.vram[nametable_index(mirroring, address)]
            }
            _ => self.palette[palette_index(address)],
        }
    }

    /// Write a byte of PPU address space
    pub fn vram_write(
        &mut self,
        mapper: Option<&mut (dyn Mapper + 'static)>,
        address: u16,
        value: u8,
    ) {
        let address = address & 0x3FFF;
        match address {
            0x0000..=0x1FFF => {
                if let Some(m) = mapper {
                    m.ppu_write(address, value);
                }
            }
            0x2000..=0x3EFF => {
                let mirroring = self.mirroring(mapper.map(|m| &*m));
                self.vram[nametable_index(mirroring, address)] = value;
            }
            _ => self.palette[palette_index(address)] = value,
        }
    }
}
