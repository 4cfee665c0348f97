// 2C02 PPU core
//
// The PPU here is the timing and register machine: scanline/dot counters,
// the VBlank/NMI handshake, the external register bank and the video
// memory spaces. Pixel composition belongs to a renderer sitting on top
// of `frame_state` and the memory snapshots; it is not done here.

pub mod constants;
pub mod memory;
pub mod registers;

#[cfg(test)]
mod tests;

use constants::*;

/// Read-only snapshot of where the PPU is in its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameState {
    /// Current scanline (0-261)
    pub scanline: u16,
    /// Current dot within the scanline (0-340)
    pub dot: u16,
    /// Frames completed since power-on
    pub frame: u64,
    /// Whether the vertical blank flag is set
    pub vblank: bool,
    /// Whether background or sprite rendering is switched on
    pub rendering_enabled: bool,
}

/// The PPU state
#[derive(Debug, Clone)]
pub struct Ppu {
    // Counters
    /// Current scanline
    pub(crate) scanline: u16,
    /// Current dot
    pub(crate) dot: u16,
    /// Completed frame count
    pub(crate) frame: u64,

    // External registers
    /// PPUCTRL ($2000)
    pub(crate) ctrl: u8,
    /// PPUMASK ($2001)
    pub(crate) mask: u8,
    /// PPUSTATUS ($2002) flag bits
    pub(crate) status: u8,
    /// OAMADDR ($2003)
    pub(crate) oam_addr: u8,

    // Internal scroll/address registers
    /// Current VRAM address (v)
    pub(crate) v: u16,
    /// Temporary VRAM address (t)
    pub(crate) t: u16,
    /// Fine X scroll
    pub(crate) fine_x: u8,
    /// First/second-write toggle shared by $2005 and $2006
    pub(crate) write_latch: bool,
    /// PPUDATA read buffer
    pub(crate) read_buffer: u8,
    /// Last value driven onto the register bus (feeds open bits)
    pub(crate) last_write: u8,

    // Memory
    /// Internal nametable RAM
    pub(crate) vram: [u8; VRAM_SIZE],
    /// Palette RAM
    pub(crate) palette: [u8; PALETTE_SIZE],
    /// Object attribute memory
    pub(crate) oam: [u8; OAM_SIZE],

    // Interrupt handshake
    /// NMI request latched for the CPU to pick up
    nmi_line: bool,
    /// Set on the dot that wraps into the pre-render line
    frame_complete: bool,
}

impl Ppu {
    pub fn new() -> Self {
        Ppu {
            scanline: 0,
            dot: 0,
            frame: 0,
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            read_buffer: 0,
            last_write: 0,
            vram: [0; VRAM_SIZE],
            palette: [0; PALETTE_SIZE],
            oam: [0; OAM_SIZE],
            nmi_line: false,
            frame_complete: false,
        }
    }

    /// Return to the power-on register state; counters restart at (0, 0)
    pub fn reset(&mut self) {
        self.scanline = 0;
        self.dot = 0;
        self.ctrl = 0;
        self.mask = 0;
        self.write_latch = false;
        self.read_buffer = 0;
        self.nmi_line = false;
        self.frame_complete = false;
    }

    /// Whether background or sprite output is switched on
    #[inline]
    pub fn rendering_enabled(&self) -> bool {
        self.mask & MASK_RENDERING != 0
    }

    /// Advance the PPU by one dot
    ///
    /// Returns true on the dot that completes a frame (the wrap out of the
    /// pre-render scanline into scanline 0).
    pub fn step_cycle(&mut self) -> bool {
        self.frame_complete = false;

        // Status flag edges happen at dot 1 of their scanlines
        if self.dot == STATUS_DOT {
            if self.scanline == VBLANK_SCANLINE {
                self.status |= STATUS_VBLANK;
                if self.ctrl & CTRL_NMI_ENABLE != 0 {
                    self.nmi_line = true;
                }
            } else if self.scanline == PRERENDER_SCANLINE {
                self.status &=
                    !(STATUS_VBLANK | STATUS_SPRITE_ZERO_HIT | STATUS_SPRITE_OVERFLOW);
            }
        }

        self.update_sprite_zero_hit();
        self.update_sprite_overflow();

        // Advance the dot counter with wrap-and-carry into the scanline
        self.dot += 1;

        // Odd frames drop the last dot of the pre-render line while
        // rendering is on, keeping NTSC output aligned
        if self.scanline == PRERENDER_SCANLINE
            && self.dot == CYCLES_PER_SCANLINE - 1
            && self.frame % 2 == 1
            && self.rendering_enabled()
        {
            self.dot += 1;
        }

        if self.dot >= CYCLES_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
                self.frame_complete = true;
            }
        }

        self.frame_complete
    }

    /// Sprite-zero hit from the timing counters and OAM slot 0
    ///
    /// Without a pixel pipeline the opaque-overlap test is approximated by
    /// position alone: once the beam passes sprite zero's top-left corner
    /// on a rendered scanline, the flag sets for the rest of the frame.
    fn update_sprite_zero_hit(&mut self) {
        if !self.rendering_enabled() || self.status & STATUS_SPRITE_ZERO_HIT != 0 {
            return;
        }
        let sprite_y = self.oam[0] as u16;
        let sprite_x = self.oam[3] as u16;
        if sprite_y >= VISIBLE_SCANLINES {
            return;
        }
        if self.scanline > sprite_y && self.scanline < VISIBLE_SCANLINES && self.dot >= sprite_x {
            self.status |= STATUS_SPRITE_ZERO_HIT;
        }
    }

    /// Sprite overflow from the timing counters and OAM
    ///
    /// At the sprite-evaluation dot of each visible scanline, count the
    /// sprites whose vertical range covers the line; a ninth one sets the
    /// overflow flag for the rest of the frame.
    fn update_sprite_overflow(&mut self) {
        if !self.rendering_enabled()
            || self.status & STATUS_SPRITE_OVERFLOW != 0
            || self.dot != SPRITE_EVAL_DOT
            || self.scanline >= VISIBLE_SCANLINES
        {
            return;
        }
        let height = if self.ctrl & CTRL_SPRITE_16 != 0 { 16 } else { 8 };
        let mut in_range = 0u8;
        for sprite in self.oam.chunks_exact(4) {
            let top = sprite[0] as u16;
            if self.scanline > top && self.scanline <= top + height {
                in_range += 1;
                if in_range > SPRITES_PER_SCANLINE {
                    self.status |= STATUS_SPRITE_OVERFLOW;
                    return;
                }
            }
        }
    }

    /// Where the PPU is in its frame, as an owned snapshot
    pub fn frame_state(&self) -> FrameState {
        FrameState {
            scanline: self.scanline,
            dot: self.dot,
            frame: self.frame,
            vblank: self.status & STATUS_VBLANK != 0,
            rendering_enabled: self.rendering_enabled(),
        }
    }

    /// Whether an NMI request is latched, without consuming it
    pub fn nmi_pending(&self) -> bool {
        self.nmi_line
    }

    /// Take the latched NMI request, clearing it
    pub fn take_nmi(&mut self) -> bool {
        let nmi = self.nmi_line;
        self.nmi_line = false;
        nmi
    }

    /// Copy one byte into OAM at the current OAM address (DMA path)
    pub fn oam_dma_write(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
