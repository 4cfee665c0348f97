// PPU timing and address-space constants (NTSC 2C02)

/// Dots per scanline (0-340)
pub const CYCLES_PER_SCANLINE: u16 = 341;
/// Scanlines per frame (0-261)
pub const SCANLINES_PER_FRAME: u16 = 262;
/// Scanlines with visible output
pub const VISIBLE_SCANLINES: u16 = 240;
/// First scanline of vertical blank
pub const VBLANK_SCANLINE: u16 = 241;
/// The pre-render scanline that precedes the next frame
pub const PRERENDER_SCANLINE: u16 = 261;
/// Dot within a scanline where status flags toggle
pub const STATUS_DOT: u16 = 1;

/// Visible pixels per scanline
pub const SCREEN_WIDTH: usize = 256;
/// Visible scanlines, as pixels
pub const SCREEN_HEIGHT: usize = 240;

/// Size of one nametable
pub const NAMETABLE_SIZE: usize = 0x400;
/// Internal VRAM (two nametables)
pub const VRAM_SIZE: usize = 0x800;
/// Palette RAM size
pub const PALETTE_SIZE: usize = 0x20;
/// OAM size (64 sprites, 4 bytes each)
pub const OAM_SIZE: usize = 256;

/// PPUCTRL bit: NMI on VBlank
pub const CTRL_NMI_ENABLE: u8 = 0x80;
/// PPUCTRL bit: VRAM address increments by 32 instead of 1
pub const CTRL_INCREMENT_32: u8 = 0x04;
/// PPUCTRL bit: 8x16 sprites
pub const CTRL_SPRITE_16: u8 = 0x20;

/// Dot where sprite evaluation for the current scanline begins
pub const SPRITE_EVAL_DOT: u16 = 65;
/// In-range sprites a scanline can hold before the overflow flag sets
pub const SPRITES_PER_SCANLINE: u8 = 8;

/// PPUMASK bits: background or sprite rendering enabled
pub const MASK_RENDERING: u8 = 0x18;

/// PPUSTATUS bit: sprite overflow
pub const STATUS_SPRITE_OVERFLOW: u8 = 0x20;
/// PPUSTATUS bit: sprite zero hit
pub const STATUS_SPRITE_ZERO_HIT: u8 = 0x40;
/// PPUSTATUS bit: vertical blank
pub const STATUS_VBLANK: u8 = 0x80;
