// Register bank behavior: the shared write latch, buffered PPUDATA reads,
// PPUSTATUS side effects, OAM access

use crate::ppu::constants::*;
use crate::ppu::registers::*;
use crate::ppu::Ppu;

/// Point v at an address through the $2006 write pair
fn set_vram_addr(ppu: &mut Ppu, address: u16) {
    ppu.write_register(None, PPUADDR, (address >> 8) as u8);
    ppu.write_register(None, PPUADDR, (address & 0xFF) as u8);
}

#[test]
fn test_ppuaddr_write_pair() {
    let mut ppu = Ppu::new();
    set_vram_addr(&mut ppu, 0x2100);
    assert_eq!(ppu.v, 0x2100, "v latches from t after the second write");
}

#[test]
fn test_status_read_resets_write_latch() {
    let mut ppu = Ppu::new();
    ppu.write_register(None, PPUADDR, 0x21); // first write of a pair
    ppu.read_register(None, PPUSTATUS);
    set_vram_addr(&mut ppu, 0x2300);
    assert_eq!(ppu.v, 0x2300, "latch reset made the next write a first write");
}

#[test]
fn test_status_read_clears_vblank() {
    let mut ppu = Ppu::new();
    ppu.status |= STATUS_VBLANK;

    let value = ppu.read_register(None, PPUSTATUS);
    assert!(value & STATUS_VBLANK != 0, "read observes the flag");
    let value = ppu.read_register(None, PPUSTATUS);
    assert!(value & STATUS_VBLANK == 0, "and clears it");
}

#[test]
fn test_ppudata_read_is_buffered() {
    let mut ppu = Ppu::new();
    set_vram_addr(&mut ppu, 0x2100);
    ppu.write_register(None, PPUDATA, 0xAA);
    ppu.write_register(None, PPUDATA, 0xBB);

    set_vram_addr(&mut ppu, 0x2100);
    let stale = ppu.read_register(None, PPUDATA);
    let first = ppu.read_register(None, PPUDATA);
    let second = ppu.read_register(None, PPUDATA);
    assert_ne!(stale, 0xAA, "first read returns the stale buffer");
    assert_eq!(first, 0xAA);
    assert_eq!(second, 0xBB);
}

#[test]
fn test_palette_read_bypasses_buffer() {
    let mut ppu = Ppu::new();
    set_vram_addr(&mut ppu, 0x3F01);
    ppu.write_register(None, PPUDATA, 0x17);

    set_vram_addr(&mut ppu, 0x3F01);
    let value = ppu.read_register(None, PPUDATA);
    assert_eq!(value, 0x17, "palette data arrives without the one-read delay");
}

#[test]
fn test_vram_increment_follows_ctrl() {
    let mut ppu = Ppu::new();
    set_vram_addr(&mut ppu, 0x2000);
    ppu.read_register(None, PPUDATA);
    assert_eq!(ppu.v, 0x2001);

    ppu.write_register(None, PPUCTRL, CTRL_INCREMENT_32);
    ppu.read_register(None, PPUDATA);
    assert_eq!(ppu.v, 0x2021, "increment switches to 32");
}

#[test]
fn test_oam_write_autoincrements() {
    let mut ppu = Ppu::new();
    ppu.write_register(None, OAMADDR, 0x10);
    ppu.write_register(None, OAMDATA, 0x01);
    ppu.write_register(None, OAMDATA, 0x02);

    assert_eq!(ppu.oam[0x10], 0x01);
    assert_eq!(ppu.oam[0x11], 0x02);

    ppu.write_register(None, OAMADDR, 0x10);
    assert_eq!(ppu.read_register(None, OAMDATA), 0x01);
    assert_eq!(ppu.oam_addr, 0x10, "reads do not increment");
}

#[test]
fn test_peek_register_has_no_side_effects() {
    let mut ppu = Ppu::new();
    ppu.status |= STATUS_VBLANK;
    ppu.write_register(None, PPUADDR, 0x21);

    let peeked = ppu.peek_register(None, PPUSTATUS);
    assert!(peeked & STATUS_VBLANK != 0);
    assert!(ppu.status & STATUS_VBLANK != 0, "flag survives a peek");
    assert!(ppu.write_latch, "latch survives a peek");

    set_vram_addr(&mut ppu, 0x2150);
    let v_before = ppu.v;
    ppu.peek_register(None, PPUDATA);
    assert_eq!(ppu.v, v_before, "peek does not advance v");
}

#[test]
fn test_scroll_write_pair_builds_t() {
    let mut ppu = Ppu::new();
    ppu.write_register(None, PPUSCROLL, 0x7D); // coarse X = 15, fine X = 5
    assert_eq!(ppu.fine_x, 5);
    assert_eq!(ppu.t & 0x001F, 15);

    ppu.write_register(None, PPUSCROLL, 0x5E); // coarse Y = 11, fine Y = 6
    assert_eq!((ppu.t >> 5) & 0x1F, 11);
    assert_eq!((ppu.t >> 12) & 0x07, 6);
}

#[test]
fn test_write_only_registers_read_back_bus_value() {
    let mut ppu = Ppu::new();
    ppu.write_register(None, PPUMASK, 0x5A);
    assert_eq!(ppu.read_register(None, PPUCTRL), 0x5A, "open bits decay to last write");
}
