// Memory inspection
//
// Owned memory window snapshots taken through the side-effect-free peek
// path, plus hex dump rendering and address-region classification for a
// frontend to color-code.

use crate::bus::Bus;

/// What kind of hardware sits behind a CPU address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Internal RAM ($0000-$07FF and its mirrors)
    Ram,
    /// The stack page ($0100-$01FF, including mirrored aliases)
    Stack,
    /// PPU register window ($2000-$3FFF)
    PpuRegisters,
    /// APU and I/O ports ($4000-$401F)
    Io,
    /// Cartridge space ($4020-$FFFF)
    Cartridge,
}

/// Classify a CPU address for display purposes
pub fn region_kind(address: u16) -> RegionKind {
    match address {
        0x0000..=0x1FFF => {
            if (0x0100..=0x01FF).contains(&(address & 0x07FF)) {
                RegionKind::Stack
            } else {
                RegionKind::Ram
            }
        }
        0x2000..=0x3FFF => RegionKind::PpuRegisters,
        0x4000..=0x401F => RegionKind::Io,
        _ => RegionKind::Cartridge,
    }
}

/// An owned copy of a window of CPU address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// First address in the window
    pub start: u16,
    /// The bytes, in address order
    pub bytes: Vec<u8>,
}

impl MemorySnapshot {
    /// Capture `length` bytes starting at `start` without side effects
    pub fn capture(bus: &Bus, start: u16, length: usize) -> Self {
        let mut bytes = Vec::with_capacity(length);
        for offset in 0..length {
            bytes.push(bus.peek(start.wrapping_add(offset as u16)));
        }
        MemorySnapshot { start, bytes }
    }

    /// The byte at an absolute address, if it falls inside the window
    pub fn byte_at(&self, address: u16) -> Option<u8> {
        let offset = address.wrapping_sub(self.start) as usize;
        self.bytes.get(offset).copied()
    }

    /// Render as a classic hex dump, 16 bytes per row with ASCII gutter
    pub fn hex_dump(&self) -> String {
        let mut out = String::new();
        for (row_index, row) in self.bytes.chunks(16).enumerate() {
            let row_addr = self.start.wrapping_add((row_index * 16) as u16);
            out.push_str(&format!("{:04X}: ", row_addr));

            for (i, byte) in row.iter().enumerate() {
                out.push_str(&format!("{:02X} ", byte));
                if i == 7 {
                    out.push(' ');
                }
            }
            // Pad short final rows so the gutter lines up
            for i in row.len()..16 {
                out.push_str("   ");
                if i == 7 {
                    out.push(' ');
                }
            }

            out.push(' ');
            for byte in row {
                let c = *byte as char;
                out.push(if c.is_ascii_graphic() || c == ' ' { c } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl crate::debug::disassembler::ByteSource for MemorySnapshot {
    fn byte_at(&self, address: u16) -> u8 {
        MemorySnapshot::byte_at(self, address).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_classification() {
        assert_eq!(region_kind(0x0000), RegionKind::Ram);
        assert_eq!(region_kind(0x0150), RegionKind::Stack);
        assert_eq!(region_kind(0x0950), RegionKind::Stack, "mirror of the stack page");
        assert_eq!(region_kind(0x2345), RegionKind::PpuRegisters);
        assert_eq!(region_kind(0x4014), RegionKind::Io);
        assert_eq!(region_kind(0x8000), RegionKind::Cartridge);
    }

    #[test]
    fn test_capture_copies_bytes() {
        let mut bus = Bus::new();
        bus.write(0x0100, 0xDE);
        bus.write(0x0101, 0xAD);

        let snapshot = MemorySnapshot::capture(&bus, 0x0100, 4);
        assert_eq!(snapshot.byte_at(0x0100), Some(0xDE));
        assert_eq!(snapshot.byte_at(0x0101), Some(0xAD));
        assert_eq!(snapshot.byte_at(0x0104), None, "outside the window");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut bus = Bus::new();
        bus.write(0x0000, 0x01);
        let snapshot = MemorySnapshot::capture(&bus, 0x0000, 1);

        bus.write(0x0000, 0x02);
        assert_eq!(snapshot.byte_at(0x0000), Some(0x01), "snapshot does not track");
    }

    #[test]
    fn test_hex_dump_layout() {
        let mut bus = Bus::new();
        for i in 0..16u16 {
            bus.write(0x0200 + i, b'A' + i as u8);
        }
        let snapshot = MemorySnapshot::capture(&bus, 0x0200, 16);
        let dump = snapshot.hex_dump();

        assert!(dump.starts_with("0200: 41 42"));
        assert!(dump.contains("ABCDEFGHIJKLMNOP"), "ASCII gutter present");
    }
}
