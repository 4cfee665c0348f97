// Addressing mode resolution for the 6502
//
// Every instruction carries one of thirteen addressing modes. Resolution
// happens once, at the fetch cycle of an instruction, and produces an
// `Operand` that the instruction implementations consume. Page-cross
// detection is recorded here so the execution core can charge the extra
// cycle where the opcode table says one applies.

use crate::bus::Bus;
use crate::cpu::Cpu;

/// The thirteen 6502 addressing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand (e.g., CLC, RTS)
    Implied,
    /// Operates on the accumulator (e.g., ASL A)
    Accumulator,
    /// Operand is the byte following the opcode (e.g., LDA #$42)
    Immediate,
    /// One-byte address into page zero (e.g., LDA $10)
    ZeroPage,
    /// Zero-page address indexed by X, wrapping within page zero
    ZeroPageX,
    /// Zero-page address indexed by Y, wrapping within page zero
    ZeroPageY,
    /// Signed 8-bit branch displacement from the next instruction
    Relative,
    /// Full 16-bit address (e.g., JMP $8000)
    Absolute,
    /// Absolute address indexed by X
    AbsoluteX,
    /// Absolute address indexed by Y
    AbsoluteY,
    /// 16-bit pointer dereference, used only by JMP (with the page-wrap bug)
    Indirect,
    /// ($nn,X): zero-page pointer indexed by X before the dereference
    IndexedIndirect,
    /// ($nn),Y: zero-page pointer dereferenced, then indexed by Y
    IndirectIndexed,
}

/// Resolved operand for one instruction
///
/// `value` is populated only for Immediate mode; everything else goes
/// through `address`. `page_crossed` is true when indexing moved the
/// effective address into a different 256-byte page than the base.
#[derive(Debug, Clone, Copy)]
pub struct Operand {
    /// Effective address (0 for Implied/Accumulator/Immediate)
    pub address: u16,
    /// Immediate value, if the mode carries one inline
    pub value: Option<u8>,
    /// Whether indexing crossed a page boundary
    pub page_crossed: bool,
}

impl Operand {
    const NONE: Operand = Operand {
        address: 0,
        value: None,
        page_crossed: false,
    };
}

/// True when two addresses fall in different 256-byte pages
#[inline]
fn pages_differ(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

impl Cpu {
    /// Fetch the next program byte and advance PC
    #[inline]
    fn fetch_byte(&mut self, bus: &mut Bus) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// Fetch the next two program bytes as a little-endian word
    #[inline]
    fn fetch_word(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        (hi << 8) | lo
    }

    /// Resolve the operand for the given addressing mode
    ///
    /// Consumes the operand bytes following the opcode (advancing PC) and
    /// computes the effective address. This is the single entry point the
    /// execution core uses; the mode comes from the opcode table.
    pub(crate) fn resolve_operand(&mut self, bus: &mut Bus, mode: AddressingMode) -> Operand {
        match mode {
            AddressingMode::Implied | AddressingMode::Accumulator => Operand::NONE,

            AddressingMode::Immediate => {
                let value = self.fetch_byte(bus);
                Operand {
                    value: Some(value),
                    ..Operand::NONE
                }
            }

            AddressingMode::ZeroPage => {
                let address = self.fetch_byte(bus) as u16;
                Operand {
                    address,
                    ..Operand::NONE
                }
            }

            AddressingMode::ZeroPageX => {
                // Indexing wraps within page zero, never into page one
                let address = self.fetch_byte(bus).wrapping_add(self.x) as u16;
                Operand {
                    address,
                    ..Operand::NONE
                }
            }

            AddressingMode::ZeroPageY => {
                let address = self.fetch_byte(bus).wrapping_add(self.y) as u16;
                Operand {
                    address,
                    ..Operand::NONE
                }
            }

            AddressingMode::Relative => {
                let offset = self.fetch_byte(bus) as i8;
                // Displacement is relative to the instruction that follows
                let target = self.pc.wrapping_add_signed(offset as i16);
                Operand {
                    address: target,
                    value: None,
                    page_crossed: pages_differ(self.pc, target),
                }
            }

            AddressingMode::Absolute => {
                let address = self.fetch_word(bus);
                Operand {
                    address,
                    ..Operand::NONE
                }
            }

            AddressingMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                let address = base.wrapping_add(self.x as u16);
                Operand {
                    address,
                    value: None,
                    page_crossed: pages_differ(base, address),
                }
            }

            AddressingMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                let address = base.wrapping_add(self.y as u16);
                Operand {
                    address,
                    value: None,
                    page_crossed: pages_differ(base, address),
                }
            }

            AddressingMode::Indirect => {
                // JMP ($xxFF) fetches the high pointer byte from the start
                // of the same page instead of the next one. Real hardware
                // quirk, relied upon by test ROMs.
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr) as u16;
                let hi_addr = if ptr & 0x00FF == 0x00FF {
                    ptr & 0xFF00
                } else {
                    ptr.wrapping_add(1)
                };
                let hi = bus.read(hi_addr) as u16;
                Operand {
                    address: (hi << 8) | lo,
                    ..Operand::NONE
                }
            }

            AddressingMode::IndexedIndirect => {
                let ptr = self.fetch_byte(bus).wrapping_add(self.x);
                let lo = bus.read(ptr as u16) as u16;
                let hi = bus.read(ptr.wrapping_add(1) as u16) as u16;
                Operand {
                    address: (hi << 8) | lo,
                    ..Operand::NONE
                }
            }

            AddressingMode::IndirectIndexed => {
                let ptr = self.fetch_byte(bus);
                let lo = bus.read(ptr as u16) as u16;
                let hi = bus.read(ptr.wrapping_add(1) as u16) as u16;
                let base = (hi << 8) | lo;
                let address = base.wrapping_add(self.y as u16);
                Operand {
                    address,
                    value: None,
                    page_crossed: pages_differ(base, address),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_and_bus() -> (Cpu, Bus) {
        (Cpu::new(), Bus::new())
    }

    #[test]
    fn test_immediate_returns_inline_value() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        bus.write(0x0200, 0x42);

        let op = cpu.resolve_operand(&mut bus, AddressingMode::Immediate);
        assert_eq!(op.value, Some(0x42));
        assert_eq!(cpu.pc, 0x0201, "PC should advance past the operand");
    }

    #[test]
    fn test_zero_page_x_wraps_within_page_zero() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        cpu.x = 0x10;
        bus.write(0x0200, 0xF8);

        let op = cpu.resolve_operand(&mut bus, AddressingMode::ZeroPageX);
        assert_eq!(op.address, 0x0008, "indexing must wrap inside page zero");
    }

    #[test]
    fn test_absolute_x_page_cross_detection() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        cpu.x = 0x01;
        // Base $02FF, indexed -> $0300 (crosses)
        bus.write(0x0200, 0xFF);
        bus.write(0x0201, 0x02);

        let op = cpu.resolve_operand(&mut bus, AddressingMode::AbsoluteX);
        assert_eq!(op.address, 0x0300);
        assert!(op.page_crossed, "crossing into the next page must be flagged");
    }

    #[test]
    fn test_absolute_y_no_page_cross() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        cpu.y = 0x01;
        bus.write(0x0200, 0x00);
        bus.write(0x0201, 0x03);

        let op = cpu.resolve_operand(&mut bus, AddressingMode::AbsoluteY);
        assert_eq!(op.address, 0x0301);
        assert!(!op.page_crossed);
    }

    #[test]
    fn test_relative_forward_and_backward() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        bus.write(0x0200, 0x10); // +16

        let op = cpu.resolve_operand(&mut bus, AddressingMode::Relative);
        assert_eq!(op.address, 0x0211);

        cpu.pc = 0x0200;
        bus.write(0x0200, 0xF0); // -16
        let op = cpu.resolve_operand(&mut bus, AddressingMode::Relative);
        assert_eq!(op.address, 0x01F1);
        assert!(op.page_crossed, "branch back into previous page crosses");
    }

    #[test]
    fn test_indirect_page_wrap_bug() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0400;
        // Pointer $02FF: low byte from $02FF, high byte from $0200 (not $0300)
        bus.write(0x0400, 0xFF);
        bus.write(0x0401, 0x02);
        bus.write(0x02FF, 0x34);
        bus.write(0x0200, 0x12);
        bus.write(0x0300, 0xFF); // would be used without the bug

        let op = cpu.resolve_operand(&mut bus, AddressingMode::Indirect);
        assert_eq!(op.address, 0x1234, "high byte comes from $0200, not $0300");
    }

    #[test]
    fn test_indexed_indirect_pointer_wrap() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        cpu.x = 0x04;
        bus.write(0x0200, 0xFE); // ptr = $FE + X = $02
        bus.write(0x0002, 0x78);
        bus.write(0x0003, 0x56);

        let op = cpu.resolve_operand(&mut bus, AddressingMode::IndexedIndirect);
        assert_eq!(op.address, 0x5678);
    }

    #[test]
    fn test_indirect_indexed_adds_y_after_dereference() {
        let (mut cpu, mut bus) = cpu_and_bus();
        cpu.pc = 0x0200;
        cpu.y = 0x10;
        bus.write(0x0200, 0x20);
        bus.write(0x0020, 0x00);
        bus.write(0x0021, 0x40);

        let op = cpu.resolve_operand(&mut bus, AddressingMode::IndirectIndexed);
        assert_eq!(op.address, 0x4010);
        assert!(!op.page_crossed);
    }
}
