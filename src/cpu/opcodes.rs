// 6502 opcode decode table
//
// One entry per possible opcode byte. The table drives both the execution
// core and the disassembler, so it records everything either needs: the
// mnemonic, addressing mode, instruction length in bytes, base cycle count,
// whether a page cross adds a cycle, and whether the opcode is part of the
// documented instruction set.
//
// Undocumented opcodes carry their conventional mnemonics (LAX, SLO, ...)
// and the timings observed on real silicon. Whether they execute or trap is
// decided by the hardware profile, not here.

use crate::cpu::addressing::AddressingMode;
use crate::cpu::addressing::AddressingMode::*;

/// Static decode information for one opcode
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Three-letter mnemonic
    pub mnemonic: &'static str,
    /// Addressing mode
    pub mode: AddressingMode,
    /// Total instruction length in bytes (opcode + operands)
    pub bytes: u8,
    /// Base cycle count
    pub cycles: u8,
    /// Whether a page cross during indexing costs one extra cycle
    pub page_cycle: bool,
    /// Whether this opcode belongs to the documented instruction set
    pub official: bool,
}

const fn op(
    mnemonic: &'static str,
    mode: AddressingMode,
    bytes: u8,
    cycles: u8,
    page_cycle: bool,
) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        bytes,
        cycles,
        page_cycle,
        official: true,
    }
}

const fn ill(
    mnemonic: &'static str,
    mode: AddressingMode,
    bytes: u8,
    cycles: u8,
    page_cycle: bool,
) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        bytes,
        cycles,
        page_cycle,
        official: false,
    }
}

/// The full 256-entry decode table, indexed by opcode byte
pub static OPCODE_TABLE: [OpcodeInfo; 256] = build_table();

#[allow(clippy::too_many_lines)]
const fn build_table() -> [OpcodeInfo; 256] {
    // Unfilled slots are the JAM/KIL opcodes that halt a real 6502.
    let mut t = [ill("JAM", Implied, 1, 2, false); 256];

    // ========================================
    // Load / Store
    // ========================================
    t[0xA9] = op("LDA", Immediate, 2, 2, false);
    t[0xA5] = op("LDA", ZeroPage, 2, 3, false);
    t[0xB5] = op("LDA", ZeroPageX, 2, 4, false);
    t[0xAD] = op("LDA", Absolute, 3, 4, false);
    t[0xBD] = op("LDA", AbsoluteX, 3, 4, true);
    t[0xB9] = op("LDA", AbsoluteY, 3, 4, true);
    t[0xA1] = op("LDA", IndexedIndirect, 2, 6, false);
    t[0xB1] = op("LDA", IndirectIndexed, 2, 5, true);
    t[0xA2] = op("LDX", Immediate, 2, 2, false);
    t[0xA6] = op("LDX", ZeroPage, 2, 3, false);
    t[0xB6] = op("LDX", ZeroPageY, 2, 4, false);
    t[0xAE] = op("LDX", Absolute, 3, 4, false);
    t[0xBE] = op("LDX", AbsoluteY, 3, 4, true);
    t[0xA0] = op("LDY", Immediate, 2, 2, false);
    t[0xA4] = op("LDY", ZeroPage, 2, 3, false);
    t[0xB4] = op("LDY", ZeroPageX, 2, 4, false);
    t[0xAC] = op("LDY", Absolute, 3, 4, false);
    t[0xBC] = op("LDY", AbsoluteX, 3, 4, true);
    t[0x85] = op("STA", ZeroPage, 2, 3, false);
    t[0x95] = op("STA", ZeroPageX, 2, 4, false);
    t[0x8D] = op("STA", Absolute, 3, 4, false);
    t[0x9D] = op("STA", AbsoluteX, 3, 5, false);
    t[0x99] = op("STA", AbsoluteY, 3, 5, false);
    t[0x81] = op("STA", IndexedIndirect, 2, 6, false);
    t[0x91] = op("STA", IndirectIndexed, 2, 6, false);
    t[0x86] = op("STX", ZeroPage, 2, 3, false);
    t[0x96] = op("STX", ZeroPageY, 2, 4, false);
    t[0x8E] = op("STX", Absolute, 3, 4, false);
    t[0x84] = op("STY", ZeroPage, 2, 3, false);
    t[0x94] = op("STY", ZeroPageX, 2, 4, false);
    t[0x8C] = op("STY", Absolute, 3, 4, false);

    // ========================================
    // Arithmetic
    // ========================================
    t[0x69] = op("ADC", Immediate, 2, 2, false);
    t[0x65] = op("ADC", ZeroPage, 2, 3, false);
    t[0x75] = op("ADC", ZeroPageX, 2, 4, false);
    t[0x6D] = op("ADC", Absolute, 3, 4, false);
    t[0x7D] = op("ADC", AbsoluteX, 3, 4, true);
    t[0x79] = op("ADC", AbsoluteY, 3, 4, true);
    t[0x61] = op("ADC", IndexedIndirect, 2, 6, false);
    t[0x71] = op("ADC", IndirectIndexed, 2, 5, true);
    t[0xE9] = op("SBC", Immediate, 2, 2, false);
    t[0xE5] = op("SBC", ZeroPage, 2, 3, false);
    t[0xF5] = op("SBC", ZeroPageX, 2, 4, false);
    t[0xED] = op("SBC", Absolute, 3, 4, false);
    t[0xFD] = op("SBC", AbsoluteX, 3, 4, true);
    t[0xF9] = op("SBC", AbsoluteY, 3, 4, true);
    t[0xE1] = op("SBC", IndexedIndirect, 2, 6, false);
    t[0xF1] = op("SBC", IndirectIndexed, 2, 5, true);
    t[0xE6] = op("INC", ZeroPage, 2, 5, false);
    t[0xF6] = op("INC", ZeroPageX, 2, 6, false);
    t[0xEE] = op("INC", Absolute, 3, 6, false);
    t[0xFE] = op("INC", AbsoluteX, 3, 7, false);
    t[0xE8] = op("INX", Implied, 1, 2, false);
    t[0xC8] = op("INY", Implied, 1, 2, false);
    t[0xC6] = op("DEC", ZeroPage, 2, 5, false);
    t[0xD6] = op("DEC", ZeroPageX, 2, 6, false);
    t[0xCE] = op("DEC", Absolute, 3, 6, false);
    t[0xDE] = op("DEC", AbsoluteX, 3, 7, false);
    t[0xCA] = op("DEX", Implied, 1, 2, false);
    t[0x88] = op("DEY", Implied, 1, 2, false);

    // ========================================
    // Logic
    // ========================================
    t[0x29] = op("AND", Immediate, 2, 2, false);
    t[0x25] = op("AND", ZeroPage, 2, 3, false);
    t[0x35] = op("AND", ZeroPageX, 2, 4, false);
    t[0x2D] = op("AND", Absolute, 3, 4, false);
    t[0x3D] = op("AND", AbsoluteX, 3, 4, true);
    t[0x39] = op("AND", AbsoluteY, 3, 4, true);
    t[0x21] = op("AND", IndexedIndirect, 2, 6, false);
    t[0x31] = op("AND", IndirectIndexed, 2, 5, true);
    t[0x09] = op("ORA", Immediate, 2, 2, false);
    t[0x05] = op("ORA", ZeroPage, 2, 3, false);
    t[0x15] = op("ORA", ZeroPageX, 2, 4, false);
    t[0x0D] = op("ORA", Absolute, 3, 4, false);
    t[0x1D] = op("ORA", AbsoluteX, 3, 4, true);
    t[0x19] = op("ORA", AbsoluteY, 3, 4, true);
    t[0x01] = op("ORA", IndexedIndirect, 2, 6, false);
    t[0x11] = op("ORA", IndirectIndexed, 2, 5, true);
    t[0x49] = op("EOR", Immediate, 2, 2, false);
    t[0x45] = op("EOR", ZeroPage, 2, 3, false);
    t[0x55] = op("EOR", ZeroPageX, 2, 4, false);
    t[0x4D] = op("EOR", Absolute, 3, 4, false);
    t[0x5D] = op("EOR", AbsoluteX, 3, 4, true);
    t[0x59] = op("EOR", AbsoluteY, 3, 4, true);
    t[0x41] = op("EOR", IndexedIndirect, 2, 6, false);
    t[0x51] = op("EOR", IndirectIndexed, 2, 5, true);
    t[0x24] = op("BIT", ZeroPage, 2, 3, false);
    t[0x2C] = op("BIT", Absolute, 3, 4, false);

    // ========================================
    // Shift / Rotate
    // ========================================
    t[0x0A] = op("ASL", Accumulator, 1, 2, false);
    t[0x06] = op("ASL", ZeroPage, 2, 5, false);
    t[0x16] = op("ASL", ZeroPageX, 2, 6, false);
    t[0x0E] = op("ASL", Absolute, 3, 6, false);
    t[0x1E] = op("ASL", AbsoluteX, 3, 7, false);
    t[0x4A] = op("LSR", Accumulator, 1, 2, false);
    t[0x46] = op("LSR", ZeroPage, 2, 5, false);
    t[0x56] = op("LSR", ZeroPageX, 2, 6, false);
    t[0x4E] = op("LSR", Absolute, 3, 6, false);
    t[0x5E] = op("LSR", AbsoluteX, 3, 7, false);
    t[0x2A] = op("ROL", Accumulator, 1, 2, false);
    t[0x26] = op("ROL", ZeroPage, 2, 5, false);
    t[0x36] = op("ROL", ZeroPageX, 2, 6, false);
    t[0x2E] = op("ROL", Absolute, 3, 6, false);
    t[0x3E] = op("ROL", AbsoluteX, 3, 7, false);
    t[0x6A] = op("ROR", Accumulator, 1, 2, false);
    t[0x66] = op("ROR", ZeroPage, 2, 5, false);
    t[0x76] = op("ROR", ZeroPageX, 2, 6, false);
    t[0x6E] = op("ROR", Absolute, 3, 6, false);
    t[0x7E] = op("ROR", AbsoluteX, 3, 7, false);

    // ========================================
    // Compare
    // ========================================
    t[0xC9] = op("CMP", Immediate, 2, 2, false);
    t[0xC5] = op("CMP", ZeroPage, 2, 3, false);
    t[0xD5] = op("CMP", ZeroPageX, 2, 4, false);
    t[0xCD] = op("CMP", Absolute, 3, 4, false);
    t[0xDD] = op("CMP", AbsoluteX, 3, 4, true);
    t[0xD9] = op("CMP", AbsoluteY, 3, 4, true);
    t[0xC1] = op("CMP", IndexedIndirect, 2, 6, false);
    t[0xD1] = op("CMP", IndirectIndexed, 2, 5, true);
    t[0xE0] = op("CPX", Immediate, 2, 2, false);
    t[0xE4] = op("CPX", ZeroPage, 2, 3, false);
    t[0xEC] = op("CPX", Absolute, 3, 4, false);
    t[0xC0] = op("CPY", Immediate, 2, 2, false);
    t[0xC4] = op("CPY", ZeroPage, 2, 3, false);
    t[0xCC] = op("CPY", Absolute, 3, 4, false);

    // ========================================
    // Branches (cycle penalties are computed at execution time)
    // ========================================
    t[0x90] = op("BCC", Relative, 2, 2, false);
    t[0xB0] = op("BCS", Relative, 2, 2, false);
    t[0xF0] = op("BEQ", Relative, 2, 2, false);
    t[0x30] = op("BMI", Relative, 2, 2, false);
    t[0xD0] = op("BNE", Relative, 2, 2, false);
    t[0x10] = op("BPL", Relative, 2, 2, false);
    t[0x50] = op("BVC", Relative, 2, 2, false);
    t[0x70] = op("BVS", Relative, 2, 2, false);

    // ========================================
    // Jumps / Subroutines
    // ========================================
    t[0x4C] = op("JMP", Absolute, 3, 3, false);
    t[0x6C] = op("JMP", Indirect, 3, 5, false);
    t[0x20] = op("JSR", Absolute, 3, 6, false);
    t[0x60] = op("RTS", Implied, 1, 6, false);

    // ========================================
    // Stack
    // ========================================
    t[0x48] = op("PHA", Implied, 1, 3, false);
    t[0x08] = op("PHP", Implied, 1, 3, false);
    t[0x68] = op("PLA", Implied, 1, 4, false);
    t[0x28] = op("PLP", Implied, 1, 4, false);
    t[0x9A] = op("TXS", Implied, 1, 2, false);
    t[0xBA] = op("TSX", Implied, 1, 2, false);

    // ========================================
    // Transfers
    // ========================================
    t[0xAA] = op("TAX", Implied, 1, 2, false);
    t[0xA8] = op("TAY", Implied, 1, 2, false);
    t[0x8A] = op("TXA", Implied, 1, 2, false);
    t[0x98] = op("TYA", Implied, 1, 2, false);

    // ========================================
    // Flags
    // ========================================
    t[0x18] = op("CLC", Implied, 1, 2, false);
    t[0xD8] = op("CLD", Implied, 1, 2, false);
    t[0x58] = op("CLI", Implied, 1, 2, false);
    t[0xB8] = op("CLV", Implied, 1, 2, false);
    t[0x38] = op("SEC", Implied, 1, 2, false);
    t[0xF8] = op("SED", Implied, 1, 2, false);
    t[0x78] = op("SEI", Implied, 1, 2, false);

    // ========================================
    // Interrupt / Misc
    // ========================================
    t[0x00] = op("BRK", Implied, 1, 7, false);
    t[0x40] = op("RTI", Implied, 1, 6, false);
    t[0xEA] = op("NOP", Implied, 1, 2, false);

    // ========================================
    // Undocumented opcodes (stable NOP family)
    // ========================================
    t[0x1A] = ill("NOP", Implied, 1, 2, false);
    t[0x3A] = ill("NOP", Implied, 1, 2, false);
    t[0x5A] = ill("NOP", Implied, 1, 2, false);
    t[0x7A] = ill("NOP", Implied, 1, 2, false);
    t[0xDA] = ill("NOP", Implied, 1, 2, false);
    t[0xFA] = ill("NOP", Implied, 1, 2, false);
    t[0x80] = ill("NOP", Immediate, 2, 2, false);
    t[0x82] = ill("NOP", Immediate, 2, 2, false);
    t[0x89] = ill("NOP", Immediate, 2, 2, false);
    t[0xC2] = ill("NOP", Immediate, 2, 2, false);
    t[0xE2] = ill("NOP", Immediate, 2, 2, false);
    t[0x04] = ill("NOP", ZeroPage, 2, 3, false);
    t[0x44] = ill("NOP", ZeroPage, 2, 3, false);
    t[0x64] = ill("NOP", ZeroPage, 2, 3, false);
    t[0x14] = ill("NOP", ZeroPageX, 2, 4, false);
    t[0x34] = ill("NOP", ZeroPageX, 2, 4, false);
    t[0x54] = ill("NOP", ZeroPageX, 2, 4, false);
    t[0x74] = ill("NOP", ZeroPageX, 2, 4, false);
    t[0xD4] = ill("NOP", ZeroPageX, 2, 4, false);
    t[0xF4] = ill("NOP", ZeroPageX, 2, 4, false);
    t[0x0C] = ill("NOP", Absolute, 3, 4, false);
    t[0x1C] = ill("NOP", AbsoluteX, 3, 4, true);
    t[0x3C] = ill("NOP", AbsoluteX, 3, 4, true);
    t[0x5C] = ill("NOP", AbsoluteX, 3, 4, true);
    t[0x7C] = ill("NOP", AbsoluteX, 3, 4, true);
    t[0xDC] = ill("NOP", AbsoluteX, 3, 4, true);
    t[0xFC] = ill("NOP", AbsoluteX, 3, 4, true);

    // ========================================
    // Undocumented opcodes (combined operations)
    // ========================================
    t[0xA7] = ill("LAX", ZeroPage, 2, 3, false);
    t[0xB7] = ill("LAX", ZeroPageY, 2, 4, false);
    t[0xAF] = ill("LAX", Absolute, 3, 4, false);
    t[0xBF] = ill("LAX", AbsoluteY, 3, 4, true);
    t[0xA3] = ill("LAX", IndexedIndirect, 2, 6, false);
    t[0xB3] = ill("LAX", IndirectIndexed, 2, 5, true);
    t[0x87] = ill("SAX", ZeroPage, 2, 3, false);
    t[0x97] = ill("SAX", ZeroPageY, 2, 4, false);
    t[0x8F] = ill("SAX", Absolute, 3, 4, false);
    t[0x83] = ill("SAX", IndexedIndirect, 2, 6, false);
    t[0xEB] = ill("SBC", Immediate, 2, 2, false);
    t[0xC7] = ill("DCP", ZeroPage, 2, 5, false);
    t[0xD7] = ill("DCP", ZeroPageX, 2, 6, false);
    t[0xCF] = ill("DCP", Absolute, 3, 6, false);
    t[0xDF] = ill("DCP", AbsoluteX, 3, 7, false);
    t[0xDB] = ill("DCP", AbsoluteY, 3, 7, false);
    t[0xC3] = ill("DCP", IndexedIndirect, 2, 8, false);
    t[0xD3] = ill("DCP", IndirectIndexed, 2, 8, false);
    t[0xE7] = ill("ISB", ZeroPage, 2, 5, false);
    t[0xF7] = ill("ISB", ZeroPageX, 2, 6, false);
    t[0xEF] = ill("ISB", Absolute, 3, 6, false);
    t[0xFF] = ill("ISB", AbsoluteX, 3, 7, false);
    t[0xFB] = ill("ISB", AbsoluteY, 3, 7, false);
    t[0xE3] = ill("ISB", IndexedIndirect, 2, 8, false);
    t[0xF3] = ill("ISB", IndirectIndexed, 2, 8, false);
    t[0x07] = ill("SLO", ZeroPage, 2, 5, false);
    t[0x17] = ill("SLO", ZeroPageX, 2, 6, false);
    t[0x0F] = ill("SLO", Absolute, 3, 6, false);
    t[0x1F] = ill("SLO", AbsoluteX, 3, 7, false);
    t[0x1B] = ill("SLO", AbsoluteY, 3, 7, false);
    t[0x03] = ill("SLO", IndexedIndirect, 2, 8, false);
    t[0x13] = ill("SLO", IndirectIndexed, 2, 8, false);
    t[0x27] = ill("RLA", ZeroPage, 2, 5, false);
    t[0x37] = ill("RLA", ZeroPageX, 2, 6, false);
    t[0x2F] = ill("RLA", Absolute, 3, 6, false);
    t[0x3F] = ill("RLA", AbsoluteX, 3, 7, false);
    t[0x3B] = ill("RLA", AbsoluteY, 3, 7, false);
    t[0x23] = ill("RLA", IndexedIndirect, 2, 8, false);
    t[0x33] = ill("RLA", IndirectIndexed, 2, 8, false);
    t[0x47] = ill("SRE", ZeroPage, 2, 5, false);
    t[0x57] = ill("SRE", ZeroPageX, 2, 6, false);
    t[0x4F] = ill("SRE", Absolute, 3, 6, false);
    t[0x5F] = ill("SRE", AbsoluteX, 3, 7, false);
    t[0x5B] = ill("SRE", AbsoluteY, 3, 7, false);
    t[0x43] = ill("SRE", IndexedIndirect, 2, 8, false);
    t[0x53] = ill("SRE", IndirectIndexed, 2, 8, false);
    t[0x67] = ill("RRA", ZeroPage, 2, 5, false);
    t[0x77] = ill("RRA", ZeroPageX, 2, 6, false);
    t[0x6F] = ill("RRA", Absolute, 3, 6, false);
    t[0x7F] = ill("RRA", AbsoluteX, 3, 7, false);
    t[0x7B] = ill("RRA", AbsoluteY, 3, 7, false);
    t[0x63] = ill("RRA", IndexedIndirect, 2, 8, false);
    t[0x73] = ill("RRA", IndirectIndexed, 2, 8, false);

    // ========================================
    // Undocumented opcodes (unstable; timed no-ops under Emulate)
    // ========================================
    t[0x0B] = ill("ANC", Immediate, 2, 2, false);
    t[0x2B] = ill("ANC", Immediate, 2, 2, false);
    t[0x4B] = ill("ALR", Immediate, 2, 2, false);
    t[0x6B] = ill("ARR", Immediate, 2, 2, false);
    t[0x8B] = ill("ANE", Immediate, 2, 2, false);
    t[0xAB] = ill("LXA", Immediate, 2, 2, false);
    t[0xCB] = ill("SBX", Immediate, 2, 2, false);
    t[0xBB] = ill("LAS", AbsoluteY, 3, 4, true);
    t[0x9B] = ill("TAS", AbsoluteY, 3, 5, false);
    t[0x9C] = ill("SHY", AbsoluteX, 3, 5, false);
    t[0x9E] = ill("SHX", AbsoluteY, 3, 5, false);
    t[0x9F] = ill("SHA", AbsoluteY, 3, 5, false);
    t[0x93] = ill("SHA", IndirectIndexed, 2, 6, false);

    t
}
