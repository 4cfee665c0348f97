// Disassembler - 6502 instruction disassembly
//
// Pure over a `ByteSource`: the same bytes always disassemble to the same
// text, whether they come from a frozen memory snapshot or a live bus
// through its side-effect-free peek path.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::opcodes::OPCODE_TABLE;

/// Anything that can hand out instruction bytes without side effects
pub trait ByteSource {
    fn byte_at(&self, address: u16) -> u8;
}

impl ByteSource for Bus {
    fn byte_at(&self, address: u16) -> u8 {
        self.peek(address)
    }
}

/// A flat byte slice rooted at a base address
pub struct SliceSource<'a> {
    pub base: u16,
    pub bytes: &'a [u8],
}

impl ByteSource for SliceSource<'_> {
    fn byte_at(&self, address: u16) -> u8 {
        let offset = address.wrapping_sub(self.base) as usize;
        self.bytes.get(offset).copied().unwrap_or(0)
    }
}

/// Disassembled instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledInstruction {
    /// Address where the instruction is located
    pub address: u16,
    /// Opcode byte
    pub opcode: u8,
    /// Mnemonic (e.g., "LDA", "STA", "JMP")
    pub mnemonic: &'static str,
    /// Addressing mode
    pub mode: AddressingMode,
    /// Operand bytes
    pub operands: Vec<u8>,
    /// Total instruction length in bytes
    pub length: u8,
    /// Whether the opcode is part of the documented set
    pub official: bool,
}

impl DisassembledInstruction {
    /// Format as assembly text, like "LDA #$42" or "JMP $8000"
    ///
    /// Undocumented opcodes carry a `*` prefix; the placeholder for a
    /// byte that is no instruction at all is "*???".
    pub fn format_assembly(&self) -> String {
        let prefix = if self.official { "" } else { "*" };
        if self.mnemonic == "JAM" {
            return format!("{}???", prefix);
        }

        let lo = self.operands.first().copied().unwrap_or(0);
        let word = if self.operands.len() >= 2 {
            (self.operands[1] as u16) << 8 | lo as u16
        } else {
            lo as u16
        };

        let operand_str = match self.mode {
            AddressingMode::Implied => String::new(),
            AddressingMode::Accumulator => " A".to_string(),
            AddressingMode::Immediate => format!(" #${:02X}", lo),
            AddressingMode::ZeroPage => format!(" ${:02X}", lo),
            AddressingMode::ZeroPageX => format!(" ${:02X},X", lo),
            AddressingMode::ZeroPageY => format!(" ${:02X},Y", lo),
            AddressingMode::Absolute => format!(" ${:04X}", word),
            AddressingMode::AbsoluteX => format!(" ${:04X},X", word),
            AddressingMode::AbsoluteY => format!(" ${:04X},Y", word),
            AddressingMode::Indirect => format!(" (${:04X})", word),
            AddressingMode::IndexedIndirect => format!(" (${:02X},X)", lo),
            AddressingMode::IndirectIndexed => format!(" (${:02X}),Y", lo),
            AddressingMode::Relative => {
                let target = self.address.wrapping_add(2).wrapping_add_signed(lo as i8 as i16);
                format!(" ${:04X}", target)
            }
        };

        format!("{}{}{}", prefix, self.mnemonic, operand_str)
    }

    /// Format the instruction bytes as hex, like "A9 42"
    pub fn format_bytes(&self) -> String {
        let mut result = format!("{:02X}", self.opcode);
        for operand in &self.operands {
            result.push_str(&format!(" {:02X}", operand));
        }
        result
    }
}

impl std::fmt::Display for DisassembledInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "${:04X}  {:8}  {}",
            self.address,
            self.format_bytes(),
            self.format_assembly()
        )
    }
}

/// Disassemble the instruction at the given address
pub fn disassemble_instruction<S: ByteSource + ?Sized>(
    addr: u16,
    source: &S,
) -> DisassembledInstruction {
    let opcode = source.byte_at(addr);
    let info = &OPCODE_TABLE[opcode as usize];

    let mut operands = Vec::with_capacity(info.bytes as usize - 1);
    for i in 1..info.bytes {
        operands.push(source.byte_at(addr.wrapping_add(i as u16)));
    }

    DisassembledInstruction {
        address: addr,
        opcode,
        mnemonic: info.mnemonic,
        mode: info.mode,
        operands,
        length: info.bytes,
        official: info.official,
    }
}

/// Disassemble every instruction whose first byte lies in `start..=end`
pub fn disassemble_range<S: ByteSource + ?Sized>(
    start: u16,
    end: u16,
    source: &S,
) -> Vec<DisassembledInstruction> {
    let mut instructions = Vec::new();
    let mut addr = start;

    while addr <= end {
        let instruction = disassemble_instruction(addr, source);
        addr = addr.wrapping_add(instruction.length as u16);
        instructions.push(instruction);

        // Wrapped past $FFFF
        if addr < start {
            break;
        }
    }

    instructions
}

/// Disassemble a fixed number of instructions starting at `start`
pub fn disassemble_count<S: ByteSource + ?Sized>(
    start: u16,
    count: usize,
    source: &S,
) -> Vec<DisassembledInstruction> {
    let mut instructions = Vec::new();
    let mut addr = start;

    for _ in 0..count {
        let instruction = disassemble_instruction(addr, source);
        addr = addr.wrapping_add(instruction.length as u16);
        instructions.push(instruction);
    }

    instructions
}
