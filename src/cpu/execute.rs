// Cycle-stepped execution core
//
// `step_cycle` advances the CPU by exactly one clock cycle. At an
// instruction boundary it fetches, decodes and applies the next
// instruction in one go, then charges the instruction's full cycle cost
// as a countdown; intermediate calls only burn the countdown. The effect
// is that architectural state moves atomically at the first cycle while
// the timing observed by the rest of the machine is cycle-exact, and a
// pause landing mid-instruction never exposes half-applied registers.
//
// Interrupts are recognized only at boundaries. NMI wins over IRQ, and
// entry costs the hardware's seven cycles.

use std::error::Error;
use std::fmt;

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::opcodes::OPCODE_TABLE;
use crate::cpu::{flags, Cpu};
use crate::profile::IllegalOpcodePolicy;

/// Cycles consumed by NMI/IRQ entry
pub const INTERRUPT_CYCLES: u8 = 7;
/// Cycles consumed by a reset sequence
pub const RESET_CYCLES: u8 = 7;

/// Outcome of one `step_cycle` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Mid-instruction; more cycles remain before the boundary
    Busy,
    /// This cycle completed the current instruction (or interrupt entry)
    InstructionComplete,
}

/// Faults the CPU can raise instead of advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuFault {
    /// An undocumented opcode was fetched while the profile says to trap
    IllegalOpcode { pc: u16, opcode: u8 },
    /// A JAM opcode wedged the core; it will not advance again until reset
    Jammed { pc: u16, opcode: u8 },
}

impl fmt::Display for CpuFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuFault::IllegalOpcode { pc, opcode } => {
                write!(f, "illegal opcode ${opcode:02X} at ${pc:04X}")
            }
            CpuFault::Jammed { pc, opcode } => {
                write!(f, "CPU jammed by opcode ${opcode:02X} at ${pc:04X}")
            }
        }
    }
}

impl Error for CpuFault {}

impl Cpu {
    /// Load PC from the reset vector and restore power-up side state
    pub fn reset(&mut self, bus: &mut Bus) {
        let lo = bus.read(self.reset_vector) as u16;
        let hi = bus.read(self.reset_vector.wrapping_add(1)) as u16;
        self.pc = (hi << 8) | lo;
        // Reset decrements SP by three without writing the stack
        self.sp = self.sp.wrapping_sub(3);
        self.set_flag(flags::INTERRUPT_DISABLE, true);
        self.pending = 0;
        self.halted = false;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.cycles += RESET_CYCLES as u64;
    }

    /// Advance the CPU by one clock cycle
    ///
    /// At an instruction boundary this services a pending interrupt or
    /// fetches and applies the next instruction; otherwise it burns one
    /// cycle of the current instruction's cost.
    pub fn step_cycle(&mut self, bus: &mut Bus) -> Result<StepResult, CpuFault> {
        if self.halted {
            return Err(CpuFault::Jammed {
                pc: self.pc,
                opcode: bus.peek(self.pc),
            });
        }

        if self.pending > 0 {
            self.pending -= 1;
            self.cycles += 1;
            return Ok(if self.pending == 0 {
                StepResult::InstructionComplete
            } else {
                StepResult::Busy
            });
        }

        // At a boundary. Interrupts are sampled before the next fetch.
        if self.nmi_pending {
            self.nmi_pending = false;
            self.enter_interrupt(bus, self.nmi_vector);
            return self.charge(INTERRUPT_CYCLES);
        }
        if self.irq_pending && !self.get_flag(flags::INTERRUPT_DISABLE) {
            self.enter_interrupt(bus, self.irq_vector);
            return self.charge(INTERRUPT_CYCLES);
        }

        let opcode_pc = self.pc;
        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        let info = &OPCODE_TABLE[opcode as usize];

        if !info.official {
            match self.illegal_policy {
                IllegalOpcodePolicy::Trap => {
                    // Leave PC on the faulting opcode so the debugger can
                    // show and resume from it.
                    self.pc = opcode_pc;
                    return Err(CpuFault::IllegalOpcode {
                        pc: opcode_pc,
                        opcode,
                    });
                }
                IllegalOpcodePolicy::Emulate if info.mnemonic == "JAM" => {
                    self.pc = opcode_pc;
                    self.halted = true;
                    return Err(CpuFault::Jammed {
                        pc: opcode_pc,
                        opcode,
                    });
                }
                IllegalOpcodePolicy::Emulate => {}
            }
        }

        let operand = self.resolve_operand(bus, info.mode);
        let mut cycles = info.cycles;
        if info.page_cycle && operand.page_crossed {
            cycles += 1;
        }

        cycles += self.dispatch(bus, info.mnemonic, info.mode, operand);
        self.charge(cycles)
    }

    /// Run exactly one whole instruction; returns the cycles it took
    pub fn step_instruction(&mut self, bus: &mut Bus) -> Result<u8, CpuFault> {
        let start = self.cycles;
        loop {
            if self.step_cycle(bus)? == StepResult::InstructionComplete {
                return Ok((self.cycles - start) as u8);
            }
        }
    }

    /// Push PC and status, set I, load the handler vector
    fn enter_interrupt(&mut self, bus: &mut Bus, vector: u16) {
        self.push_word(bus, self.pc);
        self.push_byte(bus, (self.status & !flags::BREAK) | flags::UNUSED);
        self.set_flag(flags::INTERRUPT_DISABLE, true);
        let lo = bus.read(vector) as u16;
        let hi = bus.read(vector.wrapping_add(1)) as u16;
        self.pc = (hi << 8) | lo;
    }

    /// Start the countdown for an instruction that just executed
    fn charge(&mut self, cycles: u8) -> Result<StepResult, CpuFault> {
        self.cycles += 1;
        self.pending = cycles - 1;
        Ok(if self.pending == 0 {
            StepResult::InstructionComplete
        } else {
            StepResult::Busy
        })
    }

    /// Apply one instruction's semantics; returns extra cycles (branches)
    #[allow(clippy::too_many_lines)]
    fn dispatch(
        &mut self,
        bus: &mut Bus,
        mnemonic: &str,
        mode: AddressingMode,
        operand: crate::cpu::addressing::Operand,
    ) -> u8 {
        match mnemonic {
            // Loads / stores
            "LDA" => {
                let v = self.operand_value(bus, operand);
                self.lda(v);
            }
            "LDX" => {
                let v = self.operand_value(bus, operand);
                self.ldx(v);
            }
            "LDY" => {
                let v = self.operand_value(bus, operand);
                self.ldy(v);
            }
            "STA" => self.sta(bus, operand.address),
            "STX" => self.stx(bus, operand.address),
            "STY" => self.sty(bus, operand.address),

            // Arithmetic
            "ADC" => {
                let v = self.operand_value(bus, operand);
                self.adc(v);
            }
            "SBC" => {
                let v = self.operand_value(bus, operand);
                self.sbc(v);
            }
            "INC" => {
                self.inc(bus, operand.address);
            }
            "DEC" => {
                self.dec(bus, operand.address);
            }
            "INX" => self.inx(),
            "INY" => self.iny(),
            "DEX" => self.dex(),
            "DEY" => self.dey(),

            // Logic
            "AND" => {
                let v = self.operand_value(bus, operand);
                self.and(v);
            }
            "ORA" => {
                let v = self.operand_value(bus, operand);
                self.ora(v);
            }
            "EOR" => {
                let v = self.operand_value(bus, operand);
                self.eor(v);
            }
            "BIT" => {
                let v = self.operand_value(bus, operand);
                self.bit(v);
            }

            // Shifts / rotates
            "ASL" => {
                if mode == AddressingMode::Accumulator {
                    self.a = self.asl_value(self.a);
                } else {
                    self.rmw(bus, operand.address, Cpu::asl_value);
                }
            }
            "LSR" => {
                if mode == AddressingMode::Accumulator {
                    self.a = self.lsr_value(self.a);
                } else {
                    self.rmw(bus, operand.address, Cpu::lsr_value);
                }
            }
            "ROL" => {
                if mode == AddressingMode::Accumulator {
                    self.a = self.rol_value(self.a);
                } else {
                    self.rmw(bus, operand.address, Cpu::rol_value);
                }
            }
            "ROR" => {
                if mode == AddressingMode::Accumulator {
                    self.a = self.ror_value(self.a);
                } else {
                    self.rmw(bus, operand.address, Cpu::ror_value);
                }
            }

            // Compares
            "CMP" => {
                let v = self.operand_value(bus, operand);
                self.compare(self.a, v);
            }
            "CPX" => {
                let v = self.operand_value(bus, operand);
                self.compare(self.x, v);
            }
            "CPY" => {
                let v = self.operand_value(bus, operand);
                self.compare(self.y, v);
            }

            // Branches
            "BCC" => return self.branch_if(!self.get_flag(flags::CARRY), operand),
            "BCS" => return self.branch_if(self.get_flag(flags::CARRY), operand),
            "BNE" => return self.branch_if(!self.get_flag(flags::ZERO), operand),
            "BEQ" => return self.branch_if(self.get_flag(flags::ZERO), operand),
            "BPL" => return self.branch_if(!self.get_flag(flags::NEGATIVE), operand),
            "BMI" => return self.branch_if(self.get_flag(flags::NEGATIVE), operand),
            "BVC" => return self.branch_if(!self.get_flag(flags::OVERFLOW), operand),
            "BVS" => return self.branch_if(self.get_flag(flags::OVERFLOW), operand),

            // Jumps / subroutines
            "JMP" => self.pc = operand.address,
            "JSR" => self.jsr(bus, operand.address),
            "RTS" => self.rts(bus),
            "RTI" => self.rti(bus),
            "BRK" => self.brk(bus),

            // Stack
            "PHA" => self.pha(bus),
            "PHP" => self.php(bus),
            "PLA" => self.pla(bus),
            "PLP" => self.plp(bus),

            // Transfers
            "TAX" => self.tax(),
            "TAY" => self.tay(),
            "TXA" => self.txa(),
            "TYA" => self.tya(),
            "TSX" => self.tsx(),
            "TXS" => self.txs(),

            // Flags
            "CLC" => self.set_flag(flags::CARRY, false),
            "SEC" => self.set_flag(flags::CARRY, true),
            "CLI" => self.set_flag(flags::INTERRUPT_DISABLE, false),
            "SEI" => self.set_flag(flags::INTERRUPT_DISABLE, true),
            "CLD" => self.set_flag(flags::DECIMAL, false),
            "SED" => self.set_flag(flags::DECIMAL, true),
            "CLV" => self.set_flag(flags::OVERFLOW, false),

            "NOP" => {}

            // Undocumented, stable
            "LAX" => {
                let v = self.operand_value(bus, operand);
                self.lax(v);
            }
            "SAX" => self.sax(bus, operand.address),
            "DCP" => self.dcp(bus, operand.address),
            "ISB" => self.isb(bus, operand.address),
            "SLO" => self.slo(bus, operand.address),
            "RLA" => self.rla(bus, operand.address),
            "SRE" => self.sre(bus, operand.address),
            "RRA" => self.rra(bus, operand.address),

            // Undocumented, unstable: consume operand and cycles only
            _ => {}
        }
        0
    }

    /// Format the instruction at PC plus the register file in the classic
    /// nestest log layout, for execution tracing
    ///
    /// Reads go through `peek` so tracing never perturbs the machine.
    pub fn trace(&self, bus: &Bus) -> String {
        let opcode = bus.peek(self.pc);
        let info = &OPCODE_TABLE[opcode as usize];

        let mut bytes = String::with_capacity(9);
        for i in 0..info.bytes {
            bytes.push_str(&format!("{:02X} ", bus.peek(self.pc.wrapping_add(i as u16))));
        }

        let operand_lo = bus.peek(self.pc.wrapping_add(1));
        let operand_hi = bus.peek(self.pc.wrapping_add(2));
        let word = ((operand_hi as u16) << 8) | operand_lo as u16;

        let assembly = match info.mode {
            AddressingMode::Implied => info.mnemonic.to_string(),
            AddressingMode::Accumulator => format!("{} A", info.mnemonic),
            AddressingMode::Immediate => format!("{} #${:02X}", info.mnemonic, operand_lo),
            AddressingMode::ZeroPage => format!("{} ${:02X}", info.mnemonic, operand_lo),
            AddressingMode::ZeroPageX => format!("{} ${:02X},X", info.mnemonic, operand_lo),
            AddressingMode::ZeroPageY => format!("{} ${:02X},Y", info.mnemonic, operand_lo),
            AddressingMode::Relative => {
                let target = self
                    .pc
                    .wrapping_add(2)
                    .wrapping_add_signed(operand_lo as i8 as i16);
                format!("{} ${:04X}", info.mnemonic, target)
            }
            AddressingMode::Absolute => format!("{} ${:04X}", info.mnemonic, word),
            AddressingMode::AbsoluteX => format!("{} ${:04X},X", info.mnemonic, word),
            AddressingMode::AbsoluteY => format!("{} ${:04X},Y", info.mnemonic, word),
            AddressingMode::Indirect => format!("{} (${:04X})", info.mnemonic, word),
            AddressingMode::IndexedIndirect => format!("{} (${:02X},X)", info.mnemonic, operand_lo),
            AddressingMode::IndirectIndexed => format!("{} (${:02X}),Y", info.mnemonic, operand_lo),
        };

        format!(
            "{:04X}  {:<9} {:<31} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc, bytes.trim_end(), assembly, self.a, self.x, self.y, self.status, self.sp,
            self.cycles
        )
    }
}
