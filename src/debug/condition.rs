// Breakpoint conditions
//
// A condition is a closed expression tree over registers, memory bytes
// and literals. Evaluation only ever looks at a read-only view of the
// machine (register snapshot plus the bus peek path), so checking a
// condition can never perturb what it is checking.

use std::fmt;

use crate::bus::Bus;
use crate::cpu::RegisterFile;

/// A CPU register a condition can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    X,
    Y,
    Sp,
    Pc,
    Status,
}

/// A leaf value in a condition expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A register's current value
    Register(Register),
    /// The byte at an address, read through the side-effect-free path
    Memory(u16),
    /// A literal
    Immediate(u16),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A breakpoint condition expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Compare {
        op: Comparison,
        lhs: Operand,
        rhs: Operand,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Convenience constructor for the common register-equals case
    pub fn register_equals(register: Register, value: u16) -> Self {
        Condition::Compare {
            op: Comparison::Eq,
            lhs: Operand::Register(register),
            rhs: Operand::Immediate(value),
        }
    }

    /// Convenience constructor for the memory-byte comparison case
    pub fn memory(address: u16, op: Comparison, value: u8) -> Self {
        Condition::Compare {
            op,
            lhs: Operand::Memory(address),
            rhs: Operand::Immediate(value as u16),
        }
    }

    /// Evaluate against a register snapshot and the live (peeked) bus
    pub fn evaluate(&self, registers: &RegisterFile, bus: &Bus) -> bool {
        match self {
            Condition::Compare { op, lhs, rhs } => {
                let a = operand_value(lhs, registers, bus);
                let b = operand_value(rhs, registers, bus);
                match op {
                    Comparison::Eq => a == b,
                    Comparison::Ne => a != b,
                    Comparison::Lt => a < b,
                    Comparison::Le => a <= b,
                    Comparison::Gt => a > b,
                    Comparison::Ge => a >= b,
                }
            }
            Condition::And(lhs, rhs) => {
                lhs.evaluate(registers, bus) && rhs.evaluate(registers, bus)
            }
            Condition::Or(lhs, rhs) => {
                lhs.evaluate(registers, bus) || rhs.evaluate(registers, bus)
            }
            Condition::Not(inner) => !inner.evaluate(registers, bus),
        }
    }
}

fn operand_value(operand: &Operand, registers: &RegisterFile, bus: &Bus) -> u16 {
    match operand {
        Operand::Register(Register::A) => registers.a as u16,
        Operand::Register(Register::X) => registers.x as u16,
        Operand::Register(Register::Y) => registers.y as u16,
        Operand::Register(Register::Sp) => registers.sp as u16,
        Operand::Register(Register::Pc) => registers.pc,
        Operand::Register(Register::Status) => registers.status as u16,
        Operand::Memory(address) => bus.peek(*address) as u16,
        Operand::Immediate(value) => *value,
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::A => "A",
            Register::X => "X",
            Register::Y => "Y",
            Register::Sp => "SP",
            Register::Pc => "PC",
            Register::Status => "P",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Memory(addr) => write!(f, "[${:04X}]", addr),
            Operand::Immediate(v) => write!(f, "${:X}", v),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { op, lhs, rhs } => {
                let op = match op {
                    Comparison::Eq => "==",
                    Comparison::Ne => "!=",
                    Comparison::Lt => "<",
                    Comparison::Le => "<=",
                    Comparison::Gt => ">",
                    Comparison::Ge => ">=",
                };
                write!(f, "{} {} {}", lhs, op, rhs)
            }
            Condition::And(lhs, rhs) => write!(f, "({} && {})", lhs, rhs),
            Condition::Or(lhs, rhs) => write!(f, "({} || {})", lhs, rhs),
            Condition::Not(inner) => write!(f, "!({})", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    fn regs(a: u8, x: u8, pc: u16) -> RegisterFile {
        let mut cpu = Cpu::new();
        cpu.a = a;
        cpu.x = x;
        cpu.pc = pc;
        cpu.registers()
    }

    #[test]
    fn test_register_comparison() {
        let bus = Bus::new();
        let cond = Condition::register_equals(Register::A, 0x42);

        assert!(cond.evaluate(&regs(0x42, 0, 0), &bus));
        assert!(!cond.evaluate(&regs(0x41, 0, 0), &bus));
    }

    #[test]
    fn test_memory_comparison_uses_peek() {
        let mut bus = Bus::new();
        bus.write(0x0010, 0x80);
        let cond = Condition::memory(0x0010, Comparison::Ge, 0x80);

        assert!(cond.evaluate(&regs(0, 0, 0), &bus));
        bus.write(0x0010, 0x7F);
        assert!(!cond.evaluate(&regs(0, 0, 0), &bus));
    }

    #[test]
    fn test_combinators() {
        let bus = Bus::new();
        let a_set = Condition::register_equals(Register::A, 1);
        let x_set = Condition::register_equals(Register::X, 1);

        let both = Condition::And(Box::new(a_set.clone()), Box::new(x_set.clone()));
        assert!(both.evaluate(&regs(1, 1, 0), &bus));
        assert!(!both.evaluate(&regs(1, 0, 0), &bus));

        let either = Condition::Or(Box::new(a_set.clone()), Box::new(x_set));
        assert!(either.evaluate(&regs(1, 0, 0), &bus));
        assert!(!either.evaluate(&regs(0, 0, 0), &bus));

        let negated = Condition::Not(Box::new(a_set));
        assert!(negated.evaluate(&regs(0, 0, 0), &bus));
    }

    #[test]
    fn test_evaluation_never_perturbs_the_bus() {
        let mut bus = Bus::new();
        bus.ppu.status |= crate::ppu::constants::STATUS_VBLANK;
        // A condition watching PPUSTATUS through its mirror
        let cond = Condition::memory(0x2002, Comparison::Ne, 0);

        assert!(cond.evaluate(&regs(0, 0, 0), &bus));
        assert!(
            bus.ppu.status & crate::ppu::constants::STATUS_VBLANK != 0,
            "evaluating did not clear the VBlank flag"
        );
    }

    #[test]
    fn test_display_rendering() {
        let cond = Condition::And(
            Box::new(Condition::register_equals(Register::Pc, 0x8000)),
            Box::new(Condition::memory(0x10, Comparison::Gt, 5)),
        );
        assert_eq!(cond.to_string(), "(PC == $8000 && [$0010] > $5)");
    }
}
