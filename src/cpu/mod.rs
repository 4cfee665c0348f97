// 6502 CPU core
//
// The register file and flag helpers live here; addressing-mode resolution,
// the decode table, instruction semantics and the cycle-stepped execution
// loop are in the submodules.

pub mod addressing;
pub mod execute;
pub mod instructions;
pub mod opcodes;

pub use execute::{CpuFault, StepResult};

/// Status register bit masks
///
/// Bit 5 is hardwired high on a real 6502; bit 4 (Break) exists only in
/// the copy of the status byte pushed to the stack.
pub mod flags {
    /// C: carry out of bit 7 (or borrow for subtraction)
    pub const CARRY: u8 = 0b0000_0001;
    /// Z: result was zero
    pub const ZERO: u8 = 0b0000_0010;
    /// I: IRQ disable
    pub const INTERRUPT_DISABLE: u8 = 0b0000_0100;
    /// D: decimal mode (latched but ignored; the console's CPU has no BCD)
    pub const DECIMAL: u8 = 0b0000_1000;
    /// B: set in the pushed status byte for BRK/PHP, clear for interrupts
    pub const BREAK: u8 = 0b0001_0000;
    /// Bit 5: always reads as 1
    pub const UNUSED: u8 = 0b0010_0000;
    /// V: signed overflow
    pub const OVERFLOW: u8 = 0b0100_0000;
    /// N: bit 7 of the result
    pub const NEGATIVE: u8 = 0b1000_0000;
}

/// Owned snapshot of the CPU register file
///
/// Returned by inspection and accepted whole by `set_registers`, so a
/// debugger can never leave the CPU with a half-applied edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
}

/// The CPU state
///
/// Execution is cycle-stepped: an instruction is decoded and applied at its
/// first cycle, and `pending` then counts the remaining cycles down so the
/// clock can interleave other components at true hardware granularity.
/// Architectural state only ever changes on the cycle that decodes, which
/// keeps mid-instruction pauses safe to inspect.
#[derive(Debug, Clone)]
pub struct Cpu {
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (offset into page $01)
    pub sp: u8,
    /// Program counter
    pub pc: u16,
    /// Status register (NV-BDIZC)
    pub status: u8,

    /// Total cycles executed since power-on
    pub cycles: u64,
    /// Cycles left before the current instruction completes
    pub(crate) pending: u8,
    /// NMI line was pulled low (edge-triggered, serviced at a boundary)
    pub(crate) nmi_pending: bool,
    /// IRQ line is held low (level-triggered, maskable)
    pub(crate) irq_pending: bool,
    /// A JAM opcode was executed; the core refuses to advance
    pub(crate) halted: bool,

    /// What to do when an undocumented opcode is fetched
    pub(crate) illegal_policy: crate::profile::IllegalOpcodePolicy,

    /// NMI handler vector location
    pub(crate) nmi_vector: u16,
    /// Reset vector location
    pub(crate) reset_vector: u16,
    /// IRQ/BRK handler vector location
    pub(crate) irq_vector: u16,
}

impl Cpu {
    /// Create a CPU in its power-on state
    ///
    /// PC is left at zero until `reset` loads it from the reset vector.
    pub fn new() -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: flags::UNUSED | flags::INTERRUPT_DISABLE,
            cycles: 0,
            pending: 0,
            nmi_pending: false,
            irq_pending: false,
            halted: false,
            illegal_policy: crate::profile::IllegalOpcodePolicy::Trap,
            nmi_vector: 0xFFFA,
            reset_vector: 0xFFFC,
            irq_vector: 0xFFFE,
        }
    }

    /// Point the interrupt vectors somewhere other than the hardware default
    pub fn set_vectors(&mut self, nmi: u16, reset: u16, irq: u16) {
        self.nmi_vector = nmi;
        self.reset_vector = reset;
        self.irq_vector = irq;
    }

    /// Choose how undocumented opcodes are handled
    pub fn set_illegal_policy(&mut self, policy: crate::profile::IllegalOpcodePolicy) {
        self.illegal_policy = policy;
    }

    // ========================================
    // Flag helpers
    // ========================================

    /// Set or clear a status flag
    #[inline]
    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    /// Read a status flag
    #[inline]
    pub fn get_flag(&self, flag: u8) -> bool {
        self.status & flag != 0
    }

    /// Update Z and N from a result byte
    #[inline]
    pub(crate) fn update_zero_negative(&mut self, value: u8) {
        self.set_flag(flags::ZERO, value == 0);
        self.set_flag(flags::NEGATIVE, value & 0x80 != 0);
    }

    // ========================================
    // Register file access
    // ========================================

    /// Snapshot the architectural registers
    pub fn registers(&self) -> RegisterFile {
        RegisterFile {
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            pc: self.pc,
            status: self.status,
        }
    }

    /// Replace the architectural registers wholesale
    ///
    /// Bit 5 of the status byte is forced high, matching hardware.
    pub fn set_registers(&mut self, regs: RegisterFile) {
        self.a = regs.a;
        self.x = regs.x;
        self.y = regs.y;
        self.sp = regs.sp;
        self.pc = regs.pc;
        self.status = regs.status | flags::UNUSED;
    }

    /// Whether the CPU sits exactly between two instructions
    #[inline]
    pub fn at_instruction_boundary(&self) -> bool {
        self.pending == 0
    }

    /// Whether a JAM opcode has wedged the core
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // ========================================
    // Interrupt lines
    // ========================================

    /// Pull the NMI line (edge-triggered)
    pub fn signal_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Assert the IRQ line (level-triggered, masked by the I flag)
    pub fn signal_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Release the IRQ line
    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let cpu = Cpu::new();
        assert_eq!(cpu.sp, 0xFD);
        assert!(cpu.get_flag(flags::INTERRUPT_DISABLE));
        assert!(cpu.get_flag(flags::UNUSED));
        assert!(!cpu.get_flag(flags::CARRY));
        assert!(cpu.at_instruction_boundary());
    }

    #[test]
    fn test_flag_set_and_clear() {
        let mut cpu = Cpu::new();
        cpu.set_flag(flags::CARRY, true);
        assert!(cpu.get_flag(flags::CARRY));
        cpu.set_flag(flags::CARRY, false);
        assert!(!cpu.get_flag(flags::CARRY));
    }

    #[test]
    fn test_update_zero_negative() {
        let mut cpu = Cpu::new();
        cpu.update_zero_negative(0x00);
        assert!(cpu.get_flag(flags::ZERO));
        assert!(!cpu.get_flag(flags::NEGATIVE));

        cpu.update_zero_negative(0x80);
        assert!(!cpu.get_flag(flags::ZERO));
        assert!(cpu.get_flag(flags::NEGATIVE));
    }

    #[test]
    fn test_set_registers_forces_unused_bit() {
        let mut cpu = Cpu::new();
        cpu.set_registers(RegisterFile {
            a: 1,
            x: 2,
            y: 3,
            sp: 0xFF,
            pc: 0x8000,
            status: 0x00,
        });
        assert_eq!(cpu.a, 1);
        assert_eq!(cpu.pc, 0x8000);
        assert!(cpu.get_flag(flags::UNUSED), "bit 5 always reads high");
    }

    #[test]
    fn test_register_snapshot_round_trip() {
        let mut cpu = Cpu::new();
        cpu.a = 0x42;
        cpu.pc = 0xC000;
        let regs = cpu.registers();

        let mut other = Cpu::new();
        other.set_registers(regs);
        assert_eq!(other.registers(), regs);
    }
}
