// System facade
//
// `Nes` owns the whole machine: CPU, bus (which owns the PPU and the
// cartridge), clock and debugger. It is the single mutating entry point;
// everything observable from outside is an owned snapshot taken while the
// machine is paused. Faults raised anywhere below collect here: the
// machine pauses at the faulting boundary and the fault is returned.

use std::error::Error;
use std::fmt;

use crate::bus::Bus;
use crate::cartridge::{Cartridge, MapperError};
use crate::clock::{Clock, TickEvent};
use crate::cpu::{Cpu, CpuFault, RegisterFile};
use crate::debug::disassembler::{disassemble_count, DisassembledInstruction};
use crate::debug::memory::MemorySnapshot;
use crate::debug::{ControlError, Debugger, RunState};
use crate::ppu::FrameState;
use crate::profile::{HardwareProfile, ProfileError};

/// Why a `run` call stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An enabled breakpoint matched; its id is carried
    Breakpoint(u32),
    /// The cycle budget ran out at an instruction boundary
    CycleLimit,
}

/// Errors the facade can return
#[derive(Debug)]
pub enum SystemError {
    /// The emulated hardware faulted; the machine is paused at the fault
    Hardware(CpuFault),
    /// The caller misused the control surface
    Control(ControlError),
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::Hardware(fault) => write!(f, "hardware fault: {}", fault),
            SystemError::Control(err) => write!(f, "control error: {}", err),
        }
    }
}

impl Error for SystemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SystemError::Hardware(fault) => Some(fault),
            SystemError::Control(err) => Some(err),
        }
    }
}

impl From<CpuFault> for SystemError {
    fn from(fault: CpuFault) -> Self {
        SystemError::Hardware(fault)
    }
}

impl From<ControlError> for SystemError {
    fn from(err: ControlError) -> Self {
        SystemError::Control(err)
    }
}

/// The whole machine
pub struct Nes {
    cpu: Cpu,
    bus: Bus,
    clock: Clock,
    debugger: Debugger,
    profile: HardwareProfile,
}

impl Nes {
    /// A machine with the NTSC profile
    pub fn new() -> Self {
        // The built-in profile always validates
        Self::with_profile(HardwareProfile::ntsc()).unwrap_or_else(|_| unreachable!())
    }

    /// A machine with an explicit profile; invalid profiles never boot
    pub fn with_profile(profile: HardwareProfile) -> Result<Self, ProfileError> {
        profile.validate()?;

        let mut cpu = Cpu::new();
        cpu.set_vectors(
            profile.vectors.nmi,
            profile.vectors.reset,
            profile.vectors.irq,
        );
        cpu.set_illegal_policy(profile.illegal_opcodes);

        Ok(Nes {
            cpu,
            bus: Bus::with_profile(profile.clone()),
            clock: Clock::new(profile.cycle_ratio),
            debugger: Debugger::new(),
            profile,
        })
    }

    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    /// Insert a cartridge
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) -> Result<(), MapperError> {
        self.bus.insert_cartridge(cartridge)
    }

    /// Reset the machine through the reset vector; leaves it paused
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        self.debugger.pause();
    }

    // ========================================
    // Execution
    // ========================================

    /// One clock tick; faults pause the machine and surface
    fn tick_internal(&mut self) -> Result<TickEvent, SystemError> {
        match self.clock.tick(&mut self.cpu, &mut self.bus) {
            Ok(event) => Ok(event),
            Err(fault) => {
                self.debugger.pause();
                self.debugger.logger.log(
                    crate::debug::logger::LogLevel::Error,
                    fault.to_string(),
                );
                Err(SystemError::Hardware(fault))
            }
        }
    }

    /// Run freely until a breakpoint fires, a fault occurs, or the cycle
    /// budget is exhausted
    ///
    /// Stops only at instruction boundaries. A breakpoint at the current
    /// PC does not re-fire on resume; the instruction executes first.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<StopReason, SystemError> {
        self.debugger.set_run_state(RunState::Running);
        let start = self.clock.cpu_cycles();

        if self.debugger.logger.tracing() {
            let line = self.cpu.trace(&self.bus);
            self.debugger.logger.trace(line);
        }

        loop {
            let event = self.tick_internal()?;

            if event.instruction_complete {
                // The next instruction has not started; PC names it and
                // none of its effects have been applied
                let registers = self.cpu.registers();
                if let Some(id) = self.debugger.check_breakpoints(&registers, &self.bus) {
                    self.debugger.pause();
                    return Ok(StopReason::Breakpoint(id));
                }

                if let Some(limit) = max_cycles {
                    if self.clock.cpu_cycles() - start >= limit {
                        self.debugger.pause();
                        return Ok(StopReason::CycleLimit);
                    }
                }

                if self.debugger.logger.tracing() {
                    let line = self.cpu.trace(&self.bus);
                    self.debugger.logger.trace(line);
                }
            }
        }
    }

    /// Execute exactly one instruction; requires Paused, ends Paused
    pub fn step_instruction(&mut self) -> Result<(), SystemError> {
        self.require_paused()?;
        self.debugger.set_run_state(RunState::SteppingInstruction);

        if self.debugger.logger.tracing() {
            let line = self.cpu.trace(&self.bus);
            self.debugger.logger.trace(line);
        }

        loop {
            let event = self.tick_internal()?;
            if event.instruction_complete {
                break;
            }
        }
        self.debugger.pause();
        Ok(())
    }

    /// Run until the next frame boundary; requires Paused, ends Paused
    ///
    /// The pause lands on the first instruction boundary at or after the
    /// frame event, so the machine never stops mid-instruction.
    pub fn step_frame(&mut self) -> Result<(), SystemError> {
        self.require_paused()?;
        self.debugger.set_run_state(RunState::SteppingFrame);

        let mut frame_seen = false;
        loop {
            let event = self.tick_internal()?;
            frame_seen |= event.frame_complete;
            if frame_seen && self.cpu.at_instruction_boundary() && !self.clock.stalled() {
                break;
            }
        }
        self.debugger.pause();
        Ok(())
    }

    // ========================================
    // Inspection (Paused only)
    // ========================================

    fn require_paused(&self) -> Result<(), ControlError> {
        if self.debugger.is_paused() {
            Ok(())
        } else {
            Err(ControlError::NotPaused)
        }
    }

    /// Snapshot the CPU registers
    pub fn registers(&self) -> Result<RegisterFile, ControlError> {
        self.require_paused()?;
        Ok(self.cpu.registers())
    }

    /// Replace the CPU registers wholesale
    pub fn set_registers(&mut self, registers: RegisterFile) -> Result<(), ControlError> {
        self.require_paused()?;
        self.cpu.set_registers(registers);
        Ok(())
    }

    /// Snapshot where the PPU is in its frame
    pub fn frame_state(&self) -> Result<FrameState, ControlError> {
        self.require_paused()?;
        Ok(self.bus.ppu().frame_state())
    }

    /// One byte of CPU address space, read without side effects
    pub fn read_memory(&self, address: u16) -> Result<u8, ControlError> {
        self.require_paused()?;
        Ok(self.bus.peek(address))
    }

    /// Write one byte of CPU address space
    pub fn write_memory(&mut self, address: u16, value: u8) -> Result<(), ControlError> {
        self.require_paused()?;
        self.bus.write(address, value);
        Ok(())
    }

    /// An owned window of CPU address space
    pub fn memory_snapshot(
        &self,
        start: u16,
        length: usize,
    ) -> Result<MemorySnapshot, ControlError> {
        self.require_paused()?;
        Ok(MemorySnapshot::capture(&self.bus, start, length))
    }

    /// Disassemble `count` instructions starting at `address`
    pub fn disassemble(
        &self,
        address: u16,
        count: usize,
    ) -> Result<Vec<DisassembledInstruction>, ControlError> {
        self.require_paused()?;
        Ok(disassemble_count(address, count, &self.bus))
    }

    /// Whether an interrupt is waiting to be serviced at the next boundary
    pub fn interrupt_pending(&self) -> Result<bool, ControlError> {
        self.require_paused()?;
        Ok(self.bus.ppu().nmi_pending() || self.cpu.nmi_pending || self.cpu.irq_pending)
    }

    /// Total CPU cycles driven since construction
    pub fn cpu_cycles(&self) -> u64 {
        self.clock.cpu_cycles()
    }

    /// Breakpoints, run state, trace log
    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::condition::{Condition, Register};
    use crate::profile::{CycleRatio, IllegalOpcodePolicy};

    /// Machine with a program in RAM, reset vector pointed at it
    fn machine_with_program(program: &[u8]) -> Nes {
        let mut profile = HardwareProfile::ntsc();
        // Vectors relocated into RAM so no cartridge is needed
        profile.vectors.reset = 0x0700;
        profile.vectors.nmi = 0x0702;
        profile.vectors.irq = 0x0704;
        let mut nes = Nes::with_profile(profile).unwrap();

        for (i, byte) in program.iter().enumerate() {
            nes.write_memory(0x0200 + i as u16, *byte).unwrap();
        }
        nes.write_memory(0x0700, 0x00).unwrap();
        nes.write_memory(0x0701, 0x02).unwrap();
        nes.reset();
        nes
    }

    #[test]
    fn test_invalid_profile_never_boots() {
        let mut profile = HardwareProfile::ntsc();
        profile.cycle_ratio = CycleRatio::new(3, 0);
        assert!(Nes::with_profile(profile).is_err());
    }

    #[test]
    fn test_reset_lands_on_vector_and_pauses() {
        let nes = machine_with_program(&[0xEA]);
        assert!(nes.debugger().is_paused());
        assert_eq!(nes.registers().unwrap().pc, 0x0200);
    }

    #[test]
    fn test_breakpoint_stops_before_side_effects() {
        // LDA #$01; STA $10; LDA #$02; STA $11
        let mut nes =
            machine_with_program(&[0xA9, 0x01, 0x85, 0x10, 0xA9, 0x02, 0x85, 0x11]);
        let id = nes.debugger_mut().add_breakpoint(0x0206); // the STA $11

        let stop = nes.run(Some(10_000)).unwrap();
        assert_eq!(stop, StopReason::Breakpoint(id));

        let regs = nes.registers().unwrap();
        assert_eq!(regs.pc, 0x0206, "paused exactly at the breakpoint");
        assert_eq!(nes.read_memory(0x0010).unwrap(), 0x01, "earlier store landed");
        assert_eq!(
            nes.read_memory(0x0011).unwrap(),
            0x00,
            "the instruction at the breakpoint has not executed"
        );
    }

    #[test]
    fn test_conditional_breakpoint() {
        // Loop: INX; JMP $0200  (X increments forever)
        let mut nes = machine_with_program(&[0xE8, 0x4C, 0x00, 0x02]);
        let id = nes.debugger_mut().add_conditional_breakpoint(
            0x0200,
            Some(Condition::register_equals(Register::X, 5)),
        );

        let stop = nes.run(Some(100_000)).unwrap();
        assert_eq!(stop, StopReason::Breakpoint(id));
        assert_eq!(nes.registers().unwrap().x, 5);
    }

    #[test]
    fn test_inspection_requires_paused() {
        let mut nes = machine_with_program(&[0xEA, 0x4C, 0x00, 0x02]);
        // Force a non-paused state as a misbehaving caller would see it
        nes.debugger_mut().resume();

        assert!(matches!(nes.registers(), Err(ControlError::NotPaused)));
        assert!(matches!(nes.read_memory(0), Err(ControlError::NotPaused)));
        assert!(matches!(
            nes.step_instruction(),
            Err(SystemError::Control(ControlError::NotPaused))
        ));

        nes.debugger_mut().pause();
        assert!(nes.registers().is_ok());
    }

    #[test]
    fn test_step_instruction_moves_exactly_one() {
        let mut nes = machine_with_program(&[0xA9, 0x42, 0xE8]);

        nes.step_instruction().unwrap();
        let regs = nes.registers().unwrap();
        assert_eq!(regs.pc, 0x0202);
        assert_eq!(regs.a, 0x42);
        assert_eq!(regs.x, 0, "second instruction untouched");
        assert!(nes.debugger().is_paused());
    }

    #[test]
    fn test_inspect_is_idempotent() {
        let mut nes = machine_with_program(&[0xA9, 0x42]);
        nes.step_instruction().unwrap();

        let first = nes.registers().unwrap();
        let second = nes.registers().unwrap();
        assert_eq!(first, second, "repeated inspection observes the same state");

        let snap_a = nes.memory_snapshot(0x0200, 16).unwrap();
        let snap_b = nes.memory_snapshot(0x0200, 16).unwrap();
        assert_eq!(snap_a, snap_b);
    }

    #[test]
    fn test_illegal_opcode_faults_and_pauses() {
        let mut nes = machine_with_program(&[0xEA, 0x02]); // NOP then JAM
        let result = nes.run(Some(10_000));

        match result {
            Err(SystemError::Hardware(CpuFault::IllegalOpcode { pc, opcode })) => {
                assert_eq!(pc, 0x0201);
                assert_eq!(opcode, 0x02);
            }
            other => panic!("expected an illegal-opcode fault, got {:?}", other.err()),
        }
        assert!(nes.debugger().is_paused(), "fault collects into Paused");
        assert_eq!(nes.registers().unwrap().pc, 0x0201);
    }

    #[test]
    fn test_emulate_policy_survives_undocumented_opcodes() {
        let mut profile = HardwareProfile::ntsc();
        profile.illegal_opcodes = IllegalOpcodePolicy::Emulate;
        profile.vectors.reset = 0x0700;
        let mut nes = Nes::with_profile(profile).unwrap();
        // LAX $10 then loop
        for (i, byte) in [0xA7u8, 0x10, 0x4C, 0x00, 0x02].iter().enumerate() {
            nes.write_memory(0x0200 + i as u16, *byte).unwrap();
        }
        nes.write_memory(0x0010, 0x77).unwrap();
        nes.write_memory(0x0700, 0x00).unwrap();
        nes.write_memory(0x0701, 0x02).unwrap();
        nes.reset();

        let stop = nes.run(Some(100)).unwrap();
        assert_eq!(stop, StopReason::CycleLimit);
        assert_eq!(nes.registers().unwrap().a, 0x77);
    }

    #[test]
    fn test_step_frame_advances_one_frame() {
        let mut nes = machine_with_program(&[0x4C, 0x00, 0x02]); // tight loop
        let before = nes.frame_state().unwrap().frame;

        nes.step_frame().unwrap();
        let after = nes.frame_state().unwrap();
        assert_eq!(after.frame, before + 1);
        assert!(nes.debugger().is_paused());
    }

    #[test]
    fn test_interrupt_pending_reflects_latched_interrupts() {
        let mut nes = machine_with_program(&[0xEA]);
        assert!(!nes.interrupt_pending().unwrap());

        nes.cpu.signal_nmi();
        assert!(nes.interrupt_pending().unwrap());

        nes.step_instruction().unwrap();
        assert!(
            !nes.interrupt_pending().unwrap(),
            "the boundary serviced the interrupt"
        );
    }

    #[test]
    fn test_cycle_limit_stops_at_boundary() {
        let mut nes = machine_with_program(&[0x4C, 0x00, 0x02]);
        let stop = nes.run(Some(100)).unwrap();
        assert_eq!(stop, StopReason::CycleLimit);
        assert!(nes.cpu_cycles() >= 100);
        assert!(
            nes.cpu_cycles() < 110,
            "stopped at the first boundary past the limit"
        );
    }

    #[test]
    fn test_disassemble_from_facade() {
        let nes = machine_with_program(&[0xA9, 0x42, 0x4C, 0x00, 0x02]);
        let listing = nes.disassemble(0x0200, 2).unwrap();
        assert_eq!(listing[0].format_assembly(), "LDA #$42");
        assert_eq!(listing[1].format_assembly(), "JMP $0200");
    }
}
