// Debugger core
//
// Holds the run-state machine and the breakpoint set. The debugger never
// advances the machine itself; the system facade consults it at every
// instruction boundary and applies the verdict. All of its own reads go
// through side-effect-free paths, so an armed debugger is invisible to
// the emulated program.

pub mod condition;
pub mod disassembler;
pub mod logger;
pub mod memory;

use std::error::Error;
use std::fmt;

use crate::bus::Bus;
use crate::cpu::RegisterFile;
use condition::Condition;
use logger::Logger;

/// Execution state of the machine as the debugger sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Free-running; only breakpoints and faults stop it
    Running,
    /// Stopped at an instruction boundary
    Paused,
    /// Running until the next instruction boundary
    SteppingInstruction,
    /// Running until the next frame boundary
    SteppingFrame,
}

/// Caller misuse of the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// The operation requires the machine to be paused
    NotPaused,
    /// No breakpoint has this id
    UnknownBreakpoint(u32),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::NotPaused => {
                write!(f, "operation requires the machine to be paused")
            }
            ControlError::UnknownBreakpoint(id) => {
                write!(f, "no breakpoint with id {}", id)
            }
        }
    }
}

impl Error for ControlError {}

/// One breakpoint
#[derive(Debug, Clone)]
pub struct Breakpoint {
    /// Stable id handed back at creation
    pub id: u32,
    /// Address the program counter must match
    pub address: u16,
    /// Disabled breakpoints stay in the set but never fire
    pub enabled: bool,
    /// Optional extra condition; the breakpoint fires only when it holds
    pub condition: Option<Condition>,
}

/// The debugger state
pub struct Debugger {
    run_state: RunState,
    breakpoints: Vec<Breakpoint>,
    next_id: u32,
    /// Trace log fed by the facade
    pub logger: Logger,
}

impl Debugger {
    /// A debugger for a machine that starts out paused
    pub fn new() -> Self {
        Debugger {
            run_state: RunState::Paused,
            breakpoints: Vec::new(),
            next_id: 1,
            logger: Logger::new(),
        }
    }

    // ========================================
    // Run state
    // ========================================

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    pub(crate) fn set_run_state(&mut self, state: RunState) {
        self.run_state = state;
    }

    /// Request a pause; honored at the next instruction boundary
    pub fn pause(&mut self) {
        self.run_state = RunState::Paused;
    }

    /// Leave Paused and free-run
    pub fn resume(&mut self) {
        self.run_state = RunState::Running;
    }

    // ========================================
    // Breakpoints
    // ========================================

    /// Add an unconditional breakpoint; returns its id
    pub fn add_breakpoint(&mut self, address: u16) -> u32 {
        self.add_conditional_breakpoint(address, None)
    }

    /// Add a breakpoint with an optional condition; returns its id
    pub fn add_conditional_breakpoint(
        &mut self,
        address: u16,
        condition: Option<Condition>,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.breakpoints.push(Breakpoint {
            id,
            address,
            enabled: true,
            condition,
        });
        id
    }

    pub fn remove_breakpoint(&mut self, id: u32) -> Result<(), ControlError> {
        let index = self
            .breakpoints
            .iter()
            .position(|bp| bp.id == id)
            .ok_or(ControlError::UnknownBreakpoint(id))?;
        self.breakpoints.remove(index);
        Ok(())
    }

    pub fn set_breakpoint_enabled(&mut self, id: u32, enabled: bool) -> Result<(), ControlError> {
        let bp = self
            .breakpoints
            .iter_mut()
            .find(|bp| bp.id == id)
            .ok_or(ControlError::UnknownBreakpoint(id))?;
        bp.enabled = enabled;
        Ok(())
    }

    pub fn set_breakpoint_condition(
        &mut self,
        id: u32,
        condition: Option<Condition>,
    ) -> Result<(), ControlError> {
        let bp = self
            .breakpoints
            .iter_mut()
            .find(|bp| bp.id == id)
            .ok_or(ControlError::UnknownBreakpoint(id))?;
        bp.condition = condition;
        Ok(())
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Check the breakpoint set against the machine at a boundary
    ///
    /// Returns the id of the first enabled breakpoint whose address
    /// matches PC and whose condition (if any) holds. Conditions are
    /// evaluated against the snapshot and the peek path only.
    pub fn check_breakpoints(&self, registers: &RegisterFile, bus: &Bus) -> Option<u32> {
        self.breakpoints
            .iter()
            .filter(|bp| bp.enabled && bp.address == registers.pc)
            .find(|bp| {
                bp.condition
                    .as_ref()
                    .map_or(true, |cond| cond.evaluate(registers, bus))
            })
            .map(|bp| bp.id)
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}
