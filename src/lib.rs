// famicore - cycle-stepped NES emulation core with a built-in debugger
//
// The crate is organized around a single mutating entry point, the `Nes`
// facade: it owns the CPU, the bus (PPU and cartridge behind it), the
// clock that interleaves their cycles, and the debugger that observes
// instruction boundaries. Everything a frontend needs to render, inspect
// or script the machine is exposed as owned snapshots.

pub mod bus;
pub mod cartridge;
pub mod clock;
pub mod cpu;
pub mod debug;
pub mod ppu;
pub mod profile;
pub mod system;

pub use bus::Bus;
pub use cartridge::{Cartridge, INesError, INesHeader, Mapper, MapperError, Mirroring};
pub use clock::{Clock, TickEvent};
pub use cpu::{Cpu, CpuFault, RegisterFile};
pub use debug::condition::{Comparison, Condition, Operand, Register};
pub use debug::disassembler::{
    disassemble_count, disassemble_instruction, disassemble_range, ByteSource,
    DisassembledInstruction,
};
pub use debug::logger::{LogLevel, Logger};
pub use debug::memory::MemorySnapshot;
pub use debug::{Breakpoint, ControlError, Debugger, RunState};
pub use ppu::{FrameState, Ppu};
pub use profile::{
    CycleRatio, HardwareProfile, IllegalOpcodePolicy, MirrorRule, ProfileError,
};
pub use system::{Nes, StopReason, SystemError};
