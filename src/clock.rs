// Clock/scheduler - the one place CPU and PPU cycles are interleaved
//
// The PPU-per-CPU ratio is a rational number carried as integers; each
// CPU cycle adds the numerator into a remainder accumulator and the PPU
// steps once per denominator held in it. There is no floating point in
// the timing path, so the ratio holds exactly over any horizon.

use crate::bus::Bus;
use crate::cpu::{Cpu, CpuFault, StepResult};
use crate::profile::CycleRatio;

/// What happened during one clock tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickEvent {
    /// The CPU crossed an instruction boundary this tick
    pub instruction_complete: bool,
    /// The PPU finished a frame this tick
    pub frame_complete: bool,
}

pub struct Clock {
    ratio: CycleRatio,
    /// Remainder accumulator, always below the denominator between ticks
    acc: u32,
    /// CPU cycles driven since construction
    cpu_cycles: u64,
    /// PPU cycles driven since construction
    ppu_cycles: u64,
    /// CPU cycles still owed to a DMA transfer
    stall: u16,
}

impl Clock {
    pub fn new(ratio: CycleRatio) -> Self {
        Clock {
            ratio,
            acc: 0,
            cpu_cycles: 0,
            ppu_cycles: 0,
            stall: 0,
        }
    }

    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    pub fn ppu_cycles(&self) -> u64 {
        self.ppu_cycles
    }

    /// Advance the machine by one CPU cycle
    ///
    /// Steps the CPU (or burns a DMA stall cycle), then steps the PPU as
    /// many times as the ratio owes, then forwards the PPU's NMI line.
    /// Instruction boundaries are reported so the caller can yield to a
    /// debugger; nothing here ever pauses mid-instruction on its own.
    pub fn tick(&mut self, cpu: &mut Cpu, bus: &mut Bus) -> Result<TickEvent, CpuFault> {
        let mut event = TickEvent::default();

        if self.stall > 0 {
            self.stall -= 1;
            cpu.cycles += 1;
        } else {
            let step = cpu.step_cycle(bus)?;
            event.instruction_complete = step == StepResult::InstructionComplete;

            let stall = bus.take_dma_stall();
            if stall > 0 {
                // A transfer beginning on an odd CPU cycle costs one more
                self.stall = stall + (cpu.cycles % 2) as u16;
            }
        }
        self.cpu_cycles += 1;

        self.acc += self.ratio.numerator;
        while self.acc >= self.ratio.denominator {
            self.acc -= self.ratio.denominator;
            if bus.ppu_step() {
                event.frame_complete = true;
            }
            self.ppu_cycles += 1;
        }

        if bus.ppu.take_nmi() {
            cpu.signal_nmi();
        }

        Ok(event)
    }

    /// Whether a DMA stall is still draining
    pub fn stalled(&self) -> bool {
        self.stall > 0
    }
}
