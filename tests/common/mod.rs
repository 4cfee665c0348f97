// Shared helpers for the integration tests

use famicore::{HardwareProfile, Nes};

/// Where test programs are loaded in RAM
pub const PROGRAM_BASE: u16 = 0x0200;

/// Build a paused machine with `program` in RAM and the reset vector
/// pointed at it
///
/// The interrupt vectors are relocated into RAM so the tests run without
/// a cartridge.
pub fn machine_with_program(program: &[u8]) -> Nes {
    let mut profile = HardwareProfile::ntsc();
    profile.vectors.reset = 0x0700;
    profile.vectors.nmi = 0x0702;
    profile.vectors.irq = 0x0704;
    machine_with_profile_and_program(profile, program)
}

/// Same, but with a caller-supplied profile (its vectors are used as-is)
pub fn machine_with_profile_and_program(profile: HardwareProfile, program: &[u8]) -> Nes {
    let reset_vector = profile.vectors.reset;
    let mut nes = Nes::with_profile(profile).expect("test profile must validate");

    for (i, byte) in program.iter().enumerate() {
        nes.write_memory(PROGRAM_BASE + i as u16, *byte).unwrap();
    }
    nes.write_memory(reset_vector, (PROGRAM_BASE & 0xFF) as u8)
        .unwrap();
    nes.write_memory(reset_vector + 1, (PROGRAM_BASE >> 8) as u8)
        .unwrap();
    nes.reset();
    nes
}
