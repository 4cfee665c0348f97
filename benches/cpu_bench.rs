// CPU and full-machine benchmarks
//
// Measures instruction dispatch through the cycle-stepped core and the
// cost of driving whole frames through the clock.

use criterion::{criterion_group, criterion_main, Criterion};
use famicore::{Bus, Clock, Cpu, CycleRatio, HardwareProfile, Nes};
use std::hint::black_box;

/// A CPU parked at the start of RAM with the whole 2KB filled by `fill`
fn machine_with_fill(fill: &[u8]) -> (Cpu, Bus) {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    let mut addr = 0u16;
    while (addr as usize) + fill.len() <= 0x0800 {
        for (i, byte) in fill.iter().enumerate() {
            bus.write(addr + i as u16, *byte);
        }
        addr += fill.len() as u16;
    }
    cpu.pc = 0x0000;
    (cpu, bus)
}

fn bench_cpu_instructions(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_instructions");

    group.bench_function("nop", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0xEA]);
        b.iter(|| {
            cpu.step_instruction(black_box(&mut bus)).unwrap();
        });
    });

    group.bench_function("lda_immediate", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0xA9, 0x42]);
        b.iter(|| {
            cpu.step_instruction(black_box(&mut bus)).unwrap();
        });
    });

    group.bench_function("adc_immediate", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0x69, 0x01]);
        b.iter(|| {
            cpu.step_instruction(black_box(&mut bus)).unwrap();
        });
    });

    group.bench_function("sta_absolute", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0x8D, 0x00, 0x07]);
        b.iter(|| {
            cpu.step_instruction(black_box(&mut bus)).unwrap();
        });
    });

    // Single cycle ticks, the granularity the clock actually drives
    group.bench_function("step_cycle", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0xEA]);
        b.iter(|| {
            cpu.step_cycle(black_box(&mut bus)).unwrap();
        });
    });

    group.finish();
}

fn bench_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock");

    group.bench_function("tick_ntsc", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0xEA]);
        let mut clock = Clock::new(CycleRatio::new(3, 1));
        b.iter(|| {
            clock.tick(black_box(&mut cpu), black_box(&mut bus)).unwrap();
        });
    });

    group.bench_function("tick_pal", |b| {
        let (mut cpu, mut bus) = machine_with_fill(&[0xEA]);
        let mut clock = Clock::new(CycleRatio::new(16, 5));
        b.iter(|| {
            clock.tick(black_box(&mut cpu), black_box(&mut bus)).unwrap();
        });
    });

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.sample_size(20);

    group.bench_function("step_frame", |b| {
        let mut profile = HardwareProfile::ntsc();
        profile.vectors.reset = 0x0700;
        let mut nes = Nes::with_profile(profile).unwrap();
        // Tight loop at $0200, reset vector relocated into RAM
        nes.write_memory(0x0200, 0x4C).unwrap();
        nes.write_memory(0x0201, 0x00).unwrap();
        nes.write_memory(0x0202, 0x02).unwrap();
        nes.write_memory(0x0700, 0x00).unwrap();
        nes.write_memory(0x0701, 0x02).unwrap();
        nes.reset();

        b.iter(|| {
            nes.step_frame().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cpu_instructions, bench_clock, bench_frame);
criterion_main!(benches);
