//! Criterion benchmarks for racoustic-dsp primitives
//!
//! Run with: cargo bench -p racoustic-dsp
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use racoustic_dsp::{
    Biquad, FirConvolver, GraphicEq, InterpolatedDelay, LinkwitzRileyCrossover, OnePole,
    SmoothedParam, lowpass_coefficients,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");

    let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, SAMPLE_RATE);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut biquad = Biquad::new();
                biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
                b.iter(|| {
                    for &sample in &input {
                        black_box(biquad.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(lowpass_coefficients(
                black_box(1000.0),
                black_box(0.707),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.bench_function("magnitude_at", |b| {
        let mut biquad = Biquad::new();
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        b.iter(|| black_box(biquad.magnitude_at(black_box(500.0), SAMPLE_RATE)));
    });

    group.finish();
}

fn bench_graphic_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("GraphicEq");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut eq = GraphicEq::octave_bands(SAMPLE_RATE);
                eq.set_band_gains_db(&[-3.0, -6.0, -9.0, -4.0, -2.0, -1.0, 0.0]);
                b.iter(|| {
                    for &sample in &input {
                        black_box(eq.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("LinkwitzRileyCrossover");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut xover = LinkwitzRileyCrossover::new(1500.0, SAMPLE_RATE);
                b.iter(|| {
                    for &sample in &input {
                        black_box(xover.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_fir_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("FirConvolver");

    let kernel_lengths = [16usize, 64, 256];
    for &kernel_len in &kernel_lengths {
        let taps: Vec<f32> = (0..kernel_len).map(|i| 1.0 / (i as f32 + 1.0)).collect();
        for &block_size in BLOCK_SIZES {
            let input = generate_test_signal(block_size);

            group.bench_with_input(
                BenchmarkId::new(format!("{kernel_len}taps"), block_size),
                &block_size,
                |b, _| {
                    let mut conv = FirConvolver::new(taps.clone());
                    b.iter(|| {
                        for &sample in &input {
                            black_box(conv.process(black_box(sample)));
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("InterpolatedDelay");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut delay = InterpolatedDelay::new(48000);
                b.iter(|| {
                    for &sample in &input {
                        let out = delay.read(black_box(1000.5));
                        delay.write(black_box(sample));
                        black_box(out);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_smoothed_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("SmoothedParam");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("ramping", block_size),
            &block_size,
            |b, &size| {
                let mut param = SmoothedParam::with_config(1.0, SAMPLE_RATE, 10.0);
                b.iter(|| {
                    param.set_target(black_box(0.5));
                    for _ in 0..size {
                        black_box(param.advance());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("settled", block_size),
            &block_size,
            |b, &size| {
                let mut param = SmoothedParam::with_config(1.0, SAMPLE_RATE, 10.0);
                for _ in 0..48000 {
                    param.advance();
                }
                b.iter(|| {
                    for _ in 0..size {
                        black_box(param.advance());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_one_pole(c: &mut Criterion) {
    let mut group = c.benchmark_group("OnePole");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut filter = OnePole::new(SAMPLE_RATE, 1000.0);
                b.iter(|| {
                    for &sample in &input {
                        black_box(filter.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_biquad,
    bench_graphic_eq,
    bench_crossover,
    bench_fir_convolver,
    bench_delay,
    bench_smoothed_param,
    bench_one_pole,
);

criterion_main!(benches);
