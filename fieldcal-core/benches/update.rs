use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fieldcal_core::{
    constants::STATE_DIM, matrix::cholesky_scaled, CalibrationState, FilterConfig,
};

fn readings() -> Vec<[f32; 3]> {
    // Deterministic points spread over a sphere of radius ~1.2 offset by a bias
    (0..64)
        .map(|i| {
            let t = i as f32 * 0.7;
            let p = i as f32 * 0.31;
            [
                1.2 * t.cos() * p.sin() + 0.3,
                1.2 * t.sin() * p.sin() - 0.1,
                1.2 * p.cos() + 0.2,
            ]
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let samples = readings();

    c.bench_function("update", |b| {
        let mut cal = CalibrationState::new();
        cal.set_measurement_noise(0.01);
        let mut i = 0;
        b.iter(|| {
            cal.update(black_box(&samples[i % samples.len()]));
            i += 1;
        })
    });

    c.bench_function("update_64_from_fresh", |b| {
        b.iter(|| {
            let mut cal = CalibrationState::new();
            cal.set_measurement_noise(0.01);
            for s in &samples {
                cal.update(s);
            }
            black_box(cal.estimate())
        })
    });

    c.bench_function("calibrate", |b| {
        let mut cal = CalibrationState::new();
        for s in &samples {
            cal.update(s);
        }
        b.iter(|| cal.calibrate(black_box(&samples[0])))
    });

    c.bench_function("cholesky_9x9", |b| {
        let p = FilterConfig::default().initial_covariance();
        let mut l = [[0.0; STATE_DIM]; STATE_DIM];
        b.iter(|| cholesky_scaled(black_box(p.as_matrix()), 3.0, &mut l))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
