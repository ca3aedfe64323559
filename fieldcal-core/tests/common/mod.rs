//! Shared helpers for calibration integration tests
//!
//! - A simulated tri-axial sensor with known bias, scale error and noise
//! - Seeded random sources so every run sees the same samples
//! - Tolerance assertions

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// Simulated sensor in a field of constant magnitude
///
/// Readings are generated from uniformly distributed field directions as
/// `raw = field / (1 + scale) + bias + noise`, per axis. A filter that
/// recovers the bias and `D = diag(scale)` maps them back onto the sphere.
pub struct SensorModel {
    pub field_norm: f32,
    pub bias: [f32; 3],
    pub scale: [f32; 3],
    noise: Normal<f32>,
    rng: StdRng,
}

impl SensorModel {
    pub fn new(seed: u64, field_norm: f32, bias: [f32; 3], noise_std: f32) -> Self {
        Self {
            field_norm,
            bias,
            scale: [0.0; 3],
            noise: Normal::new(0.0, noise_std).expect("noise std must be finite"),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Per-axis scale error
    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    /// Uniformly distributed direction times the field magnitude
    pub fn field_sample(&mut self) -> [f32; 3] {
        loop {
            let v: [f32; 3] = [
                StandardNormal.sample(&mut self.rng),
                StandardNormal.sample(&mut self.rng),
                StandardNormal.sample(&mut self.rng),
            ];
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            if norm > 1e-3 {
                return [
                    v[0] / norm * self.field_norm,
                    v[1] / norm * self.field_norm,
                    v[2] / norm * self.field_norm,
                ];
            }
        }
    }

    /// One raw reading
    pub fn reading(&mut self) -> [f32; 3] {
        let field = self.field_sample();
        let mut raw = [0.0; 3];
        for i in 0..3 {
            raw[i] = field[i] / (1.0 + self.scale[i])
                + self.bias[i]
                + self.noise.sample(&mut self.rng);
        }
        raw
    }
}

pub fn magnitude(v: &[f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[macro_export]
macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let diff = ($actual - $expected).abs();
        if diff > $tolerance {
            panic!(
                "Value {} not within tolerance {} of expected {} (diff: {})",
                $actual, $tolerance, $expected, diff
            );
        }
    };
}
