// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Thermal noise floor
//!
//! The scene loop seeds every millisecond's output buffer with complex
//! Gaussian noise before channels ([`crate::channel`]) accumulate their
//! contribution on top of it, so a scene with zero visible satellites still
//! produces a plausible recording (testable property: "empty scene" in
//! the concrete test scenarios).

use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// One complex sample, real (I) and imaginary (Q) components.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    /// Unit-magnitude sample at `phase_cycles` turns, i.e. `exp(j*2*pi*phase_cycles)`.
    #[must_use]
    pub fn from_phase_cycles(phase_cycles: f64) -> Self {
        let theta = 2.0 * std::f64::consts::PI * phase_cycles;
        Complex::new(theta.cos(), theta.sin())
    }
}

impl std::ops::Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl std::ops::AddAssign for Complex {
    fn add_assign(&mut self, rhs: Complex) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl std::ops::Mul<f64> for Complex {
    type Output = Complex;
    fn mul(self, rhs: f64) -> Complex {
        Complex::new(self.re * rhs, self.im * rhs)
    }
}

impl std::ops::Mul<Complex> for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(self.re * rhs.re - self.im * rhs.im, self.re * rhs.im + self.im * rhs.re)
    }
}

/// Generates independent complex Gaussian samples, `Var(Re) = Var(Im) = σ²`
/// per component, using a seeded PRNG so a run is bit-reproducible.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: rand::rngs::StdRng,
    sigma: f64,
}

impl NoiseSource {
    /// Builds a noise source with unit variance per component, seeded for
    /// reproducibility.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        NoiseSource::with_sigma(seed, 1.0)
    }

    /// As [`NoiseSource::new`], but with a configurable standard deviation
    #[must_use]
    pub fn with_sigma(seed: u64, sigma: f64) -> Self {
        NoiseSource {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            sigma,
        }
    }

    /// Draws one complex Gaussian sample
    pub fn next_sample(&mut self) -> Complex {
        let re: f64 = self.rng.sample(StandardNormal);
        let im: f64 = self.rng.sample(StandardNormal);
        Complex::new(re * self.sigma, im * self.sigma)
    }

    /// Fills `buffer` with `buffer.len()` independent complex Gaussian
    /// samples, as the scene loop does once per millisecond.
    pub fn fill(&mut self, buffer: &mut [Complex]) {
        for sample in buffer {
            *sample = self.next_sample();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_seed() {
        let mut a = NoiseSource::new(42);
        let mut b = NoiseSource::new(42);
        let mut buf_a = [Complex::default(); 16];
        let mut buf_b = [Complex::default(); 16];
        a.fill(&mut buf_a);
        b.fill(&mut buf_b);
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = NoiseSource::new(1);
        let mut b = NoiseSource::new(2);
        assert_ne!(a.next_sample(), b.next_sample());
    }

    #[test]
    fn phase_cycles_zero_is_unit_real() {
        let c = Complex::from_phase_cycles(0.0);
        assert!((c.re - 1.0).abs() < 1e-12);
        assert!(c.im.abs() < 1e-12);
    }

    #[test]
    fn complex_mul_rotates_phase() {
        let quarter_turn = Complex::from_phase_cycles(0.25);
        let product = Complex::new(1.0, 0.0) * quarter_turn;
        assert!(product.re.abs() < 1e-9);
        assert!((product.im - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sample_variance_near_unity() {
        let mut source = NoiseSource::new(7);
        let n = 20_000;
        let mut sum_sq_re = 0.0;
        let mut sum_sq_im = 0.0;
        for _ in 0..n {
            let s = source.next_sample();
            sum_sq_re += s.re * s.re;
            sum_sq_im += s.im * s.im;
        }
        let var_re = sum_sq_re / f64::from(n as u32);
        let var_im = sum_sq_im / f64::from(n as u32);
        assert!((var_re - 1.0).abs() < 0.1, "var_re = {var_re}");
        assert!((var_im - 1.0).abs() < 0.1, "var_im = {var_im}");
    }
}
