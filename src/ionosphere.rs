// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Klobuchar ionospheric delay model
//!
//! [`klobuchar_delay`] estimates the single-frequency ionospheric group delay
//! a GPS receiver would observe, from the broadcast alpha/beta coefficients
//! in [`crate::ephemeris::IonoUtcParams`] and the receiver/satellite geometry.
//! [`crate::scene`] recomputes this once per visibility pass per
//! `(receiver, satellite)` pair and folds it into [`crate::ephemeris::SatelliteParam::iono_delay_s`].

use crate::coords::{AzimuthElevation, LLHRadians};
use crate::ephemeris::IonoUtcParams;

const SEMICIRCLE: f64 = std::f64::consts::PI;

fn klobuchar_poly(x_semicircles: f64, coeffs: [f64; 4]) -> f64 {
    coeffs[0] + coeffs[1] * x_semicircles + coeffs[2] * x_semicircles.powi(2) + coeffs[3] * x_semicircles.powi(3)
}

/// Single-frequency ionospheric delay, seconds, at `gps_tow` seconds of
/// week, for a receiver at `receiver_llh` observing a satellite at
/// `az_el` (radians), per the Klobuchar model (ICD-GPS-200 §20.3.3.5.2.5).
#[must_use]
pub fn klobuchar_delay(receiver_llh: &LLHRadians, az_el: AzimuthElevation, gps_tow: f64, iono: &IonoUtcParams) -> f64 {
    if iono.alpha == [0.0; 4] && iono.beta == [0.0; 4] {
        return 0.0;
    }

    let az = az_el.az();
    let el = az_el.el() / SEMICIRCLE;
    let phi_u = receiver_llh.latitude() / SEMICIRCLE;
    let lambda_u = receiver_llh.longitude() / SEMICIRCLE;

    let psi = 0.0137 / (el + 0.11) - 0.022;

    let mut phi_i = phi_u + psi * az.cos();
    phi_i = phi_i.clamp(-0.416, 0.416);

    let lambda_i = lambda_u + psi * az.sin() / (phi_i * SEMICIRCLE).cos();
    let phi_m = phi_i + 0.064 * ((lambda_i - 1.617) * SEMICIRCLE).cos();

    let mut t = 43_200.0 * lambda_i + gps_tow;
    t -= (t / 86_400.0).floor() * 86_400.0;

    let amplitude = klobuchar_poly(phi_m, iono.alpha).max(0.0);
    let period = klobuchar_poly(phi_m, iono.beta).max(72_000.0);

    let x = 2.0 * std::f64::consts::PI * (t - 50_400.0) / period;
    let obliquity = 1.0 + 16.0 * (0.53 - el).powi(3);

    let delay = if x.abs() < 1.57 {
        5e-9 + amplitude * (1.0 - x.powi(2) / 2.0 + x.powi(4) / 24.0)
    } else {
        5e-9
    };
    delay * obliquity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_iono() -> IonoUtcParams {
        IonoUtcParams {
            alpha: [3.82e-8, 1.49e-8, -1.79e-7, 0.0],
            beta: [1.43e5, 0.0, -3.28e5, 1.13e5],
            ..Default::default()
        }
    }

    #[test]
    fn zenith_delay_is_small_and_nonnegative() {
        let receiver = LLHRadians::new(0.659, -2.136, 60.0);
        let az_el = AzimuthElevation::new(0.0, std::f64::consts::FRAC_PI_2);
        let delay = klobuchar_delay(&receiver, az_el, 50_000.0, &sample_iono());
        assert!(delay >= 0.0);
        assert!(delay < 1e-6);
    }

    #[test]
    fn low_elevation_delay_exceeds_zenith() {
        let receiver = LLHRadians::new(0.659, -2.136, 60.0);
        let zenith = klobuchar_delay(&receiver, AzimuthElevation::new(0.0, std::f64::consts::FRAC_PI_2), 50_000.0, &sample_iono());
        let low = klobuchar_delay(&receiver, AzimuthElevation::new(0.0, 0.09), 50_000.0, &sample_iono());
        assert!(low > zenith);
    }

    #[test]
    fn all_zero_coefficients_mean_no_correction() {
        let receiver = LLHRadians::new(0.0, 0.0, 0.0);
        let delay = klobuchar_delay(&receiver, AzimuthElevation::new(0.1, 0.5), 0.0, &IonoUtcParams::default());
        assert_eq!(delay, 0.0);
    }
}
