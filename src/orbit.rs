// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Orbit propagation: Keplerian elements and GLONASS numerical integration
//! to ECEF position/velocity
//!
//! [`propagate_keplerian`] implements the iterative eccentric-anomaly solve
//! and harmonic corrections common to GPS, Galileo, and BeiDou MEO/IGSO
//! ephemerides; BeiDou GEO satellites additionally need the two extra
//! rotations the ICD applies to counter-rotate out of the inertial-like GEO
//! frame, via [`propagate_beidou_geo`]. [`propagate_glonass`] numerically
//! integrates the broadcast position/velocity/acceleration state with a
//! fixed-step RK4 scheme, as GLONASS broadcasts osculating elements rather
//! than a closed-form orbit.

use nalgebra::{Rotation3, Vector3, Vector4};

use crate::coords::ECEF;
use crate::ephemeris::{GlonassEphemeris, KeplerianEphemeris};
use crate::system::System;

/// WGS84/CGCS2000/GTRF Earth rotation rate, rad/s (shared to within
/// floating-point noise across GPS, Galileo, and BeiDou ICDs)
const EARTH_ROTATION_RATE: f64 = 7.292_115_146_7e-5;
/// BeiDou ICD's own rotation-rate constant, used only for the GEO frame fix
const BEIDOU_ROTATION_RATE: f64 = 7.292_115e-5;

fn gm_for(system: System) -> f64 {
    match system {
        System::Gps => 3.986_005_0e14,
        System::Gal | System::Bds => 3.986_004_418e14,
        System::Glo => 3.986_004_4e14,
    }
}

/// `true` if `svid` falls in BeiDou's GEO PRN ranges, matching
/// [`crate::navmsg::D1D2Engine`]'s classification.
#[must_use]
pub fn is_beidou_geo(svid: u16) -> bool {
    (1..=5).contains(&svid) || (59..=63).contains(&svid)
}

struct OrbitInPlane {
    x: f64,
    y: f64,
    fd_x: f64,
    fd_y: f64,
    i_k: f64,
    fd_i_k: f64,
    omega_k: f64,
    fd_omega_k: f64,
}

fn solve_in_plane(eph: &KeplerianEphemeris, system: System, dt: f64) -> OrbitInPlane {
    let gm = gm_for(system);
    let a = eph.a + eph.a_dot * dt;
    let n0 = (gm / a.powi(3)).sqrt();
    let n = n0 + eph.delta_n + eph.delta_n_dot * dt;
    let m_k = eph.m0 + n * dt;

    let mut e_k = m_k;
    for _ in 0..16 {
        let next = m_k + eph.e * e_k.sin();
        if (next - e_k).abs() < 1e-13 {
            e_k = next;
            break;
        }
        e_k = next;
    }

    let (sin_e, cos_e) = e_k.sin_cos();
    let v_k = ((1.0 - eph.e.powi(2)).sqrt() * sin_e).atan2(cos_e - eph.e);
    let phi_k = v_k + eph.omega;
    let (sin2phi, cos2phi) = (2.0 * phi_k).sin_cos();

    let du_k = eph.cus * sin2phi + eph.cuc * cos2phi;
    let dr_k = eph.crs * sin2phi + eph.crc * cos2phi;
    let di_k = eph.cis * sin2phi + eph.cic * cos2phi;

    let u_k = phi_k + du_k;
    let r_k = a * (1.0 - eph.e * cos_e) + dr_k;
    let i_k = eph.i0 + eph.idot * dt + di_k;

    let (sin_u, cos_u) = u_k.sin_cos();
    let x = r_k * cos_u;
    let y = r_k * sin_u;

    let fd_e_k = n / (1.0 - eph.e * cos_e);
    let fd_phi_k = ((1.0 + eph.e) / (1.0 - eph.e)).sqrt() * ((v_k / 2.0).cos() / (e_k / 2.0).cos()).powi(2) * fd_e_k;
    let fd_u_k = (eph.cus * cos2phi - eph.cuc * sin2phi) * 2.0 * fd_phi_k + fd_phi_k;
    let fd_r_k = a * eph.e * sin_e * fd_e_k + 2.0 * (eph.crs * cos2phi - eph.crc * sin2phi) * fd_phi_k;
    let fd_i_k = eph.idot + 2.0 * (eph.cis * cos2phi - eph.cic * sin2phi) * fd_phi_k;

    let fd_x = fd_r_k * cos_u - r_k * fd_u_k * sin_u;
    let fd_y = fd_r_k * sin_u + r_k * fd_u_k * cos_u;

    let omega_k = eph.omega0 + eph.omega_dot * dt;
    let fd_omega_k = eph.omega_dot;

    OrbitInPlane {
        x,
        y,
        fd_x,
        fd_y,
        i_k,
        fd_i_k,
        omega_k,
        fd_omega_k,
    }
}

/// Propagates a GPS/Galileo/BeiDou-MEO-or-IGSO ephemeris to ECEF position
/// and velocity at `dt` seconds past `eph.toe`.
#[must_use]
pub fn propagate_keplerian(eph: &KeplerianEphemeris, system: System, dt: f64) -> (ECEF, ECEF) {
    let mut plane = solve_in_plane(eph, system, dt);
    plane.omega_k -= EARTH_ROTATION_RATE * dt;
    plane.fd_omega_k -= EARTH_ROTATION_RATE;

    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), plane.i_k);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), plane.omega_k);
    let pos = (rz * rx) * Vector3::new(plane.x, plane.y, 0.0);

    let (sin_omega, cos_omega) = plane.omega_k.sin_cos();
    let (sin_i, cos_i) = plane.i_k.sin_cos();

    let mut fd_r = nalgebra::SMatrix::<f64, 3, 4>::zeros();
    fd_r[(0, 0)] = cos_omega;
    fd_r[(0, 1)] = -sin_omega * cos_i;
    fd_r[(0, 2)] = -(plane.x * sin_omega + plane.y * cos_omega * cos_i);
    fd_r[(0, 3)] = plane.y * sin_omega * sin_i;
    fd_r[(1, 0)] = sin_omega;
    fd_r[(1, 1)] = cos_omega * cos_i;
    fd_r[(1, 2)] = plane.x * cos_omega - plane.y * sin_omega * cos_i;
    fd_r[(1, 3)] = plane.y * cos_omega * sin_i;
    fd_r[(2, 1)] = sin_i;
    fd_r[(2, 3)] = plane.y * cos_i;

    let vel = fd_r * Vector4::new(plane.fd_x, plane.fd_y, plane.fd_omega_k, plane.fd_i_k);

    (ECEF::new(pos.x, pos.y, pos.z), ECEF::new(vel.x, vel.y, vel.z))
}

/// Propagates a BeiDou GEO ephemeris: solved in the MEO in-plane frame, then
/// counter-rotated by the ICD's fixed 5° inclination plus a time-varying
/// rotation about Z at the BeiDou rotation-rate constant, instead of
/// [`propagate_keplerian`]'s Earth-rotation correction.
#[must_use]
pub fn propagate_beidou_geo(eph: &KeplerianEphemeris, dt: f64) -> (ECEF, ECEF) {
    let plane = solve_in_plane(eph, System::Bds, dt);
    let meo = Rotation3::from_axis_angle(&Vector3::x_axis(), plane.i_k)
        .matrix()
        .clone();
    let meo = Rotation3::from_axis_angle(&Vector3::z_axis(), plane.omega_k).matrix() * meo;
    let orbit_xyz = Vector3::new(plane.x, plane.y, 0.0);
    let geo_xyz = meo * orbit_xyz;

    let rx5 = Rotation3::from_axis_angle(&Vector3::x_axis(), 5.0_f64.to_radians());
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), -BEIDOU_ROTATION_RATE * dt);
    let pos = rz * (rx5 * geo_xyz);

    // Velocity via finite difference: the GEO frame rotation is time-varying
    // in a way that doesn't reduce to a single closed-form Jacobian as cleanly
    // as the MEO case, so step dt by a small epsilon and differentiate.
    const EPS: f64 = 0.05;
    let plane_fwd = solve_in_plane(eph, System::Bds, dt + EPS);
    let meo_fwd = Rotation3::from_axis_angle(&Vector3::x_axis(), plane_fwd.i_k)
        .matrix()
        .clone();
    let meo_fwd = Rotation3::from_axis_angle(&Vector3::z_axis(), plane_fwd.omega_k).matrix() * meo_fwd;
    let geo_xyz_fwd = meo_fwd * Vector3::new(plane_fwd.x, plane_fwd.y, 0.0);
    let rz_fwd = Rotation3::from_axis_angle(&Vector3::z_axis(), -BEIDOU_ROTATION_RATE * (dt + EPS));
    let pos_fwd = rz_fwd * (rx5 * geo_xyz_fwd);

    let vel = (pos_fwd - pos) / EPS;

    (ECEF::new(pos.x, pos.y, pos.z), ECEF::new(vel.x, vel.y, vel.z))
}

/// Right-hand side of GLONASS's equation of motion: gravity with the J2
/// oblateness term, plus the broadcast lunisolar acceleration held constant
/// over the integration span (per the GLONASS ICD's numerical-integration
/// appendix).
fn glonass_acceleration(pos: Vector3<f64>, luni_solar: Vector3<f64>) -> Vector3<f64> {
    const MU: f64 = 3.986_004_4e14;
    const A_E: f64 = 6_378_136.0;
    const J2: f64 = 1.082_625_75e-3;

    let r = pos.norm();
    let z2_over_r2 = (pos.z / r).powi(2);
    let factor = -MU / r.powi(3);
    let oblate = 1.5 * J2 * (A_E / r).powi(2);

    let gx = factor * pos.x * (1.0 + oblate * (1.0 - 5.0 * z2_over_r2));
    let gy = factor * pos.y * (1.0 + oblate * (1.0 - 5.0 * z2_over_r2));
    let gz = factor * pos.z * (1.0 + oblate * (3.0 - 5.0 * z2_over_r2));

    Vector3::new(gx, gy, gz) + luni_solar
}

/// Integrates a GLONASS ephemeris from `tb` to `tb + dt` using fixed-step
/// RK4, per the ICD's recommended numerical-integration method.
#[must_use]
pub fn propagate_glonass(eph: &GlonassEphemeris, dt: f64) -> (ECEF, ECEF) {
    const STEP: f64 = 60.0;

    let mut pos = eph.pos;
    let mut vel = eph.vel;
    let acc = eph.acc;

    let mut remaining = dt;
    while remaining.abs() > 1e-9 {
        let h = remaining.clamp(-STEP, STEP);

        let deriv = |p: Vector3<f64>, v: Vector3<f64>| -> (Vector3<f64>, Vector3<f64>) {
            (v, glonass_acceleration(p, acc))
        };

        let (k1_v, k1_a) = deriv(pos, vel);
        let (k2_v, k2_a) = deriv(pos + k1_v * (h / 2.0), vel + k1_a * (h / 2.0));
        let (k3_v, k3_a) = deriv(pos + k2_v * (h / 2.0), vel + k2_a * (h / 2.0));
        let (k4_v, k4_a) = deriv(pos + k3_v * h, vel + k3_a * h);

        pos += (h / 6.0) * (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v);
        vel += (h / 6.0) * (k1_a + 2.0 * k2_a + 2.0 * k3_a + k4_a);

        remaining -= h;
    }

    (ECEF::new(pos.x, pos.y, pos.z), ECEF::new(vel.x, vel.y, vel.z))
}

/// Dispatches to the appropriate Keplerian propagator for `system`/`svid`,
/// routing BeiDou GEO SVs through [`propagate_beidou_geo`].
#[must_use]
pub fn propagate(eph: &KeplerianEphemeris, system: System, svid: u16, dt: f64) -> (ECEF, ECEF) {
    if system == System::Bds && is_beidou_geo(svid) {
        propagate_beidou_geo(eph, dt)
    } else {
        propagate_keplerian(eph, system, dt)
    }
}
