// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Coordinates and conversions
//!
//! These four coordinate types are defined:
//!  * [LLHDegrees]/[LLHRadians] - Geodetic coordinates, Latitude Longitude Height
//!  * [ECEF] - Cartesian coordinates, Earth Centered, Earth Fixed
//!  * [NED] - Local direction coordinates, North East Down
//!  * [AzimuthElevation] - Relative direction coordinates, Azimuth Elevation
//!
//! # Geodetic to Cartesian
//!
//! Conversion from geodetic coordinates latitude, longitude and height
//! ($\phi$, $\lambda$, $h$) into Cartesian coordinates ($X$, $Y$, $Z$) can be
//! achieved with the following formulae:
//! $$X = (N(\phi) + h) \cos{\phi}\cos{\lambda}$$
//! $$Y = (N(\phi) + h) \cos{\phi}\sin{\lambda}$$
//! $$Z = \left[(1-e^2)N(\phi) + h\right] \sin{\phi}$$
//!
//! Where the 'radius of curvature', $N(\phi)$, is defined as:
//!
//! $$N(\phi) = \frac{a}{\sqrt{1-e^2\sin^2 \phi}}$$
//!
//! and $a$ is the WGS84 semi-major axis and $e$ is the WGS84 eccentricity.
//!
//! # Cartesian to Geodetic
//!
//! Conversion from Cartesian to geodetic coordinates is a much harder problem
//! than conversion from geodetic to Cartesian. There is no satisfactory closed
//! form solution but many different iterative approaches exist.
//!
//! Here we implement a relatively new algorithm due to Fukushima (2006) that is
//! very computationally efficient, not requiring any transcendental function
//! calls during iteration and very few divisions.
//!
//! ## References
//! * "Transformation from Cartesian to Geodetic Coordinates Accelerated by
//!   Halley's Method", T. Fukushima (2006), Journal of Geodesy.

mod ecef;
mod ellipsoid;
mod llh;
mod ned;

pub use ecef::*;
pub use ellipsoid::*;
pub use llh::*;
pub use ned::*;

use nalgebra::{ArrayStorage, Vector2, Vector3};

/// WGS84 local horizontal coordinates consisting of an Azimuth and Elevation, with angles stored as radians
///
/// Azimuth can range from $0$ to $2\pi$. North has an azimuth of $0$, east has an azimuth of $\frac{\pi}{2}$
///
/// Elevation can range from $-\frac{\pi}{2}$ to $\frac{\pi}{2}$. Up has an elevation of $\frac{\pi}{2}$, down an elevation of $-\frac{\pi}{2}$
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct AzimuthElevation(Vector2<f64>);

impl AzimuthElevation {
    /// Create an [`AzimuthElevation`] object from the given azimuth and elevation
    #[must_use]
    pub fn new(az: f64, el: f64) -> AzimuthElevation {
        AzimuthElevation(Vector2::new(az, el))
    }

    /// Create an [`AzimuthElevation`] object from an array
    ///
    /// Element 0 is azimuth, element 1 is elevation
    #[must_use]
    pub const fn from_array(array: &[f64; 2]) -> AzimuthElevation {
        AzimuthElevation(Vector2::from_array_storage(ArrayStorage([*array; 1])))
    }

    /// Get the Azimuth component
    #[must_use]
    pub fn az(&self) -> f64 {
        self.0[0]
    }

    /// Get the Elevation component
    #[must_use]
    pub fn el(&self) -> f64 {
        self.0[1]
    }
}

/// Local ENU (East, North, Up) velocity, as used for receiver dynamics
///
/// Distinct from [`NED`] (which is a direction coordinate for line-of-sight
/// geometry) in that it always represents a rate, not a position offset.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct LocalSpeed(Vector3<f64>);

impl LocalSpeed {
    /// Build a local speed vector from East, North, Up components (m/s)
    #[must_use]
    pub fn new(east: f64, north: f64, up: f64) -> LocalSpeed {
        LocalSpeed(Vector3::new(east, north, up))
    }

    #[must_use]
    pub fn east(&self) -> f64 {
        self.0.x
    }

    #[must_use]
    pub fn north(&self) -> f64 {
        self.0.y
    }

    #[must_use]
    pub fn up(&self) -> f64 {
        self.0.z
    }

    /// Rotate this local ENU velocity into an ECEF velocity vector, using
    /// `origin` as the tangent point.
    #[must_use]
    pub fn to_ecef_vector(&self, origin: &LLHRadians) -> ECEF {
        let (sin_lat, cos_lat) = origin.latitude().sin_cos();
        let (sin_lon, cos_lon) = origin.longitude().sin_cos();

        let x =
            -sin_lon * self.east() - sin_lat * cos_lon * self.north() + cos_lat * cos_lon * self.up();
        let y =
            cos_lon * self.east() - sin_lat * sin_lon * self.north() + cos_lat * sin_lon * self.up();
        let z = cos_lat * self.north() + sin_lat * self.up();

        ECEF::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D2R: f64 = std::f64::consts::PI / 180.0;
    /* Maximum allowable error in quantities with units of length (in meters). */
    const MAX_DIST_ERROR_M: f64 = 1e-6;
    /* Maximum allowable error in quantities with units of angle (in sec of arc).
     * 1 second of arc on the equator is ~31 meters. */
    const MAX_ANGLE_ERROR_DEF: f64 = 1e-7;
    const MAX_ANGLE_ERROR_RAD: f64 = MAX_ANGLE_ERROR_DEF * D2R;

    #[test]
    fn llhrad2deg() {
        let zeros = LLHRadians::from_array(&[0.0; 3]);

        let deg = zeros.to_degrees();
        assert_eq!(0.0, deg.latitude());
        assert_eq!(0.0, deg.longitude());
        assert_eq!(0.0, deg.height());

        let swift_home = LLHDegrees::from_array(&[37.779804, -122.391751, 60.0]);
        let rads = swift_home.to_radians();

        assert!((rads.latitude() - 0.659381970558).abs() < MAX_ANGLE_ERROR_RAD);
        assert!((rads.longitude() + 2.136139032231).abs() < MAX_ANGLE_ERROR_RAD);
        assert!(rads.height() == swift_home.height());
    }

    const LLH_VALUES: [LLHRadians; 10] = [
        LLHRadians::from_array(&[0.0, 0.0, 0.0]),
        LLHRadians::from_array(&[0.0, 180.0 * D2R, 0.0]),
        LLHRadians::from_array(&[0.0, 90.0 * D2R, 0.0]),
        LLHRadians::from_array(&[0.0, -90.0 * D2R, 0.0]),
        LLHRadians::from_array(&[90.0 * D2R, 0.0, 0.0]),
        LLHRadians::from_array(&[-90.0 * D2R, 0.0, 0.0]),
        LLHRadians::from_array(&[90.0 * D2R, 0.0, 22.0]),
        LLHRadians::from_array(&[-90.0 * D2R, 0.0, 22.0]),
        LLHRadians::from_array(&[0.0, 0.0, 22.0]),
        LLHRadians::from_array(&[0.0, 180.0 * D2R, 22.0]),
    ];

    const EARTH_A: f64 = 6_378_137.0;
    const EARTH_B: f64 = 6_356_752.314_245_179;

    const ECEF_VALUES: [ECEF; 10] = [
        ECEF::from_array(&[EARTH_A, 0.0, 0.0]),
        ECEF::from_array(&[-EARTH_A, 0.0, 0.0]),
        ECEF::from_array(&[0.0, EARTH_A, 0.0]),
        ECEF::from_array(&[0.0, -EARTH_A, 0.0]),
        ECEF::from_array(&[0.0, 0.0, EARTH_B]),
        ECEF::from_array(&[0.0, 0.0, -EARTH_B]),
        ECEF::from_array(&[0.0, 0.0, (EARTH_B + 22.0)]),
        ECEF::from_array(&[0.0, 0.0, -(EARTH_B + 22.0)]),
        ECEF::from_array(&[(22.0 + EARTH_A), 0.0, 0.0]),
        ECEF::from_array(&[-(22.0 + EARTH_A), 0.0, 0.0]),
    ];

    #[test]
    fn llh2ecef() {
        for (llh_input, expected_ecef) in LLH_VALUES.iter().zip(ECEF_VALUES.iter()) {
            let ecef = llh_input.to_ecef();
            assert!((ecef.x() - expected_ecef.x()).abs() < MAX_DIST_ERROR_M);
            assert!((ecef.y() - expected_ecef.y()).abs() < MAX_DIST_ERROR_M);
            assert!((ecef.z() - expected_ecef.z()).abs() < MAX_DIST_ERROR_M);
        }
    }

    #[test]
    fn ecef2llh() {
        for (ecef_input, expected_llh) in ECEF_VALUES.iter().zip(LLH_VALUES.iter()) {
            let llh = ecef_input.to_llh();
            assert!((llh.latitude() - expected_llh.latitude()).abs() < MAX_ANGLE_ERROR_RAD);
            assert!((llh.longitude() - expected_llh.longitude()).abs() < MAX_ANGLE_ERROR_RAD);
            assert!((llh.height() - expected_llh.height()).abs() < MAX_DIST_ERROR_M);
        }
    }

    #[test]
    fn local_speed_roundtrip() {
        let origin = LLHRadians::new(0.0, 0.0, 0.0);
        let speed = LocalSpeed::new(1.0, 2.0, 3.0);
        let ecef_vel = speed.to_ecef_vector(&origin);
        // At the equator/prime-meridian tangent point, up is +x, north is +z, east is +y.
        assert!((ecef_vel.x() - 3.0).abs() < 1e-9);
        assert!((ecef_vel.y() - 1.0).abs() < 1e-9);
        assert!((ecef_vel.z() - 2.0).abs() < 1e-9);
    }
}
