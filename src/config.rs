// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Configuration document, §6 "Configuration document"
//!
//! [`Config`] is the `serde`-deserialised shape of the JSON document named on
//! the command line; every key is optional so a near-empty document still
//! resolves (to a stationary, signal-free, noise-only recording). [`Config::resolve`]
//! is the boundary where a document that parses but doesn't make sense -
//! zero sample rate, an empty trajectory, an unparsable sample format -
//! turns into a [`GenError::ConfigInvalid`].

use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::Deserialize;

use crate::coords::{LLHDegrees, LLHRadians, LocalSpeed};
use crate::ephemeris::{AlmanacRecord, GlonassEphemeris, IonoUtcParams, KeplerianEphemeris, OutputParam, SampleFormat};
use crate::error::GenError;
use crate::scene::{AlmanacTable, EphemerisTable};
use crate::system::System;
use crate::time::{GpsTime, UtcTime};
use crate::trajectory::{Trajectory, TrajectorySegment};

#[derive(Debug, Clone, Copy, Deserialize)]
struct TimeSpec {
    year: u16,
    month: u8,
    day: u8,
    #[serde(default)]
    hour: u8,
    #[serde(default)]
    minute: u8,
    #[serde(default)]
    second: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct PositionSpec {
    lat: f64,
    lon: f64,
    #[serde(default)]
    alt: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct VelocitySpec {
    #[serde(default)]
    east: f64,
    #[serde(default)]
    north: f64,
    #[serde(default)]
    up: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TrajectorySegmentSpec {
    Static {
        duration: f64,
    },
    Linear {
        duration: f64,
        #[serde(default)]
        east: f64,
        #[serde(default)]
        north: f64,
        #[serde(default)]
        up: f64,
    },
}

impl TrajectorySegmentSpec {
    fn resolve(self) -> Result<TrajectorySegment, GenError> {
        let duration_s = match self {
            TrajectorySegmentSpec::Static { duration } | TrajectorySegmentSpec::Linear { duration, .. } => duration,
        };
        if duration_s < 0.0 {
            return Err(GenError::ConfigInvalid(format!(
                "trajectory segment duration must be non-negative, got {duration_s}"
            )));
        }
        let duration_ms = (duration_s * 1000.0).round() as u64;
        Ok(match self {
            TrajectorySegmentSpec::Static { .. } => TrajectorySegment::Static { duration_ms },
            TrajectorySegmentSpec::Linear { east, north, up, .. } => TrajectorySegment::Linear {
                duration_ms,
                velocity_enu: LocalSpeed::new(east, north, up),
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct KeplerianEphemerisSpec {
    svid: u16,
    week: u16,
    toe: f64,
    #[serde(default)]
    toc: f64,
    a: f64,
    #[serde(default)]
    a_dot: f64,
    e: f64,
    i0: f64,
    #[serde(default)]
    idot: f64,
    omega0: f64,
    omega_dot: f64,
    omega: f64,
    m0: f64,
    #[serde(default)]
    delta_n: f64,
    #[serde(default)]
    delta_n_dot: f64,
    #[serde(default)]
    cuc: f64,
    #[serde(default)]
    cus: f64,
    #[serde(default)]
    crc: f64,
    #[serde(default)]
    crs: f64,
    #[serde(default)]
    cic: f64,
    #[serde(default)]
    cis: f64,
    #[serde(default)]
    af0: f64,
    #[serde(default)]
    af1: f64,
    #[serde(default)]
    af2: f64,
    #[serde(default)]
    iode: u16,
    #[serde(default)]
    iodc: u16,
    #[serde(default = "default_true")]
    healthy: bool,
    #[serde(default)]
    group_delay: Vec<f64>,
}

fn default_true() -> bool {
    true
}

impl From<KeplerianEphemerisSpec> for KeplerianEphemeris {
    fn from(s: KeplerianEphemerisSpec) -> Self {
        KeplerianEphemeris {
            svid: s.svid,
            week: s.week,
            toe: s.toe,
            toc: if s.toc == 0.0 { s.toe } else { s.toc },
            a: s.a,
            a_dot: s.a_dot,
            e: s.e,
            i0: s.i0,
            idot: s.idot,
            omega0: s.omega0,
            omega_dot: s.omega_dot,
            omega: s.omega,
            m0: s.m0,
            delta_n: s.delta_n,
            delta_n_dot: s.delta_n_dot,
            cuc: s.cuc,
            cus: s.cus,
            crc: s.crc,
            crs: s.crs,
            cic: s.cic,
            cis: s.cis,
            af0: s.af0,
            af1: s.af1,
            af2: s.af2,
            iode: s.iode,
            iodc: s.iodc,
            healthy: s.healthy,
            group_delay: s.group_delay,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GlonassEphemerisSpec {
    svid: u16,
    tb: f64,
    pos: [f64; 3],
    vel: [f64; 3],
    #[serde(default)]
    acc: [f64; 3],
    #[serde(default)]
    tau_n: f64,
    #[serde(default)]
    gamma_n: f64,
    freq_channel: i8,
    #[serde(default = "default_true")]
    healthy: bool,
}

impl From<GlonassEphemerisSpec> for GlonassEphemeris {
    fn from(s: GlonassEphemerisSpec) -> Self {
        GlonassEphemeris {
            svid: s.svid,
            tb: s.tb,
            pos: Vector3::from_row_slice(&s.pos),
            vel: Vector3::from_row_slice(&s.vel),
            acc: Vector3::from_row_slice(&s.acc),
            tau_n: s.tau_n,
            gamma_n: s.gamma_n,
            freq_channel: s.freq_channel,
            healthy: s.healthy,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AlmanacRecordSpec {
    svid: u16,
    week: u16,
    toa: f64,
    #[serde(default)]
    e: f64,
    #[serde(default)]
    i0: f64,
    #[serde(default)]
    omega0: f64,
    #[serde(default)]
    omega_dot: f64,
    #[serde(default)]
    omega: f64,
    #[serde(default)]
    m0: f64,
    sqrt_a: f64,
    #[serde(default)]
    af0: f64,
    #[serde(default)]
    af1: f64,
    #[serde(default = "default_true")]
    healthy: bool,
}

impl From<AlmanacRecordSpec> for AlmanacRecord {
    fn from(s: AlmanacRecordSpec) -> Self {
        AlmanacRecord {
            svid: s.svid,
            week: s.week,
            toa: s.toa,
            e: s.e,
            i0: s.i0,
            omega0: s.omega0,
            omega_dot: s.omega_dot,
            omega: s.omega,
            m0: s.m0,
            sqrt_a: s.sqrt_a,
            af0: s.af0,
            af1: s.af1,
            healthy: s.healthy,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EphemerisSpec {
    gps: Vec<KeplerianEphemerisSpec>,
    bds: Vec<KeplerianEphemerisSpec>,
    gal: Vec<KeplerianEphemerisSpec>,
    glo: Vec<GlonassEphemerisSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AlmanacSpec {
    gps: Vec<AlmanacRecordSpec>,
    bds: Vec<AlmanacRecordSpec>,
    gal: Vec<AlmanacRecordSpec>,
    glo: Vec<AlmanacRecordSpec>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct IonoSpec {
    alpha: [f64; 4],
    beta: [f64; 4],
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct UtcSpec {
    a0: f64,
    a1: f64,
    tot: f64,
    wn_t: u16,
    leap_seconds: i32,
    leap_seconds_future: i32,
    wn_lsf: u16,
    dn: u16,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum SampleFormatSpec {
    Iq4,
    Iq8,
}

impl From<SampleFormatSpec> for SampleFormat {
    fn from(s: SampleFormatSpec) -> Self {
        match s {
            SampleFormatSpec::Iq4 => SampleFormat::Iq4,
            SampleFormatSpec::Iq8 => SampleFormat::Iq8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputSpec {
    format: SampleFormatSpec,
    sample_freq: u32,
    center_freq: f64,
    file: PathBuf,
    #[serde(default)]
    freq_select: [u32; 4],
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct PowerControlSpec {
    /// Receiver elevation mask, degrees. Overrides the generator default (5°).
    elevation_mask_deg: Option<f64>,
    /// Standard deviation of the injected thermal-noise floor, per I/Q component.
    noise_sigma: Option<f64>,
}

/// The configuration document, §6. Every field is optional; [`Config::resolve`]
/// is where missing/inconsistent combinations become [`GenError::ConfigInvalid`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    time: Option<TimeSpec>,
    position: Option<PositionSpec>,
    velocity: VelocitySpec,
    trajectory: Vec<TrajectorySegmentSpec>,
    ephemeris: EphemerisSpec,
    almanac: AlmanacSpec,
    iono: IonoSpec,
    utc: UtcSpec,
    output: Option<OutputSpec>,
    power_control: PowerControlSpec,
    /// Not part of the original schema: seeds the deterministic noise source
    /// (§4.9 calls generation "deterministic given a seeded PRNG").
    noise_seed: u64,
}

/// Everything a [`crate::scene::Scene`] needs to start a run, resolved from
/// a parsed [`Config`].
pub struct ResolvedScene {
    pub output: OutputParam,
    pub trajectory: Trajectory,
    pub initial_llh: LLHRadians,
    pub ephemeris: EphemerisTable,
    pub almanac: AlmanacTable,
    pub iono_utc: IonoUtcParams,
    pub elevation_mask_deg: f64,
    pub noise_seed: u64,
    pub noise_sigma: f64,
    pub start_time: GpsTime,
}

const DEFAULT_ELEVATION_MASK_DEG: f64 = 5.0;
const DEFAULT_NOISE_SIGMA: f64 = 1.0;

impl Config {
    /// Reads and parses the document at `path`. I/O and JSON-syntax failures
    /// both surface as [`GenError::ConfigInvalid`] (they are read failures
    /// per §6's CLI exit-code convention, not [`GenError::SinkIoFailure`],
    /// which is reserved for the output recording).
    pub fn load(path: impl AsRef<Path>) -> Result<Config, GenError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GenError::ConfigInvalid(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&text).map_err(|e| GenError::ConfigInvalid(format!("parsing {}: {e}", path.display())))
    }

    /// Validates the document and resolves it into the inputs
    /// [`crate::scene::Scene::new`] expects.
    pub fn resolve(self) -> Result<ResolvedScene, GenError> {
        let output_spec = self
            .output
            .ok_or_else(|| GenError::ConfigInvalid("missing required `output` section".into()))?;
        if output_spec.sample_freq == 0 {
            return Err(GenError::ConfigInvalid("output.sampleFreq must be positive".into()));
        }
        let output = OutputParam {
            sample_rate: output_spec.sample_freq,
            center_freq_khz: output_spec.center_freq,
            format: output_spec.format.into(),
            freq_select: output_spec.freq_select,
            output_file: output_spec.file,
        };

        let position = self.position.unwrap_or(PositionSpec { lat: 0.0, lon: 0.0, alt: 0.0 });
        let initial_llh = LLHDegrees::new(position.lat, position.lon, position.alt).to_radians();
        let initial_velocity = LocalSpeed::new(self.velocity.east, self.velocity.north, self.velocity.up);

        if self.trajectory.is_empty() {
            return Err(GenError::ConfigInvalid("trajectory must contain at least one segment".into()));
        }
        let segments = self
            .trajectory
            .into_iter()
            .map(TrajectorySegmentSpec::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let trajectory = Trajectory::new(initial_llh, initial_velocity, segments);

        let mut ephemeris = EphemerisTable::new();
        for eph in self.ephemeris.gps {
            ephemeris.set_keplerian(System::Gps, eph.into());
        }
        for eph in self.ephemeris.bds {
            ephemeris.set_keplerian(System::Bds, eph.into());
        }
        for eph in self.ephemeris.gal {
            ephemeris.set_keplerian(System::Gal, eph.into());
        }
        for eph in self.ephemeris.glo {
            ephemeris.set_glonass(eph.into());
        }

        let mut almanac = AlmanacTable::new();
        for alm in self.almanac.gps {
            almanac.set(System::Gps, alm.into());
        }
        for alm in self.almanac.bds {
            almanac.set(System::Bds, alm.into());
        }
        for alm in self.almanac.gal {
            almanac.set(System::Gal, alm.into());
        }
        for alm in self.almanac.glo {
            almanac.set(System::Glo, alm.into());
        }

        let iono_utc = IonoUtcParams {
            alpha: self.iono.alpha,
            beta: self.iono.beta,
            a0: self.utc.a0,
            a1: self.utc.a1,
            tot: self.utc.tot,
            wn_t: self.utc.wn_t,
            leap_seconds: self.utc.leap_seconds,
            leap_seconds_future: self.utc.leap_seconds_future,
            wn_lsf: self.utc.wn_lsf,
            dn: self.utc.dn,
        };

        let time = self.time.unwrap_or(TimeSpec {
            year: 2024,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0.0,
        });
        if !(1..=12).contains(&time.month) || !(1..=31).contains(&time.day) {
            return Err(GenError::ConfigInvalid(format!(
                "invalid calendar date {}-{:02}-{:02}",
                time.year, time.month, time.day
            )));
        }
        let start_time = UtcTime::from_parts(time.year, time.month, time.day, time.hour, time.minute, time.second).to_gps_hardcoded();

        Ok(ResolvedScene {
            output,
            trajectory,
            initial_llh,
            ephemeris,
            almanac,
            iono_utc,
            elevation_mask_deg: self.power_control.elevation_mask_deg.unwrap_or(DEFAULT_ELEVATION_MASK_DEG),
            noise_seed: self.noise_seed,
            noise_sigma: self.power_control.noise_sigma.unwrap_or(DEFAULT_NOISE_SIGMA),
            start_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "trajectory": [{"type": "static", "duration": 0.01}],
            "output": {
                "format": "IQ4",
                "sampleFreq": 4,
                "centerFreq": 1575420.0,
                "file": "out.bin",
                "freqSelect": [1, 0, 0, 0]
            }
        }"#
    }

    #[test]
    fn minimal_document_resolves() {
        let config: Config = serde_json::from_str(minimal_json()).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.output.sample_rate, 4);
        assert!(resolved.ephemeris.keplerian(System::Gps).unwrap().is_empty());
    }

    #[test]
    fn missing_output_is_config_invalid() {
        let config: Config = serde_json::from_str(r#"{"trajectory": [{"type": "static", "duration": 1.0}]}"#).unwrap();
        assert!(matches!(config.resolve(), Err(GenError::ConfigInvalid(_))));
    }

    #[test]
    fn zero_sample_rate_is_config_invalid() {
        let json = r#"{
            "trajectory": [{"type": "static", "duration": 1.0}],
            "output": {"format": "IQ8", "sampleFreq": 0, "centerFreq": 0.0, "file": "o.bin", "freqSelect": [0,0,0,0]}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(config.resolve(), Err(GenError::ConfigInvalid(_))));
    }

    #[test]
    fn empty_trajectory_is_config_invalid() {
        let json = r#"{
            "output": {"format": "IQ8", "sampleFreq": 4, "centerFreq": 0.0, "file": "o.bin", "freqSelect": [0,0,0,0]}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(config.resolve(), Err(GenError::ConfigInvalid(_))));
    }

    #[test]
    fn inline_ephemeris_is_loaded_into_the_right_system() {
        let json = r#"{
            "trajectory": [{"type": "static", "duration": 1.0}],
            "ephemeris": {
                "gps": [{"svid": 5, "week": 2300, "toe": 100000.0, "a": 26560000.0, "e": 0.01,
                         "i0": 0.95, "omega0": 1.0, "omega_dot": 0.0, "omega": 0.5, "m0": 0.1}]
            },
            "output": {"format": "IQ4", "sampleFreq": 4, "centerFreq": 0.0, "file": "o.bin", "freqSelect": [0,0,0,0]}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        let arena = resolved.ephemeris.keplerian(System::Gps).unwrap();
        assert_eq!(arena.get(5).unwrap().week, 2300);
    }
}
