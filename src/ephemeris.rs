// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Broadcast orbital data and the runtime parameters derived from it
//!
//! The scene loop ([`crate::scene`]) owns one [`EphemerisTable`] and one
//! [`AlmanacTable`] per constellation for the lifetime of the run; navigation
//! engines borrow individual records read-only via [`crate::navmsg`]'s
//! `set_ephemeris`/`set_almanac` setters. Per-step outputs (Doppler, power,
//! ionospheric delay) are collected into [`SatelliteParam`], one per visible
//! `(SV, signal)` pair.

use nalgebra::Vector3;

use crate::coords::AzimuthElevation;
use crate::system::System;

/// A Keplerian broadcast ephemeris, shared by GPS, BeiDou, and Galileo.
///
/// Field names follow the ICD conventions (`a`, `e`, `i0`, harmonic
/// correction terms, etc.) rather than generic physics notation, since every
/// nav-message engine packs these directly into ICD bit fields.
#[derive(Debug, Clone, PartialEq)]
pub struct KeplerianEphemeris {
    pub svid: u16,
    /// Reference week number for `toe`/`toc`
    pub week: u16,
    /// Time of ephemeris, seconds of week
    pub toe: f64,
    /// Time of clock, seconds of week
    pub toc: f64,
    /// Semi-major axis, metres
    pub a: f64,
    /// Rate of change of semi-major axis (CNAV/CNAV2/B-CNAV only), m/s
    pub a_dot: f64,
    /// Eccentricity
    pub e: f64,
    /// Inclination at reference time, radians
    pub i0: f64,
    /// Rate of inclination angle, rad/s
    pub idot: f64,
    /// Longitude of ascending node at weekly epoch, radians
    pub omega0: f64,
    /// Rate of right ascension, rad/s
    pub omega_dot: f64,
    /// Argument of perigee, radians
    pub omega: f64,
    /// Mean anomaly at reference time, radians
    pub m0: f64,
    /// Mean motion correction, rad/s
    pub delta_n: f64,
    /// Rate of mean motion correction (CNAV2/B-CNAV only), rad/s^2
    pub delta_n_dot: f64,
    /// Harmonic correction terms
    pub cuc: f64,
    pub cus: f64,
    pub crc: f64,
    pub crs: f64,
    pub cic: f64,
    pub cis: f64,
    /// Clock correction polynomial coefficients
    pub af0: f64,
    pub af1: f64,
    pub af2: f64,
    /// Issue of data, ephemeris
    pub iode: u16,
    /// Issue of data, clock
    pub iodc: u16,
    /// `true` if the SV is marked healthy
    pub healthy: bool,
    /// Per-band group delay / inter-signal correction, seconds, indexed by
    /// the signal's [`crate::system::SignalId::select_bit`]
    pub group_delay: Vec<f64>,
}

impl KeplerianEphemeris {
    /// Group delay for a specific signal band, or 0 if this ephemeris
    /// doesn't carry a correction for it
    #[must_use]
    pub fn group_delay_for(&self, select_bit: u8) -> f64 {
        self.group_delay
            .get(select_bit as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// GLONASS broadcasts orbital state directly (position/velocity/acceleration
/// at a reference time) rather than Keplerian elements.
#[derive(Debug, Clone, PartialEq)]
pub struct GlonassEphemeris {
    pub svid: u16,
    /// Reference time within the day, seconds (`tb`)
    pub tb: f64,
    /// ECEF position at `tb`, metres
    pub pos: Vector3<f64>,
    /// ECEF velocity at `tb`, m/s
    pub vel: Vector3<f64>,
    /// Lunisolar acceleration at `tb`, m/s^2
    pub acc: Vector3<f64>,
    /// Coarse clock correction, seconds (`tau_n`)
    pub tau_n: f64,
    /// Relative carrier frequency offset (`gamma_n`)
    pub gamma_n: f64,
    /// FDMA frequency channel number, `-7..=6`
    pub freq_channel: i8,
    /// `true` if the SV is marked healthy
    pub healthy: bool,
}

/// Low-precision almanac record, valid for coarse acquisition over days.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmanacRecord {
    pub svid: u16,
    pub week: u16,
    /// Time of almanac, seconds of week
    pub toa: f64,
    pub e: f64,
    pub i0: f64,
    pub omega0: f64,
    pub omega_dot: f64,
    pub omega: f64,
    pub m0: f64,
    /// Square root of semi-major axis, sqrt(m)
    pub sqrt_a: f64,
    pub af0: f64,
    pub af1: f64,
    pub healthy: bool,
}

/// Ionospheric correction model parameters (Klobuchar alpha/beta) plus the
/// UTC offset parameters broadcast alongside them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IonoUtcParams {
    /// Klobuchar alpha coefficients
    pub alpha: [f64; 4],
    /// Klobuchar beta coefficients
    pub beta: [f64; 4],
    /// UTC offset polynomial constant term, seconds
    pub a0: f64,
    /// UTC offset polynomial rate term, s/s
    pub a1: f64,
    /// Reference time of UTC parameters, seconds of week
    pub tot: f64,
    /// Reference week of UTC parameters
    pub wn_t: u16,
    /// Current leap second count
    pub leap_seconds: i32,
    /// Future leap second count, effective at `wn_lsf`/`dn`
    pub leap_seconds_future: i32,
    pub wn_lsf: u16,
    pub dn: u16,
}

/// A fixed-size, SVID-indexed arena, sized once to a constellation's ICD
/// maximum SV count.
///
/// Modelled as "arena + index" per the design notes: `svid` is 1-based, so
/// storage slot `svid - 1` holds that satellite's record, or `None` if it
/// hasn't been loaded for this run.
#[derive(Debug, Clone)]
pub struct SvArena<T> {
    slots: Vec<Option<T>>,
}

impl<T> SvArena<T> {
    /// Builds an empty arena sized for `system`'s maximum SV count
    #[must_use]
    pub fn new(system: System) -> Self {
        SvArena {
            slots: (0..system.sat_count()).map(|_| None).collect(),
        }
    }

    /// Inserts or replaces the record for `svid` (1-based)
    pub fn set(&mut self, svid: u16, record: T) {
        if let Some(slot) = self.slots.get_mut(usize::from(svid.saturating_sub(1))) {
            *slot = Some(record);
        }
    }

    #[must_use]
    pub fn get(&self, svid: u16) -> Option<&T> {
        self.slots.get(usize::from(svid.checked_sub(1)?))?.as_ref()
    }

    /// Iterates over the `(svid, record)` pairs that have been loaded
    pub fn iter(&self) -> impl Iterator<Item = (u16, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|r| (i as u16 + 1, r)))
    }

    /// `true` if no SV has a record loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Per-satellite, per-signal runtime parameters recomputed every time
/// visibility or geometry changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteParam {
    /// One-way signal travel time, seconds
    pub travel_time_s: f64,
    /// Doppler-shifted carrier frequency offset, Hz
    pub doppler_hz: f64,
    /// Running carrier phase for this band, cycles
    pub carrier_phase_cycles: f64,
    pub az_el: AzimuthElevation,
    /// Ionospheric delay, seconds
    pub iono_delay_s: f64,
    /// Carrier-to-noise density ratio, dB-Hz times 100
    pub cn0_x100: i32,
}

impl SatelliteParam {
    #[must_use]
    pub fn cn0_db_hz(&self) -> f64 {
        f64::from(self.cn0_x100) / 100.0
    }
}

/// Binary sample format requested for the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum SampleFormat {
    /// Packed 4-bit signed-magnitude samples, 1 byte per I/Q pair
    Iq4,
    /// Signed 8-bit samples, 2 bytes per I/Q pair
    Iq8,
}

impl SampleFormat {
    /// Bytes consumed by one complex sample in this format
    #[must_use]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Iq4 => 1,
            SampleFormat::Iq8 => 2,
        }
    }
}

/// The resolved IF-generation plan: sample format, rate, centre frequency,
/// and per-system enabled-signal bitmask.
#[derive(Debug, Clone)]
pub struct OutputParam {
    /// Samples per millisecond
    pub sample_rate: u32,
    /// Centre frequency, kHz
    pub center_freq_khz: f64,
    pub format: SampleFormat,
    /// Per-system bitmask of enabled [`crate::system::SignalId::select_bit`]s
    pub freq_select: [u32; 4],
    pub output_file: std::path::PathBuf,
}

impl OutputParam {
    /// `true` if `signal` is enabled by the per-system `freq_select` bitmask
    #[must_use]
    pub fn signal_enabled(&self, signal: crate::system::SignalId) -> bool {
        let system_idx = match signal.system() {
            System::Gps => 0,
            System::Bds => 1,
            System::Gal => 2,
            System::Glo => 3,
        };
        self.freq_select[system_idx] & (1 << signal.select_bit()) != 0
    }
}
