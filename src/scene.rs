// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! The per-millisecond scene loop, §4.7
//!
//! [`Scene`] owns everything a recording needs for its whole duration: the
//! broadcast orbital data ([`EphemerisTable`]/[`AlmanacTable`]), the
//! navigation-message engines, the receiver's [`crate::trajectory::Trajectory`],
//! and the set of currently-visible [`crate::channel::SatelliteIfChannel`]s.
//! [`Scene::generate_ms`] is the whole generator's heartbeat: it advances the
//! receiver by one millisecond, periodically refreshes which satellites are
//! visible and what their instantaneous geometry/power looks like, sums every
//! visible channel's contribution onto a noise floor, and applies AGC.
//!
//! Per the design notes' concurrency model, channel accumulation within one
//! millisecond is data-parallel (channels are independent and their outputs
//! only ever get summed); advancing from one millisecond to the next is
//! strictly sequential, since every channel's phase/chip accumulators carry
//! state forward.

use rayon::prelude::*;
use strum::IntoEnumIterator;

use crate::channel::SatelliteIfChannel;
use crate::coords::{LLHRadians, ECEF};
use crate::ephemeris::{AlmanacRecord, GlonassEphemeris, IonoUtcParams, KeplerianEphemeris, OutputParam, SatelliteParam, SvArena};
use crate::error::GenError;
use crate::navmsg::{EngineHandle, EphemerisSource, NavEngineTable};
use crate::noise::{Complex, NoiseSource};
use crate::orbit;
use crate::system::{SignalId, System};
use crate::time::GpsTime;
use crate::trajectory::Trajectory;

/// Speed of light in vacuum, m/s, as used throughout the ICDs for range/Doppler.
const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Visibility, Doppler geometry, and link-budget figures are recomputed on
/// this cadence, milliseconds; §4.7 calls this out explicitly as distinct
/// from the per-ms channel accumulation.
const VISIBILITY_PERIOD_MS: u64 = 60_000;
/// AGC gain is re-estimated on this cadence, milliseconds.
const AGC_PERIOD_MS: u64 = 100;
/// Clipping ratio above which the AGC backs the gain off, §4.7 step 9.
const AGC_CLIP_HIGH: f64 = 0.01;
/// Clipping ratio below which the AGC nudges the gain back up.
const AGC_CLIP_LOW: f64 = 0.001;

/// Broadcast orbital data for every constellation, sized once to each
/// system's ICD SV-count maximum.
///
/// GLONASS ephemerides are stored separately from the shared Keplerian arena
/// since they carry position/velocity/acceleration state rather than orbital
/// elements (see [`crate::ephemeris::GlonassEphemeris`]).
pub struct EphemerisTable {
    gps: SvArena<KeplerianEphemeris>,
    bds: SvArena<KeplerianEphemeris>,
    gal: SvArena<KeplerianEphemeris>,
    glo: SvArena<GlonassEphemeris>,
}

impl EphemerisTable {
    #[must_use]
    pub fn new() -> Self {
        EphemerisTable {
            gps: SvArena::new(System::Gps),
            bds: SvArena::new(System::Bds),
            gal: SvArena::new(System::Gal),
            glo: SvArena::new(System::Glo),
        }
    }

    pub fn set_keplerian(&mut self, system: System, eph: KeplerianEphemeris) {
        let svid = eph.svid;
        match system {
            System::Gps => self.gps.set(svid, eph),
            System::Bds => self.bds.set(svid, eph),
            System::Gal => self.gal.set(svid, eph),
            System::Glo => {}
        }
    }

    pub fn set_glonass(&mut self, eph: GlonassEphemeris) {
        self.glo.set(eph.svid, eph);
    }

    /// Returns the arena for `system`, or `None` for [`System::Glo`] (use
    /// [`EphemerisTable::glonass`] instead).
    #[must_use]
    pub fn keplerian(&self, system: System) -> Option<&SvArena<KeplerianEphemeris>> {
        match system {
            System::Gps => Some(&self.gps),
            System::Bds => Some(&self.bds),
            System::Gal => Some(&self.gal),
            System::Glo => None,
        }
    }

    #[must_use]
    pub fn glonass(&self) -> &SvArena<GlonassEphemeris> {
        &self.glo
    }
}

impl Default for EphemerisTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Low-precision almanac records for every constellation, keyed the same way
/// as [`EphemerisTable`].
pub struct AlmanacTable {
    gps: SvArena<AlmanacRecord>,
    bds: SvArena<AlmanacRecord>,
    gal: SvArena<AlmanacRecord>,
    glo: SvArena<AlmanacRecord>,
}

impl AlmanacTable {
    #[must_use]
    pub fn new() -> Self {
        AlmanacTable {
            gps: SvArena::new(System::Gps),
            bds: SvArena::new(System::Bds),
            gal: SvArena::new(System::Gal),
            glo: SvArena::new(System::Glo),
        }
    }

    pub fn set(&mut self, system: System, record: AlmanacRecord) {
        let svid = record.svid;
        match system {
            System::Gps => self.gps.set(svid, record),
            System::Bds => self.bds.set(svid, record),
            System::Gal => self.gal.set(svid, record),
            System::Glo => self.glo.set(svid, record),
        }
    }

    #[must_use]
    pub fn arena(&self, system: System) -> &SvArena<AlmanacRecord> {
        match system {
            System::Gps => &self.gps,
            System::Bds => &self.bds,
            System::Gal => &self.gal,
            System::Glo => &self.glo,
        }
    }
}

impl Default for AlmanacTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A visible `(system, signal, svid)` pair: its live IF channel plus the
/// runtime parameters last computed for it.
struct ChannelEntry {
    system: System,
    signal: SignalId,
    svid: u16,
    channel: SatelliteIfChannel,
    param: SatelliteParam,
}

/// Coarse elevation-to-power link budget: a linear ramp standing in for the
/// antenna-gain-pattern- and free-space-path-loss-driven curve a real link
/// budget would produce. Horizon is quiet, zenith is strong.
fn nominal_cn0_db_hz(elevation_rad: f64) -> f64 {
    const HORIZON_CN0: f64 = 35.0;
    const ZENITH_CN0: f64 = 48.0;
    let el_deg = elevation_rad.to_degrees().clamp(0.0, 90.0);
    HORIZON_CN0 + (ZENITH_CN0 - HORIZON_CN0) * (el_deg / 90.0)
}

/// Owns the whole-run state and steps the generator one millisecond at a time.
pub struct Scene {
    time: GpsTime,
    output: OutputParam,
    engines: NavEngineTable,
    ephemeris: EphemerisTable,
    almanac: AlmanacTable,
    iono_utc: IonoUtcParams,
    trajectory: Trajectory,
    receiver_pos: ECEF,
    receiver_vel: ECEF,
    receiver_llh: LLHRadians,
    elevation_mask_rad: f64,
    noise: NoiseSource,
    agc_gain: f64,
    agc_clipped_accum: u64,
    agc_components_accum: u64,
    channels: Vec<ChannelEntry>,
    ms_elapsed: u64,
}

impl Scene {
    /// Builds a scene and loads every broadcast ephemeris/almanac/iono-utc
    /// record into the navigation engines that will need it. Visibility
    /// (and therefore the first set of live channels) isn't computed until
    /// the first [`Scene::generate_ms`] call.
    #[must_use]
    pub fn new(
        output: OutputParam,
        trajectory: Trajectory,
        initial_llh: LLHRadians,
        ephemeris: EphemerisTable,
        almanac: AlmanacTable,
        iono_utc: IonoUtcParams,
        elevation_mask_deg: f64,
        noise_seed: u64,
        noise_sigma: f64,
        start_time: GpsTime,
    ) -> Self {
        let mut scene = Scene {
            time: start_time,
            output,
            engines: NavEngineTable::new(),
            ephemeris,
            almanac,
            iono_utc,
            trajectory,
            receiver_pos: initial_llh.to_ecef(),
            receiver_vel: ECEF::new(0.0, 0.0, 0.0),
            receiver_llh: initial_llh,
            elevation_mask_rad: elevation_mask_deg.to_radians(),
            noise: NoiseSource::with_sigma(noise_seed, noise_sigma),
            agc_gain: 1.0,
            agc_clipped_accum: 0,
            agc_components_accum: 0,
            channels: Vec::new(),
            ms_elapsed: 0,
        };
        scene.load_broadcast_data_into_engines();
        scene
    }

    fn load_broadcast_data_into_engines(&mut self) {
        for signal in SignalId::iter() {
            let Some(engine) = self.engines.handle_for(signal) else {
                continue;
            };
            engine.set_iono_utc(self.iono_utc);
            let system = signal.system();
            if system == System::Glo {
                for (svid, eph) in self.ephemeris.glonass().iter() {
                    engine.set_ephemeris(svid, EphemerisSource::Glonass(eph.clone()));
                }
                for (svid, alm) in self.almanac.arena(System::Glo).iter() {
                    engine.set_almanac(svid, alm.clone());
                }
            } else {
                if let Some(arena) = self.ephemeris.keplerian(system) {
                    for (svid, eph) in arena.iter() {
                        engine.set_ephemeris(svid, EphemerisSource::Keplerian(eph.clone()));
                    }
                }
                for (svid, alm) in self.almanac.arena(system).iter() {
                    engine.set_almanac(svid, alm.clone());
                }
            }
        }
    }

    /// Advances the receiver and every live channel by one millisecond,
    /// returning the summed, AGC-scaled baseband samples - or `None` once
    /// the configured trajectory has run out (clean end of recording,
    /// [`crate::error::TrajectoryExhausted`]).
    ///
    /// `issues` collects non-fatal [`GenError`]s noticed this step (e.g. a
    /// system enabled with no healthy ephemeris); the caller decides how to
    /// surface them (§7's recovery policy - logged, not fatal).
    pub fn generate_ms(&mut self, issues: &mut Vec<GenError>) -> Option<Vec<Complex>> {
        let kinematic = self.trajectory.next_ms()?;
        self.receiver_pos = kinematic.pos;
        self.receiver_vel = kinematic.vel;
        self.receiver_llh = kinematic.pos.to_llh();
        self.time.advance_one_ms();
        self.ms_elapsed += 1;

        if self.ms_elapsed == 1 || self.ms_elapsed.is_multiple_of(VISIBILITY_PERIOD_MS) {
            issues.extend(self.recompute_visibility());
        }

        let n = self.output.sample_rate as usize;
        let mut buffer = vec![Complex::default(); n];
        self.noise.fill(&mut buffer);

        let now = self.time;
        let chip_buffers: Vec<Vec<Complex>> = self
            .channels
            .par_iter_mut()
            .map(|entry| {
                entry.param.carrier_phase_cycles += entry.param.doppler_hz * 0.001;
                let end_transmit_time = now - std::time::Duration::from_secs_f64(entry.param.travel_time_s.max(0.0));
                let mut chan_buf = vec![Complex::default(); n];
                entry
                    .channel
                    .process_ms(end_transmit_time, entry.param.carrier_phase_cycles, entry.param.cn0_db_hz(), &mut chan_buf);
                chan_buf
            })
            .collect();

        for chan_buf in &chip_buffers {
            for (out, c) in buffer.iter_mut().zip(chan_buf.iter()) {
                *out += *c;
            }
        }

        for sample in &mut buffer {
            *sample = *sample * self.agc_gain;
        }

        Some(buffer)
    }

    /// Folds in this millisecond's quantiser clipping count (the caller
    /// gets this back from [`crate::sink::Sink::write_ms`]) and, every
    /// [`AGC_PERIOD_MS`] milliseconds, re-estimates the AGC gain from the
    /// accumulated clipping ratio per §4.7 step 9: back off 5% if clipping
    /// exceeds 1%, nudge up 2% (capped at unity gain) if it's under 0.1%,
    /// otherwise hold. Counters reset on every adjustment.
    pub fn report_clipping(&mut self, clipped_components: u64, total_components: u64) {
        self.agc_clipped_accum += clipped_components;
        self.agc_components_accum += total_components;

        if !self.ms_elapsed.is_multiple_of(AGC_PERIOD_MS) || self.agc_components_accum == 0 {
            return;
        }

        let clip_ratio = self.agc_clipped_accum as f64 / self.agc_components_accum as f64;
        if clip_ratio > AGC_CLIP_HIGH {
            self.agc_gain *= 0.95;
        } else if clip_ratio < AGC_CLIP_LOW && self.agc_gain < 1.0 {
            self.agc_gain = (self.agc_gain * 1.02).min(1.0);
        }
        self.agc_clipped_accum = 0;
        self.agc_components_accum = 0;
    }

    #[must_use]
    pub fn agc_gain(&self) -> f64 {
        self.agc_gain
    }

    /// Re-estimates every satellite's visibility, geometry, and link budget,
    /// creating or dropping [`SatelliteIfChannel`]s as satellites rise and
    /// set. Returns any [`GenError::OrbitalDataMissing`] noticed along the
    /// way; everything else (an unsupported signal, a channel construction
    /// failure) is silently skipped since the system as a whole stays usable.
    fn recompute_visibility(&mut self) -> Vec<GenError> {
        let mut issues = Vec::new();

        for system in System::iter() {
            let mut updates: Vec<(u16, ECEF, ECEF, bool, i8)> = Vec::new();
            if system == System::Glo {
                for (svid, eph) in self.ephemeris.glonass().iter() {
                    let dt = self.time.tow() - eph.tb;
                    let (pos, vel) = orbit::propagate_glonass(eph, dt);
                    updates.push((svid, pos, vel, eph.healthy, eph.freq_channel));
                }
            } else if let Some(arena) = self.ephemeris.keplerian(system) {
                for (svid, eph) in arena.iter() {
                    let dt = self.time.diff(&GpsTime::new_unchecked(eph.week as i16, eph.toe));
                    let (pos, vel) = orbit::propagate(eph, system, svid, dt);
                    updates.push((svid, pos, vel, eph.healthy, 0));
                }
            }

            let any_signal_enabled = SignalId::iter().any(|s| s.system() == system && self.output.signal_enabled(s));
            if any_signal_enabled && updates.iter().all(|u| !u.3) {
                issues.push(GenError::OrbitalDataMissing(system));
            }
            if updates.is_empty() {
                continue;
            }

            for signal in SignalId::iter().filter(|s| s.system() == system) {
                if !self.output.signal_enabled(signal) {
                    continue;
                }
                let Some(engine) = self.engines.handle_for(signal) else {
                    continue;
                };
                for &(svid, pos, vel, healthy, glo_channel) in &updates {
                    self.evaluate_visibility(system, signal, svid, pos, vel, healthy, &engine, glo_channel);
                }
            }
        }

        issues
    }

    /// Creates, updates, or drops the channel for one `(system, signal,
    /// svid)` pair given its freshly-propagated position/velocity.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_visibility(
        &mut self,
        system: System,
        signal: SignalId,
        svid: u16,
        sat_pos: ECEF,
        sat_vel: ECEF,
        healthy: bool,
        engine: &EngineHandle,
        glonass_channel: i8,
    ) {
        let idx = self.channels.iter().position(|c| c.system == system && c.signal == signal && c.svid == svid);

        let az_el = self.receiver_pos.azel_of(&sat_pos);
        if !healthy || az_el.el() < self.elevation_mask_rad {
            if let Some(i) = idx {
                self.channels.remove(i);
            }
            return;
        }

        let los = sat_pos - self.receiver_pos;
        let range = (los.x().powi(2) + los.y().powi(2) + los.z().powi(2)).sqrt();
        if range <= 0.0 {
            return;
        }
        let travel_time_s = range / SPEED_OF_LIGHT;
        let los_unit = ECEF::new(los.x() / range, los.y() / range, los.z() / range);
        let rel_vel = sat_vel - self.receiver_vel;
        let range_rate = rel_vel.x() * los_unit.x() + rel_vel.y() * los_unit.y() + rel_vel.z() * los_unit.z();
        let carrier_hz = signal.nominal_carrier_hz(glonass_channel);
        let doppler_hz = -range_rate / SPEED_OF_LIGHT * carrier_hz;
        let iono_delay_s = crate::ionosphere::klobuchar_delay(&self.receiver_llh, az_el, self.time.tow(), &self.iono_utc);
        let cn0_x100 = (nominal_cn0_db_hz(az_el.el()) * 100.0).round() as i32;

        if let Some(i) = idx {
            let entry = &mut self.channels[i];
            entry.param.travel_time_s = travel_time_s;
            entry.param.doppler_hz = doppler_hz;
            entry.param.az_el = az_el;
            entry.param.iono_delay_s = iono_delay_s;
            entry.param.cn0_x100 = cn0_x100;
            return;
        }

        let if_freq_hz = carrier_hz - self.output.center_freq_khz * 1e3;
        let transmit_time = self.time - std::time::Duration::from_secs_f64(travel_time_s.max(0.0));
        if let Ok(channel) = SatelliteIfChannel::new(engine.clone(), system, signal, svid, self.output.sample_rate, if_freq_hz, transmit_time, 0.0) {
            self.channels.push(ChannelEntry {
                system,
                signal,
                svid,
                channel,
                param: SatelliteParam {
                    travel_time_s,
                    doppler_hz,
                    carrier_phase_cycles: 0.0,
                    az_el,
                    iono_delay_s,
                    cn0_x100,
                },
            });
        }
    }

    #[must_use]
    pub fn active_channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::LLHDegrees;

    fn sample_eph(svid: u16, week: u16, toe: f64) -> KeplerianEphemeris {
        KeplerianEphemeris {
            svid,
            week,
            toe,
            toc: toe,
            a: 26_560_000.0_f64.powi(2),
            a_dot: 0.0,
            e: 0.01,
            i0: 0.96,
            idot: 0.0,
            omega0: 1.1,
            omega_dot: -8e-9,
            omega: 0.5,
            m0: 0.3,
            delta_n: 4e-9,
            delta_n_dot: 0.0,
            cuc: 0.0,
            cus: 0.0,
            crc: 0.0,
            crs: 0.0,
            cic: 0.0,
            cis: 0.0,
            af0: 0.0,
            af1: 0.0,
            af2: 0.0,
            iode: 1,
            iodc: 1,
            healthy: true,
            group_delay: vec![],
        }
    }

    fn empty_output() -> OutputParam {
        OutputParam {
            sample_rate: 4,
            center_freq_khz: 1_575_420.0,
            format: crate::ephemeris::SampleFormat::Iq4,
            freq_select: [0, 0, 0, 0],
            output_file: "out.bin".into(),
        }
    }

    #[test]
    fn empty_scene_still_produces_noise_floor() {
        let llh = LLHDegrees::new(37.8, -122.4, 30.0).to_radians();
        let trajectory = Trajectory::new(llh, crate::coords::LocalSpeed::new(0.0, 0.0, 0.0), vec![crate::trajectory::TrajectorySegment::Static { duration_ms: 2 }]);
        let mut scene = Scene::new(
            empty_output(),
            trajectory,
            llh,
            EphemerisTable::new(),
            AlmanacTable::new(),
            IonoUtcParams::default(),
            5.0,
            1,
            1.0,
            GpsTime::new_unchecked(2300, 100_000.0),
        );
        let mut issues = Vec::new();
        let first = scene.generate_ms(&mut issues).unwrap();
        assert_eq!(first.len(), 4);
        let second = scene.generate_ms(&mut issues).unwrap();
        assert_eq!(second.len(), 4);
        assert!(scene.generate_ms(&mut issues).is_none());
        assert_eq!(scene.active_channel_count(), 0);
    }

    #[test]
    fn enabled_system_with_no_ephemeris_is_flagged() {
        let llh = LLHDegrees::new(37.8, -122.4, 30.0).to_radians();
        let trajectory = Trajectory::new(llh, crate::coords::LocalSpeed::new(0.0, 0.0, 0.0), vec![crate::trajectory::TrajectorySegment::Static { duration_ms: 1 }]);
        let mut output = empty_output();
        output.freq_select[0] = 0b1;
        let mut scene = Scene::new(
            output,
            trajectory,
            llh,
            EphemerisTable::new(),
            AlmanacTable::new(),
            IonoUtcParams::default(),
            5.0,
            1,
            1.0,
            GpsTime::new_unchecked(2300, 100_000.0),
        );
        let mut issues = Vec::new();
        scene.generate_ms(&mut issues);
        assert!(issues.iter().any(|e| matches!(e, GenError::OrbitalDataMissing(System::Gps))));
    }

    #[test]
    fn overhead_satellite_produces_a_live_channel() {
        let llh = LLHDegrees::new(0.0, 0.0, 0.0).to_radians();
        let week = 2300_u16;
        let toe = 100_000.0;
        let mut eph = sample_eph(1, week, toe);
        // Force an overhead geometry: the solved-in-plane longitude of
        // ascending node/argument-of-latitude combination is opaque to
        // hand-tune directly, so instead park the satellite directly above
        // the receiver by zeroing inclination and aligning omega0+m0 to 0.
        eph.i0 = 0.0;
        eph.omega0 = 0.0;
        eph.omega = 0.0;
        eph.m0 = 0.0;

        let mut ephemeris = EphemerisTable::new();
        ephemeris.set_keplerian(System::Gps, eph);

        let mut output = empty_output();
        output.freq_select[0] = 0b1; // GpsL1Ca

        let trajectory = Trajectory::new(llh, crate::coords::LocalSpeed::new(0.0, 0.0, 0.0), vec![crate::trajectory::TrajectorySegment::Static { duration_ms: 1 }]);
        let mut scene = Scene::new(
            output,
            trajectory,
            llh,
            ephemeris,
            AlmanacTable::new(),
            IonoUtcParams::default(),
            5.0,
            1,
            1.0,
            GpsTime::new_unchecked(week as i16, toe),
        );
        let mut issues = Vec::new();
        scene.generate_ms(&mut issues);
        assert!(scene.active_channel_count() >= 1, "expected an overhead SV to produce a live channel");
    }

    #[test]
    fn agc_backs_off_under_heavy_clipping_and_holds_once_quiet() {
        let llh = LLHDegrees::new(37.8, -122.4, 30.0).to_radians();
        let trajectory = Trajectory::new(
            llh,
            crate::coords::LocalSpeed::new(0.0, 0.0, 0.0),
            vec![crate::trajectory::TrajectorySegment::Static { duration_ms: 400 }],
        );
        let mut scene = Scene::new(
            empty_output(),
            trajectory,
            llh,
            EphemerisTable::new(),
            AlmanacTable::new(),
            IonoUtcParams::default(),
            5.0,
            1,
            1.0,
            GpsTime::new_unchecked(2300, 100_000.0),
        );
        let mut issues = Vec::new();
        // First 100 ms: report heavy clipping. Gain should back off below 1.0.
        for _ in 0..100 {
            scene.generate_ms(&mut issues).unwrap();
            scene.report_clipping(10, 4);
        }
        assert!(scene.agc_gain() < 1.0, "gain should have backed off: {}", scene.agc_gain());

        let backed_off_gain = scene.agc_gain();
        // Next 100 ms: report no clipping at all. Gain should climb back up.
        for _ in 0..100 {
            scene.generate_ms(&mut issues).unwrap();
            scene.report_clipping(0, 4);
        }
        assert!(scene.agc_gain() > backed_off_gain, "gain should recover once quiet");
        assert!(scene.agc_gain() <= 1.0, "gain must never exceed unity");
    }
}
