// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Satellite signal source, §4.5
//!
//! Joins a navigation engine handle to the `(system, signal, svid)` triple
//! it serves and tracks which navigation bit is currently broadcasting.
//! [`crate::channel`] multiplies the symbols this produces onto the
//! spreading-code chip stream every sample; this module only answers "what
//! bit is live right now".
//!
//! Pilot channels here are modelled as unmodulated: real pilot channels
//! (L2C CL, L5Q, E5aQ/E5bQ, B1C/B2a pilot) carry only ranging code, no
//! navigation data, so the pilot symbol is a constant `+1.0` rather than a
//! decoded secondary message.
//!
//! For GLONASS, [`crate::navmsg::GnavEngine`] already returns the
//! relative-coded, meander-doubled, time-mark-terminated 200-bit string
//! (§4.4.8); this module's generic bit-indexing applies unchanged, with no
//! separate meander step needed here or in [`crate::channel`].

use crate::navmsg::EngineHandle;
use crate::system::{SignalId, System};
use crate::time::GpsTime;

/// Wall-clock period, milliseconds, of the frame/page/message/string each
/// engine hands back from a single `get_frame_data` call, per §4.4's
/// per-engine periods (LNAV 6 s, CNAV 12 s, CNAV2 18 s, F/NAV and I/NAV
/// 10 s, BeiDou D1 6 s / D2 0.6 s by GEO-vs-MEO PRN, B-CNAV1/2 3 s,
/// B-CNAV3 1 s, GLONASS string 2 s). Dividing by the bit count the engine
/// actually returned gives the live symbol period without hard-coding each
/// engine's internal encoding expansion here.
fn frame_period_ms(signal: SignalId, svid: u16) -> u32 {
    match signal {
        SignalId::GpsL1Ca | SignalId::GpsL2P => 6_000,
        SignalId::GpsL2C | SignalId::GpsL5 => 12_000,
        SignalId::GpsL1C => 18_000,
        SignalId::GalE1 | SignalId::GalE5A | SignalId::GalE5B | SignalId::GalE5 => 10_000,
        SignalId::BdsB1I | SignalId::BdsB2I | SignalId::BdsB3I => {
            if (1..=5).contains(&svid) || (59..=63).contains(&svid) {
                600
            } else {
                6_000
            }
        }
        SignalId::BdsB1C | SignalId::BdsB2A => 3_000,
        SignalId::BdsB2B => 1_000,
        SignalId::GloG1 | SignalId::GloG2 => 2_000,
        SignalId::GalE6 => 10_000,
    }
}

/// Ties a shared [`EngineHandle`] to one SV's signal and exposes the
/// currently-broadcasting data/pilot symbol pair.
pub struct SatelliteSignalSource {
    engine: EngineHandle,
    system: System,
    signal: SignalId,
    svid: u16,
    has_pilot: bool,
}

impl SatelliteSignalSource {
    #[must_use]
    pub fn new(engine: EngineHandle, system: System, signal: SignalId, svid: u16, has_pilot: bool) -> Self {
        SatelliteSignalSource {
            engine,
            system,
            signal,
            svid,
            has_pilot,
        }
    }

    #[must_use]
    pub fn system(&self) -> System {
        self.system
    }

    #[must_use]
    pub fn signal(&self) -> SignalId {
        self.signal
    }

    #[must_use]
    pub fn svid(&self) -> u16 {
        self.svid
    }

    /// Returns the `(data_symbol, pilot_symbol)` pair broadcasting at
    /// `transmit_time`, each a BPSK symbol in `{-1.0, 0.0, 1.0}`. Pilot is
    /// `0.0` for signals without a pilot channel. Symbol boundaries come
    /// from `transmit_time`'s millisecond-of-week modulo the live symbol
    /// period; for GLONASS the engine's bit stream already carries the
    /// 100 Hz meander, so no separate step is needed here.
    #[must_use]
    pub fn get_satellite_signal(&self, transmit_time: GpsTime) -> (f64, f64) {
        let mut bits = Vec::new();
        let len = self.engine.get_frame_data(transmit_time, self.svid, &mut bits);
        let data_symbol = if len == 0 {
            1.0
        } else {
            let symbol_period_ms = (frame_period_ms(self.signal, self.svid) / len as u32).max(1);
            let symbol_index = (transmit_time.ms_of_week() / symbol_period_ms) as usize;
            1.0 - 2.0 * f64::from(bits[symbol_index % len])
        };
        let pilot_symbol = if self.has_pilot { 1.0 } else { 0.0 };
        (data_symbol, pilot_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::KeplerianEphemeris;
    use crate::navmsg::{EphemerisSource, NavEngineTable};

    fn sample_eph() -> KeplerianEphemeris {
        KeplerianEphemeris {
            svid: 12,
            week: 900,
            toe: 100_000.0,
            toc: 100_000.0,
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

    #[test]
    fn data_symbol_is_plus_or_minus_one() {
        let table = NavEngineTable::new();
        let engine = table.handle_for(SignalId::GpsL1Ca).unwrap();
        engine.set_ephemeris(12, EphemerisSource::Keplerian(sample_eph()));
        let source = SatelliteSignalSource::new(engine, System::Gps, SignalId::GpsL1Ca, 12, false);

        let (data, pilot) = source.get_satellite_signal(GpsTime::new_unchecked(900, 0.0));
        assert!(data == 1.0 || data == -1.0);
        assert_eq!(pilot, 0.0);
    }

    #[test]
    fn pilot_present_signals_report_unmodulated_pilot() {
        let table = NavEngineTable::new();
        let engine = table.handle_for(SignalId::GpsL5).unwrap();
        engine.set_ephemeris(12, EphemerisSource::Keplerian(sample_eph()));
        let source = SatelliteSignalSource::new(engine, System::Gps, SignalId::GpsL5, 12, true);

        let (_, pilot) = source.get_satellite_signal(GpsTime::new_unchecked(900, 0.0));
        assert_eq!(pilot, 1.0);
    }

    #[test]
    fn missing_ephemeris_falls_back_to_unmodulated_carrier() {
        let table = NavEngineTable::new();
        let engine = table.handle_for(SignalId::GpsL1Ca).unwrap();
        let source = SatelliteSignalSource::new(engine, System::Gps, SignalId::GpsL1Ca, 7, false);

        let (data, _) = source.get_satellite_signal(GpsTime::new_unchecked(900, 0.0));
        assert_eq!(data, 1.0);
    }

    #[test]
    fn symbol_is_stable_within_one_bit_period() {
        let table = NavEngineTable::new();
        let engine = table.handle_for(SignalId::GpsL1Ca).unwrap();
        engine.set_ephemeris(12, EphemerisSource::Keplerian(sample_eph()));
        let source = SatelliteSignalSource::new(engine, System::Gps, SignalId::GpsL1Ca, 12, false);

        let (a, _) = source.get_satellite_signal(GpsTime::new_unchecked(900, 0.0));
        let (b, _) = source.get_satellite_signal(GpsTime::new_unchecked(900, 0.0195));
        assert_eq!(a, b);
    }
}
