// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Per-satellite IF channel, §4.6
//!
//! One [`SatelliteIfChannel`] owns the carrier- and code-phase accumulators
//! for a single `(SV, signal)` pair and produces that pair's sample
//! contribution for one millisecond at a time. The scene loop
//! ([`crate::scene`]) drives every visible channel's [`SatelliteIfChannel::process_ms`]
//! once per millisecond and sums the results - commutative, so channels are
//! safe to run in any order or in parallel, matching the data-parallelism
//! note in the design ("parallel per-channel accumulation within one
//! millisecond, strictly sequential across milliseconds").
//!
//! Carrier phase is tracked in cycles, continuous across millisecond
//! boundaries; code phase is tracked as a fractional chip index into the
//! data chip array, wrapped modulo the array length after each millisecond
//! to keep the accumulator's magnitude bounded over a long recording.

use crate::error::GenError;
use crate::navmsg::EngineHandle;
use crate::noise::Complex;
use crate::prn::{self, Modulation, PrnAttribute};
use crate::signal::SatelliteSignalSource;
use crate::system::{SignalId, System};
use crate::time::GpsTime;

/// BOC(1,1) subcarrier sign at chip index `chip_count`: the subcarrier
/// toggles once per chip.
fn boc11_sign(chip_count: i64) -> f64 {
    if chip_count.rem_euclid(2) == 1 {
        -1.0
    } else {
        1.0
    }
}

/// BOC(6,1) subcarrier sign: six times the BOC(1,1) rate, toggling twice
/// within each half-chip.
fn boc61_sign(chip_count: i64) -> f64 {
    if chip_count.rem_euclid(12) >= 6 {
        -1.0
    } else {
        1.0
    }
}

/// TMBOC's chip-33 pattern (ICD-GPS-800 L1C pilot): chips {1, 5, 7, 30} of
/// every 33-chip block carry BOC(6,1), the rest BOC(1,1).
fn tmboc_pilot_sign(chip_count: i64) -> f64 {
    match chip_count.rem_euclid(33) {
        1 | 5 | 7 | 30 => boc61_sign(chip_count),
        _ => boc11_sign(chip_count),
    }
}

/// CBOC's chip-11 pattern (Galileo E1 pilot): every 11th chip carries
/// BOC(6,1), the rest BOC(1,1).
fn cboc_pilot_sign(chip_count: i64) -> f64 {
    if chip_count.rem_euclid(11) == 0 {
        boc61_sign(chip_count)
    } else {
        boc11_sign(chip_count)
    }
}

/// One satellite's contribution to the IF sample stream for one signal.
pub struct SatelliteIfChannel {
    samples_per_ms: u32,
    if_freq_hz: f64,
    system: System,
    signal: SignalId,
    svid: u16,
    signal_source: SatelliteSignalSource,
    attribute: PrnAttribute,
    data_chips: Vec<u8>,
    pilot_chips: Option<Vec<u8>>,
    start_carrier_phase_cycles: f64,
    start_transmit_time: GpsTime,
    current_chip: f64,
    glonass_half_cycle: bool,
    current_data_symbol: f64,
    current_pilot_symbol: f64,
}

impl SatelliteIfChannel {
    /// Builds a channel for `(system, signal, svid)`, generating its
    /// spreading codes and priming its first data/pilot symbol at
    /// `start_transmit_time`.
    ///
    /// # Errors
    ///
    /// Propagates [`GenError::UnsupportedSignal`] if `signal` has no
    /// spreading-code entry (Galileo E6).
    pub fn new(
        engine: EngineHandle,
        system: System,
        signal: SignalId,
        svid: u16,
        samples_per_ms: u32,
        if_freq_hz: f64,
        start_transmit_time: GpsTime,
        start_carrier_phase_cycles: f64,
    ) -> Result<Self, GenError> {
        let chip_set = prn::generate(system, signal, svid)?;
        let has_pilot = chip_set.pilot.is_some();
        let signal_source = SatelliteSignalSource::new(engine, system, signal, svid, has_pilot);
        let (data_symbol, pilot_symbol) = signal_source.get_satellite_signal(start_transmit_time);

        Ok(SatelliteIfChannel {
            samples_per_ms: samples_per_ms.max(1),
            if_freq_hz,
            system,
            signal,
            svid,
            signal_source,
            attribute: chip_set.attribute,
            data_chips: chip_set.data,
            pilot_chips: chip_set.pilot,
            start_carrier_phase_cycles,
            start_transmit_time,
            current_chip: 0.0,
            glonass_half_cycle: false,
            current_data_symbol: data_symbol,
            current_pilot_symbol: pilot_symbol,
        })
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

    /// Baseband value at chip index `chip_count`, carrier phase not yet
    /// applied, per the modulation dispatch table.
    fn baseband(&self, chip_count: i64) -> Complex {
        let data_len = self.data_chips.len() as i64;
        let data_chip_val = self.data_chips[chip_count.rem_euclid(data_len.max(1)) as usize];
        let data_bpsk = 1.0 - 2.0 * f64::from(data_chip_val);
        let data_term = self.current_data_symbol * data_bpsk;

        let pilot_term = |sign: f64| -> f64 {
            let Some(pilot_chips) = &self.pilot_chips else {
                return 0.0;
            };
            let pilot_len = pilot_chips.len() as i64;
            let pilot_chip_val = pilot_chips[chip_count.rem_euclid(pilot_len.max(1)) as usize];
            let pilot_bpsk = 1.0 - 2.0 * f64::from(pilot_chip_val);
            self.current_pilot_symbol * pilot_bpsk * sign
        };

        match self.attribute.modulation {
            Modulation::Bpsk => Complex::new(data_term, 0.0),
            Modulation::Tdm => {
                let data_ms = self.start_transmit_time.ms_of_week().is_multiple_of(2);
                if data_ms {
                    Complex::new(data_term, 0.0)
                } else {
                    Complex::new(pilot_term(1.0), 0.0)
                }
            }
            Modulation::Boc { .. } => {
                let data_sign = boc11_sign(chip_count);
                Complex::new(data_sign * data_term + pilot_term(data_sign), 0.0)
            }
            Modulation::Tmboc => {
                let data_sign = boc11_sign(chip_count);
                Complex::new(data_sign * data_term + pilot_term(tmboc_pilot_sign(chip_count)), 0.0)
            }
            Modulation::Qmboc => {
                let data_sign = boc11_sign(chip_count);
                Complex::new(data_sign * data_term, pilot_term(tmboc_pilot_sign(chip_count)))
            }
            Modulation::Cboc => {
                let data_sign = boc11_sign(chip_count);
                Complex::new(data_sign * data_term + pilot_term(cboc_pilot_sign(chip_count)), 0.0)
            }
            Modulation::GlonassFdma => {
                // The 100 Hz meander is already baked into the navigation
                // engine's bit stream (relative-coded, meander-doubled -
                // see `crate::navmsg::gnav`), so the chip stream only needs
                // to XOR in the current navigation bit.
                let nav_bit = u8::from(self.current_data_symbol > 0.0);
                let symbol_bit = data_chip_val ^ nav_bit;
                Complex::new(1.0 - 2.0 * f64::from(symbol_bit), 0.0)
            }
        }
    }

    /// Produces this channel's contribution for the millisecond ending at
    /// `end_transmit_time`, writing `out.len()` samples (must equal the
    /// configured samples-per-ms). `end_carrier_phase_cycles` and
    /// `cn0_db_hz` come from the scene loop's per-ms geometry/power
    /// recomputation.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` doesn't match the configured samples-per-ms.
    pub fn process_ms(&mut self, end_transmit_time: GpsTime, end_carrier_phase_cycles: f64, cn0_db_hz: f64, out: &mut [Complex]) {
        assert_eq!(out.len(), self.samples_per_ms as usize, "output buffer must hold samples_per_ms samples");
        let n = f64::from(self.samples_per_ms);

        let phase_step = (end_carrier_phase_cycles - self.start_carrier_phase_cycles) / n + self.if_freq_hz * 1e-3 / n;
        let mut current_phase = 1.0 - self.start_carrier_phase_cycles.rem_euclid(1.0);
        if matches!(self.attribute.modulation, Modulation::GlonassFdma) && self.glonass_half_cycle {
            current_phase += 0.5;
        }

        let dt_s = end_transmit_time.diff(&self.start_transmit_time);
        let chip_rate_per_ms = f64::from(self.attribute.chip_rate_per_ms);
        let code_step = dt_s * 1000.0 * chip_rate_per_ms / n;

        let amplitude = 10f64.powf((cn0_db_hz - 30.0) / 10.0) / n.sqrt();

        let mut chip = self.current_chip;
        for sample in out.iter_mut() {
            let chip_count = chip.floor() as i64;
            let carrier = Complex::from_phase_cycles(current_phase);
            *sample = carrier * self.baseband(chip_count) * amplitude;

            current_phase += phase_step;
            chip += code_step;
        }

        let (data_symbol, pilot_symbol) = self.signal_source.get_satellite_signal(end_transmit_time);
        self.current_data_symbol = data_symbol;
        self.current_pilot_symbol = pilot_symbol;
        if matches!(self.attribute.modulation, Modulation::GlonassFdma) {
            self.glonass_half_cycle = !self.glonass_half_cycle;
        }

        self.current_chip = chip.rem_euclid(self.data_chips.len().max(1) as f64);
        self.start_carrier_phase_cycles = end_carrier_phase_cycles;
        self.start_transmit_time = end_transmit_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::KeplerianEphemeris;
    use crate::navmsg::{EphemerisSource, NavEngineTable};

    fn sample_eph(svid: u16) -> KeplerianEphemeris {
        KeplerianEphemeris {
            svid,
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

    fn new_gps_l1ca_channel(start: GpsTime) -> SatelliteIfChannel {
        let table = NavEngineTable::new();
        let engine = table.handle_for(SignalId::GpsL1Ca).unwrap();
        engine.set_ephemeris(5, EphemerisSource::Keplerian(sample_eph(5)));
        SatelliteIfChannel::new(engine, System::Gps, SignalId::GpsL1Ca, 5, 4, 1_500_000.0, start, 0.0).unwrap()
    }

    #[test]
    fn samples_stay_on_unit_circle_before_amplitude_scaling() {
        let mut channel = new_gps_l1ca_channel(GpsTime::new_unchecked(900, 0.0));
        let mut out = [Complex::default(); 4];
        channel.process_ms(GpsTime::new_unchecked(900, 0.001), 3.0, 30.0, &mut out);
        for sample in out {
            let mag = (sample.re * sample.re + sample.im * sample.im).sqrt();
            assert!((mag - 0.5).abs() < 1e-9, "mag = {mag}");
        }
    }

    #[test]
    fn code_phase_advances_continuously_across_ms_boundaries() {
        let mut channel = new_gps_l1ca_channel(GpsTime::new_unchecked(900, 0.0));
        let mut out = [Complex::default(); 4];
        channel.process_ms(GpsTime::new_unchecked(900, 0.001), 3.0, 30.0, &mut out);
        let chip_after_first_ms = channel.current_chip;
        channel.process_ms(GpsTime::new_unchecked(900, 0.002), 6.0, 30.0, &mut out);
        assert_ne!(chip_after_first_ms, channel.current_chip);
    }

    #[test]
    fn unsupported_signal_is_rejected() {
        let table = NavEngineTable::new();
        let err = SatelliteIfChannel::new(
            table.handle_for(SignalId::GpsL1Ca).unwrap(),
            System::Gal,
            SignalId::GalE6,
            1,
            4,
            0.0,
            GpsTime::new_unchecked(900, 0.0),
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, GenError::UnsupportedSignal(_)));
    }

    #[test]
    fn glonass_fdma_symbols_stay_binary() {
        let table = NavEngineTable::new();
        let engine = table.handle_for(SignalId::GloG1).unwrap();
        let mut channel = SatelliteIfChannel::new(engine, System::Glo, SignalId::GloG1, 3, 4, 0.0, GpsTime::new_unchecked(900, 0.0), 0.0).unwrap();
        let mut out = [Complex::default(); 4];
        channel.process_ms(GpsTime::new_unchecked(900, 0.001), 0.0, 30.0, &mut out);
        for sample in out {
            assert!((sample.im).abs() < 1e-9);
        }
    }
}
