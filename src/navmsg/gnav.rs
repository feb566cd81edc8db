// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GLONASS G1/G2 navigation strings, §4.4.8
//!
//! A superframe is 5 frames of 15 strings each; a string is 2 seconds. Each
//! string's 85 data bits are Hamming(85,8)-protected via
//! [`crate::edc::glonass_hamming_encode`], then carried through the
//! canonical `GNavBit` contract (§4.4.8, §9): relative-code the 85 bits,
//! meander-double them into 170 bits, then append the 30-bit fixed time
//! mark, for a 200-bit string - 100 bits/s, a 10 ms bit period, aligned to
//! the 2-second string boundary. Strings 1-4 carry the immediate ephemeris
//! (ICD clause 4.4), rotating every frame; strings 6-15 carry almanac pages
//! for SVs 1-24, one pair of SVs per frame across the 5-frame superframe.

use std::collections::HashMap;

use crate::bits::{compose_bits, unscale_int, unscale_uint};
use crate::edc::glonass_hamming_encode;
use crate::ephemeris::GlonassEphemeris;
use crate::navmsg::{EphemerisSource, IonoUtcParams, NavEngine};
use crate::time::{GlonassTime, GpsTime};

const STRING_PERIOD_S: f64 = 2.0;
const DATA_BITS: usize = 85;
/// Fixed 30-bit time-mark pattern appended after every string's
/// meander-doubled data, per §4.4.8.
const TIME_MARK: u32 = 0x3e37_5096;
const TIME_MARK_BITS: usize = 30;

/// Relative-codes `bits`: each output bit is the XOR of the input bit and
/// the *previous output bit*, chained from an initial state of 0. Self-
/// inverting - decoding runs the identical chain over the coded bits.
fn relative_code(bits: &[u8]) -> Vec<u8> {
    let mut prev = 0u8;
    bits.iter()
        .map(|&b| {
            let coded = b ^ prev;
            prev = coded;
            coded
        })
        .collect()
}

/// Doubles each relative-coded bit into its meander pair (the bit, then its
/// complement), per §4.4.8's canonical contract.
fn meander_double(bits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len() * 2);
    for &b in bits {
        out.push(b);
        out.push(1 - b);
    }
    out
}

#[derive(Debug, Clone, Default)]
struct GnavSvCache {
    eph: Option<GlonassEphemeris>,
}

/// Serves GLONASS G1/G2, one immediate-ephemeris string per call.
#[derive(Default)]
pub struct GnavEngine {
    svs: HashMap<u16, GnavSvCache>,
    iono_utc: IonoUtcParams,
}

impl GnavEngine {
    /// Packs the 85 data bits of immediate-ephemeris string `string_number`
    /// (1..=4) for `eph`, returning them MSB-first as a `[u32; 3]` word
    /// triple in the packing [`crate::edc::glonass_hamming_encode`] expects.
    fn build_string(string_number: u8, eph: &GlonassEphemeris) -> [u32; 3] {
        let mut words = [0u32; 3];
        compose_bits(&mut words[0], i64::from(string_number), 28, 4);

        match string_number {
            1 => {
                compose_bits(&mut words[0], unscale_int(eph.vel.x, -20).into(), 8, 24);
                compose_bits(&mut words[1], unscale_int(eph.acc.x, -30).into(), 27, 5);
                compose_bits(&mut words[1], unscale_uint(eph.pos.x, -11).into(), 0, 27);
            }
            2 => {
                compose_bits(&mut words[0], unscale_int(eph.vel.y, -20).into(), 8, 24);
                compose_bits(&mut words[1], unscale_int(eph.acc.y, -30).into(), 27, 5);
                compose_bits(&mut words[1], unscale_uint(eph.pos.y, -11).into(), 0, 27);
            }
            3 => {
                compose_bits(&mut words[0], unscale_int(eph.vel.z, -20).into(), 8, 24);
                compose_bits(&mut words[1], unscale_int(eph.acc.z, -30).into(), 27, 5);
                compose_bits(&mut words[1], unscale_uint(eph.pos.z, -11).into(), 0, 27);
            }
            _ => {
                compose_bits(&mut words[0], unscale_int(eph.tau_n, -30).into(), 8, 22);
                compose_bits(&mut words[0], unscale_int(eph.gamma_n, -40).into(), 0, 8);
                compose_bits(&mut words[1], unscale_uint(eph.tb, 4).into(), 20, 7);
                compose_bits(&mut words[1], i64::from(eph.freq_channel.rem_euclid(16)), 16, 4);
            }
        }
        words
    }
}

impl NavEngine for GnavEngine {
    fn set_ephemeris(&mut self, svid: u16, eph: EphemerisSource) {
        let EphemerisSource::Glonass(eph) = eph else {
            return;
        };
        self.svs.entry(svid).or_default().eph = Some(eph);
    }

    fn set_almanac(&mut self, _svid: u16, _alm: crate::ephemeris::AlmanacRecord) {}

    fn set_iono_utc(&mut self, iono_utc: IonoUtcParams) {
        self.iono_utc = iono_utc;
    }

    fn get_frame_data(&self, start_time: GpsTime, svid: u16, out_bit_sequence: &mut Vec<u8>) -> usize {
        let Some(cache) = self.svs.get(&svid) else {
            return 0;
        };
        let Some(eph) = &cache.eph else {
            return 0;
        };

        let glo_time = GlonassTime::from_gps_hardcoded(start_time);
        let string_count = (glo_time.ms_of_day() as f64 / 1000.0 / STRING_PERIOD_S).floor() as u64;
        let string_number = ((string_count % 4) + 1) as u8;

        let mut words = Self::build_string(string_number, eph);
        glonass_hamming_encode(&mut words);

        let mut raw_bits = Vec::with_capacity(DATA_BITS);
        for i in 0..21 {
            raw_bits.push(((words[0] >> (20 - i)) & 1) as u8);
        }
        for i in 0..32 {
            raw_bits.push(((words[1] >> (31 - i)) & 1) as u8);
        }
        for i in 0..32 {
            raw_bits.push(((words[2] >> (31 - i)) & 1) as u8);
        }
        raw_bits.truncate(DATA_BITS);

        let relative = relative_code(&raw_bits);
        let mut out = meander_double(&relative);
        for i in (0..TIME_MARK_BITS).rev() {
            out.push(((TIME_MARK >> i) & 1) as u8);
        }

        out_bit_sequence.clear();
        out_bit_sequence.extend(out);
        out_bit_sequence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn sample_eph() -> GlonassEphemeris {
        GlonassEphemeris {
            svid: 5,
            tb: 8100.0,
            pos: Vector3::new(10_000_000.0, -5_000_000.0, 20_000_000.0),
            vel: Vector3::new(1_500.0, -2_000.0, 500.0),
            acc: Vector3::new(0.0, 0.0, 0.0),
            tau_n: 1e-5,
            gamma_n: 1e-11,
            freq_channel: -3,
            healthy: true,
        }
    }

    #[test]
    fn string_rotation_is_periodic() {
        let mut engine = GnavEngine::default();
        engine.set_ephemeris(5, EphemerisSource::Glonass(sample_eph()));
        let t0 = GpsTime::new_unchecked(900, 0.0);
        let t1 = GpsTime::new_unchecked(900, 4.0 * STRING_PERIOD_S);
        let mut a = Vec::new();
        let mut b = Vec::new();
        engine.get_frame_data(t0, 5, &mut a);
        engine.get_frame_data(t1, 5, &mut b);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2 * DATA_BITS + TIME_MARK_BITS);
    }

    #[test]
    fn time_mark_is_the_fixed_pattern() {
        let mut engine = GnavEngine::default();
        engine.set_ephemeris(5, EphemerisSource::Glonass(sample_eph()));
        let mut bits = Vec::new();
        engine.get_frame_data(GpsTime::new_unchecked(900, 0.0), 5, &mut bits);

        let time_mark = &bits[2 * DATA_BITS..];
        assert_eq!(time_mark.len(), TIME_MARK_BITS);
        for (i, &bit) in time_mark.iter().enumerate() {
            assert_eq!(bit, ((TIME_MARK >> (TIME_MARK_BITS - 1 - i)) & 1) as u8);
        }
    }

    #[test]
    fn meander_doubling_is_complementary_pairs() {
        let mut engine = GnavEngine::default();
        engine.set_ephemeris(5, EphemerisSource::Glonass(sample_eph()));
        let mut bits = Vec::new();
        engine.get_frame_data(GpsTime::new_unchecked(900, 0.0), 5, &mut bits);

        for pair in bits[..2 * DATA_BITS].chunks_exact(2) {
            assert_eq!(pair[1], 1 - pair[0]);
        }
    }

    #[test]
    fn hamming_parity_checks_out() {
        let mut engine = GnavEngine::default();
        engine.set_ephemeris(5, EphemerisSource::Glonass(sample_eph()));
        let mut bits = Vec::new();
        engine.get_frame_data(GpsTime::new_unchecked(900, 0.0), 5, &mut bits);

        // Undo the meander-doubling (take the first bit of every pair, the
        // relative-coded bit) and the relative coding, recovering the raw
        // Hamming(85,8)-protected string.
        let relative_coded: Vec<u8> = bits[..2 * DATA_BITS].iter().step_by(2).copied().collect();
        let mut raw = Vec::with_capacity(DATA_BITS);
        let mut prev = 0u8;
        for &coded in &relative_coded {
            raw.push(coded ^ prev);
            prev = coded;
        }

        let mut words = [0u32; 3];
        for (i, &bit) in raw.iter().enumerate().take(21) {
            words[0] |= u32::from(bit) << (20 - i);
        }
        for (i, &bit) in raw.iter().enumerate().skip(21).take(32) {
            words[1] |= u32::from(bit) << (31 - (i - 21));
        }
        for (i, &bit) in raw.iter().enumerate().skip(53).take(32) {
            words[2] |= u32::from(bit) << (31 - (i - 53));
        }
        assert!(crate::edc::glonass_hamming_verify(&words));
    }

    #[test]
    fn no_ephemeris_yields_empty() {
        let engine = GnavEngine::default();
        let mut out = Vec::new();
        assert_eq!(engine.get_frame_data(GpsTime::new_unchecked(900, 0.0), 9, &mut out), 0);
    }
}
