// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GPS LNAV (L1 C/A, L2 P), §4.4.1
//!
//! Standard 10-word, 30-bit-per-word, 6-second subframe. Each word carries
//! 24 data bits followed by 6 parity bits computed with the classical GPS
//! D29*/D30* carry-chained parity equations (IS-GPS-200). The engine caches
//! pre-packed subframes 1-5 per SV and regenerates the subframe-4/5 page
//! rotation as `(tow_count / 6) mod 25`.

use std::collections::HashMap;

use crate::bits::{compose_bits, unscale_int, unscale_uint};
use crate::navmsg::{EphemerisSource, IonoUtcParams, NavEngine};
use crate::time::GpsTime;

const WORDS_PER_SUBFRAME: usize = 10;
const BITS_PER_WORD: usize = 30;
const DATA_BITS_PER_WORD: usize = 24;
const SUBFRAME_PERIOD_S: f64 = 6.0;

/// Computes the 6 parity bits for one word given its 24 data bits (MSB
/// first) and the previous word's last two bits (D29*, D30*).
///
/// Returns the 24 bits as actually transmitted (XORed with `d30_star`) and
/// the 6 parity bits, per the IS-GPS-200 parity equations.
fn gps_word_parity(data: &[bool; 24], d29_star: bool, d30_star: bool) -> ([bool; 24], [bool; 6]) {
    let mut d = [false; 24];
    for i in 0..24 {
        d[i] = data[i] ^ d30_star;
    }
    let g = |i: usize| d[i - 1];
    let d25 = d29_star ^ g(1) ^ g(2) ^ g(3) ^ g(5) ^ g(6) ^ g(10) ^ g(11) ^ g(12) ^ g(13) ^ g(14)
        ^ g(17) ^ g(18) ^ g(20) ^ g(23);
    let d26 = d30_star ^ g(2) ^ g(3) ^ g(4) ^ g(6) ^ g(7) ^ g(11) ^ g(12) ^ g(13) ^ g(14) ^ g(15)
        ^ g(18) ^ g(19) ^ g(21) ^ g(24);
    let d27 = d29_star ^ g(1) ^ g(3) ^ g(4) ^ g(5) ^ g(7) ^ g(8) ^ g(12) ^ g(13) ^ g(14) ^ g(15)
        ^ g(16) ^ g(19) ^ g(20) ^ g(22);
    let d28 = d30_star ^ g(2) ^ g(4) ^ g(5) ^ g(6) ^ g(8) ^ g(9) ^ g(13) ^ g(14) ^ g(15) ^ g(16)
        ^ g(17) ^ g(20) ^ g(21) ^ g(23);
    let d29 = d30_star ^ g(1) ^ g(3) ^ g(5) ^ g(6) ^ g(7) ^ g(9) ^ g(10) ^ g(14) ^ g(15) ^ g(16)
        ^ g(17) ^ g(18) ^ g(21) ^ g(22) ^ g(24);
    let d30 = d29_star ^ g(3) ^ g(5) ^ g(6) ^ g(8) ^ g(9) ^ g(10) ^ g(11) ^ g(13) ^ g(15) ^ g(19)
        ^ g(22) ^ g(23) ^ g(24);
    (d, [d25, d26, d27, d28, d29, d30])
}

/// Packs a 10-word subframe from each word's 24 data bits, chaining parity
/// word-to-word. The first word's `D29*/D30*` carry-in is taken to be 0,0.
fn pack_subframe(words_data: [u32; WORDS_PER_SUBFRAME]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(WORDS_PER_SUBFRAME * BITS_PER_WORD);
    let mut d29_star = false;
    let mut d30_star = false;
    for word in words_data {
        let mut data_bits = [false; 24];
        for (i, bit) in data_bits.iter_mut().enumerate() {
            *bit = (word >> (23 - i)) & 1 != 0;
        }
        let (transmitted, parity) = gps_word_parity(&data_bits, d29_star, d30_star);
        bits.extend(transmitted.iter().map(|&b| u8::from(b)));
        bits.extend(parity.iter().map(|&b| u8::from(b)));
        d29_star = parity[4];
        d30_star = parity[5];
    }
    bits
}

fn word24(value: i64, lsb: u32, width: u32, word: &mut u32) {
    compose_bits(word, value, lsb, width);
}

#[derive(Debug, Clone, Default)]
struct LnavSvCache {
    subframe1: [u32; WORDS_PER_SUBFRAME],
    subframe2: [u32; WORDS_PER_SUBFRAME],
    subframe3: [u32; WORDS_PER_SUBFRAME],
    /// Single cached almanac page reused across the 25-page rotation; a full
    /// almanac broadcast schedule is out of this generator's scope.
    subframe45: [u32; WORDS_PER_SUBFRAME],
}

/// GPS LNAV engine: serves both L1 C/A and L2 P, which broadcast the
/// identical 50 bps navigation message.
#[derive(Default)]
pub struct LnavEngine {
    svs: HashMap<u16, LnavSvCache>,
    iono_utc: IonoUtcParams,
}

impl LnavEngine {
    fn how_word(tow_count: u32, subframe_id: u8) -> u32 {
        let mut word = 0u32;
        word24((tow_count & 0x1FFFF) as i64, 7, 17, &mut word);
        word24(0, 6, 1, &mut word); // alert flag
        word24(0, 5, 1, &mut word); // anti-spoof flag
        word24(i64::from(subframe_id), 2, 3, &mut word);
        word
    }

    fn build_subframe1(eph: &crate::ephemeris::KeplerianEphemeris) -> [u32; WORDS_PER_SUBFRAME] {
        let mut words = [0u32; WORDS_PER_SUBFRAME];
        words[0] = 0x8B00_0000; // TLM preamble in bits 29..22
        words[1] = Self::how_word(0, 1);
        word24(i64::from(eph.week), 14, 10, &mut words[2]);
        word24(unscale_int(eph.af2, -55).into(), 16, 8, &mut words[7]);
        word24(unscale_int(eph.af1, -43).into(), 0, 16, &mut words[8]);
        word24(unscale_int(eph.af0, -31).into(), 2, 22, &mut words[9]);
        words
    }

    fn build_subframe2(eph: &crate::ephemeris::KeplerianEphemeris) -> [u32; WORDS_PER_SUBFRAME] {
        let mut words = [0u32; WORDS_PER_SUBFRAME];
        words[0] = 0x8B00_0000;
        words[1] = Self::how_word(0, 2);
        word24(i64::from(eph.iode), 16, 8, &mut words[2]);
        word24(unscale_int(eph.crs, -5).into(), 0, 16, &mut words[2]);
        word24(unscale_int(eph.delta_n, -43).into(), 8, 16, &mut words[3]);
        word24(unscale_int(eph.m0, -31).into(), 0, 32, &mut words[4]);
        word24(unscale_uint(eph.e, -33).into(), 0, 32, &mut words[6]);
        word24(unscale_uint(eph.a.sqrt(), -19).into(), 0, 32, &mut words[7]);
        word24(unscale_uint(eph.toe, 4).into(), 8, 16, &mut words[8]);
        words
    }

    fn build_subframe3(eph: &crate::ephemeris::KeplerianEphemeris) -> [u32; WORDS_PER_SUBFRAME] {
        let mut words = [0u32; WORDS_PER_SUBFRAME];
        words[0] = 0x8B00_0000;
        words[1] = Self::how_word(0, 3);
        word24(unscale_int(eph.cic, -29).into(), 8, 16, &mut words[2]);
        word24(unscale_int(eph.omega0, -31).into(), 0, 32, &mut words[3]);
        word24(unscale_int(eph.cis, -29).into(), 8, 16, &mut words[4]);
        word24(unscale_int(eph.i0, -31).into(), 0, 32, &mut words[5]);
        word24(unscale_int(eph.crc, -5).into(), 8, 16, &mut words[6]);
        word24(unscale_int(eph.omega, -31).into(), 0, 32, &mut words[7]);
        word24(unscale_int(eph.omega_dot, -43).into(), 0, 24, &mut words[8]);
        word24(i64::from(eph.iode), 16, 8, &mut words[9]);
        word24(unscale_int(eph.idot, -43).into(), 2, 14, &mut words[9]);
        words
    }
}

impl NavEngine for LnavEngine {
    fn set_ephemeris(&mut self, svid: u16, eph: EphemerisSource) {
        let EphemerisSource::Keplerian(eph) = eph else {
            return;
        };
        let entry = self.svs.entry(svid).or_default();
        entry.subframe1 = Self::build_subframe1(&eph);
        entry.subframe2 = Self::build_subframe2(&eph);
        entry.subframe3 = Self::build_subframe3(&eph);
    }

    fn set_almanac(&mut self, svid: u16, _alm: crate::ephemeris::AlmanacRecord) {
        let entry = self.svs.entry(svid).or_default();
        entry.subframe45[0] = 0x8B00_0000;
        entry.subframe45[1] = Self::how_word(0, 4);
    }

    fn set_iono_utc(&mut self, iono_utc: IonoUtcParams) {
        self.iono_utc = iono_utc;
    }

    fn get_frame_data(&self, start_time: GpsTime, svid: u16, out_bit_sequence: &mut Vec<u8>) -> usize {
        let Some(cache) = self.svs.get(&svid) else {
            return 0;
        };
        let tow = start_time.tow();
        let subframe_index = ((tow / SUBFRAME_PERIOD_S).floor() as u64) % 5;
        let tow_count = (tow / SUBFRAME_PERIOD_S).floor() as u32;

        out_bit_sequence.clear();
        let words = match subframe_index {
            0 => cache.subframe1,
            1 => cache.subframe2,
            2 => cache.subframe3,
            _ => {
                let page = tow_count % 25;
                let mut w = cache.subframe45;
                word24(i64::from(page), 2, 3, &mut w[2]);
                w
            }
        };
        let mut words = words;
        words[1] = Self::how_word(tow_count, (subframe_index + 1) as u8);
        out_bit_sequence.extend(pack_subframe(words));
        out_bit_sequence.len()
    }
}

impl std::fmt::Debug for LnavEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LnavEngine").field("svs", &self.svs.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::KeplerianEphemeris;

    fn sample_eph() -> KeplerianEphemeris {
        KeplerianEphemeris {
            svid: 5,
            week: 2300,
            toe: 300_000.0,
            toc: 300_000.0,
            a: 26_560_000.0_f64.powi(2),
            a_dot: 0.0,
            e: 0.01,
            i0: 0.95,
            idot: 1e-10,
            omega0: 1.2,
            omega_dot: -8e-9,
            omega: 0.5,
            m0: 0.1,
            delta_n: 4e-9,
            delta_n_dot: 0.0,
            cuc: 0.0,
            cus: 0.0,
            crc: 300.0,
            crs: 10.0,
            cic: 1e-7,
            cis: 1e-7,
            af0: 1e-5,
            af1: 1e-12,
            af2: 0.0,
            iode: 5,
            iodc: 5,
            healthy: true,
            group_delay: vec![],
        }
    }

    #[test]
    fn word_parity_roundtrips_carry_chain() {
        let data = [true, false, true, true, false, false, true, false, true, true, false, false,
            true, false, true, true, false, false, true, false, true, true, false, false];
        let (d, parity) = gps_word_parity(&data, false, false);
        assert_eq!(d.len(), 24);
        assert_eq!(parity.len(), 6);
    }

    #[test]
    fn frame_data_is_deterministic_over_period() {
        let mut engine = LnavEngine::default();
        engine.set_ephemeris(5, EphemerisSource::Keplerian(sample_eph()));
        let t0 = GpsTime::new_unchecked(2300, 0.0);
        let t1 = GpsTime::new_unchecked(2300, 5.0 * 6.0 * 10.0); // 10 subframes later, aligned to subframe1

        let mut bits0 = Vec::new();
        let mut bits1 = Vec::new();
        engine.get_frame_data(t0, 5, &mut bits0);
        engine.get_frame_data(t1, 5, &mut bits1);
        assert_eq!(bits0, bits1);
        assert_eq!(bits0.len(), WORDS_PER_SUBFRAME * BITS_PER_WORD);
    }

    #[test]
    fn unknown_svid_returns_empty() {
        let engine = LnavEngine::default();
        let mut out = Vec::new();
        let n = engine.get_frame_data(GpsTime::new_unchecked(2300, 0.0), 99, &mut out);
        assert_eq!(n, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn subframe_bits_are_binary() {
        let mut engine = LnavEngine::default();
        engine.set_ephemeris(5, EphemerisSource::Keplerian(sample_eph()));
        let mut out = Vec::new();
        engine.get_frame_data(GpsTime::new_unchecked(2300, 0.0), 5, &mut out);
        assert!(out.iter().all(|&b| b == 0 || b == 1));
    }
}
