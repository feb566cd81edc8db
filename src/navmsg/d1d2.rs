// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! BeiDou D1/D2 (B1I, B2I, B3I), §4.4.6
//!
//! D1 serves MEO/IGSO satellites at 50 bps, D2 serves GEO satellites at 500
//! bps; both lay out a 300-bit, 5-subframe message where every 30-bit word
//! is two BCH(15,11)-protected 15-bit sub-words (11 info bits + 4 parity
//! each). GEO PRNs 1-5 and 59-63 are classified D2 per the BeiDou ICD's
//! GEO slot assignment; every other PRN is D1.

use std::collections::HashMap;

use crate::bits::{compose_bits, unscale_int, unscale_uint};
use crate::edc::bch1511_encode;
use crate::ephemeris::KeplerianEphemeris;
use crate::navmsg::{EphemerisSource, IonoUtcParams, NavEngine};
use crate::time::GpsTime;

const WORDS_PER_SUBFRAME: usize = 10;
const D1_SUBFRAME_PERIOD_S: f64 = 6.0;
const D2_SUBFRAME_PERIOD_S: f64 = 0.6;

/// `true` if `svid` falls in BeiDou's GEO PRN ranges (1-5, 59-63), which
/// broadcast D2 rather than D1.
fn is_geo(svid: u16) -> bool {
    (1..=5).contains(&svid) || (59..=63).contains(&svid)
}

fn subframe_period_s(svid: u16) -> f64 {
    if is_geo(svid) {
        D2_SUBFRAME_PERIOD_S
    } else {
        D1_SUBFRAME_PERIOD_S
    }
}

/// Encodes one 30-bit word as two adjacent BCH(15,11) sub-words, given the
/// word's 22 information bits (MSB-first).
fn bch_word(info22: &[u8; 22]) -> [u8; 30] {
    let mut first = [0u8; 11];
    first.copy_from_slice(&info22[0..11]);
    let mut second = [0u8; 11];
    second.copy_from_slice(&info22[11..22]);

    let mut out = [0u8; 30];
    out[0..15].copy_from_slice(&bch1511_encode(first));
    out[15..30].copy_from_slice(&bch1511_encode(second));
    out
}

fn word_bits(word: u32, info_bits: u32) -> [u8; 22] {
    let mut bits = [0u8; 22];
    for (i, bit) in bits.iter_mut().enumerate().take(info_bits as usize) {
        *bit = ((word >> (31 - i as u32)) & 1) as u8;
    }
    bits
}

#[derive(Debug, Clone, Default)]
struct D1D2SvCache {
    eph: Option<KeplerianEphemeris>,
}

/// Serves BeiDou B1I/B2I/B3I, dispatching per-SV between the D1 and D2
/// frame timings.
#[derive(Default)]
pub struct D1D2Engine {
    svs: HashMap<u16, D1D2SvCache>,
    iono_utc: IonoUtcParams,
}

impl D1D2Engine {
    fn build_subframe(subframe_id: u8, svid: u16, eph: &KeplerianEphemeris) -> [u32; WORDS_PER_SUBFRAME] {
        let mut words = [0u32; WORDS_PER_SUBFRAME];
        compose_bits(&mut words[0], 0x712, 20, 11); // preamble (D1/D2 common sync)
        compose_bits(&mut words[0], i64::from(subframe_id), 17, 3);
        compose_bits(&mut words[0], i64::from(svid), 11, 6);

        match subframe_id {
            1 => {
                compose_bits(&mut words[1], unscale_int(eph.af0, -33).into(), 2, 24);
                compose_bits(&mut words[2], unscale_int(eph.af1, -50).into(), 2, 22);
                compose_bits(&mut words[3], unscale_int(eph.af2, -66).into(), 18, 11);
            }
            2 => {
                compose_bits(&mut words[1], unscale_int(eph.delta_n, -43).into(), 6, 16);
                compose_bits(&mut words[2], unscale_uint(eph.e, -33).into(), 0, 22);
                compose_bits(&mut words[3], unscale_int(eph.cuc, -31).into(), 4, 18);
            }
            3 => {
                compose_bits(&mut words[1], unscale_int(eph.i0, -31).into(), 0, 22);
                compose_bits(&mut words[2], unscale_int(eph.omega_dot, -43).into(), 6, 16);
                compose_bits(&mut words[3], unscale_int(eph.idot, -43).into(), 8, 14);
            }
            4 => {
                compose_bits(&mut words[1], unscale_int(eph.omega0, -31).into(), 0, 22);
                compose_bits(&mut words[2], unscale_int(eph.omega, -31).into(), 0, 22);
                compose_bits(&mut words[3], unscale_uint(eph.toe, 3).into(), 4, 17);
            }
            _ => {
                // subframe 5: almanac page rotation, unmodelled
            }
        }
        words
    }
}

impl NavEngine for D1D2Engine {
    fn set_ephemeris(&mut self, svid: u16, eph: EphemerisSource) {
        let EphemerisSource::Keplerian(eph) = eph else {
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

        let period = subframe_period_s(svid);
        let tow = start_time.tow();
        let subframe_count = (tow / period).floor() as u64;
        let subframe_id = ((subframe_count % 5) + 1) as u8;

        let words = Self::build_subframe(subframe_id, svid, eph);

        out_bit_sequence.clear();
        for word in words {
            out_bit_sequence.extend(bch_word(&word_bits(word, 22)));
        }
        out_bit_sequence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_eph(svid: u16) -> KeplerianEphemeris {
        KeplerianEphemeris {
            svid,
            week: 900,
            toe: 100_000.0,
            toc: 100_000.0,
            a: 27_900_000.0_f64.powi(2),
            a_dot: 0.0,
            e: 0.005,
            i0: 0.9,
            idot: 0.0,
            omega0: 0.8,
            omega_dot: -7e-9,
            omega: 0.4,
            m0: 0.2,
            delta_n: 3e-9,
            delta_n_dot: 0.0,
            cuc: 0.0,
            cus: 0.0,
            crc: 0.0,
            crs: 0.0,
            cic: 0.0,
            cis: 0.0,
            af0: 1e-6,
            af1: 1e-13,
            af2: 0.0,
            iode: 1,
            iodc: 1,
            healthy: true,
            group_delay: vec![],
        }
    }

    #[test]
    fn geo_svids_use_d2_timing() {
        assert!(is_geo(3));
        assert!(is_geo(61));
        assert!(!is_geo(20));
    }

    #[test]
    fn frame_content_is_periodic_per_variant() {
        let mut engine = D1D2Engine::default();
        engine.set_ephemeris(20, EphemerisSource::Keplerian(sample_eph(20)));
        let t0 = GpsTime::new_unchecked(900, 0.0);
        let t1 = GpsTime::new_unchecked(900, 5.0 * D1_SUBFRAME_PERIOD_S);
        let mut a = Vec::new();
        let mut b = Vec::new();
        engine.get_frame_data(t0, 20, &mut a);
        engine.get_frame_data(t1, 20, &mut b);
        assert_eq!(a, b);
        assert_eq!(a.len(), WORDS_PER_SUBFRAME * 30);
    }

    #[test]
    fn every_word_parity_checks_out() {
        let mut engine = D1D2Engine::default();
        engine.set_ephemeris(3, EphemerisSource::Keplerian(sample_eph(3)));
        let mut bits = Vec::new();
        engine.get_frame_data(GpsTime::new_unchecked(900, 0.0), 3, &mut bits);
        for word in bits.chunks(30) {
            for sub in word.chunks(15) {
                let mut codeword = [0u8; 15];
                codeword.copy_from_slice(sub);
                assert!(crate::edc::bch1511_verify(codeword));
            }
        }
    }
}
