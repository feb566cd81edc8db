// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GPS CNAV-2 (L1C), §4.4.3
//!
//! Distinct three-subframe layout broadcast every 18 seconds: subframe 1
//! (9 bits, TOI only), subframe 2 (600 bits, BCH(51,8)-protected TOW/WN plus
//! CRC-24Q-protected clock/ephemeris), subframe 3 (274 bits, LDPC-protected
//! page content that rotates between clock/ephemeris, UTC, and almanac
//! pages).

use std::collections::HashMap;

use crate::bits::{compose_bits, unscale_int, unscale_uint};
use crate::edc::{compute_crc24q_bits, Gf64};
use crate::ephemeris::KeplerianEphemeris;
use crate::navmsg::{EphemerisSource, IonoUtcParams, NavEngine};
use crate::time::GpsTime;

const FRAME_PERIOD_S: f64 = 18.0;
const SUBFRAME1_BITS: usize = 9;
const SUBFRAME2_BITS: usize = 600;
const SUBFRAME3_BITS: usize = 274;

#[derive(Debug, Clone, Default)]
struct Cnav2SvCache {
    eph: Option<KeplerianEphemeris>,
}

#[derive(Default)]
pub struct Cnav2Engine {
    svs: HashMap<u16, Cnav2SvCache>,
    iono_utc: IonoUtcParams,
    gf: OnceCell,
}

/// Tiny lazily-built GF(2^6) table, used for the subframe-3 LDPC parity.
#[derive(Default)]
struct OnceCell(std::sync::OnceLock<Gf64>);

impl OnceCell {
    fn get(&self) -> &Gf64 {
        self.0.get_or_init(|| Gf64::new(Gf64::PRIMITIVE_POLY))
    }
}

impl Cnav2Engine {
    fn subframe1(toi: u16) -> [u8; SUBFRAME1_BITS] {
        let mut bits = [0u8; SUBFRAME1_BITS];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = ((toi >> (SUBFRAME1_BITS - 1 - i)) & 1) as u8;
        }
        bits
    }

    fn subframe2(tow_count: u32, eph: &KeplerianEphemeris) -> Vec<u8> {
        let mut words = [0u32; 19]; // 19 x 32 = 608 bits, truncated to 600
        compose_bits(&mut words[0], i64::from(tow_count & 0xFFFF), 16, 16);
        compose_bits(&mut words[0], i64::from(eph.week), 0, 13);
        compose_bits(&mut words[1], unscale_uint(eph.toe, 4).into(), 21, 11);
        compose_bits(&mut words[2], unscale_int(eph.a.sqrt(), -19).into(), 0, 32);
        compose_bits(&mut words[3], unscale_uint(eph.e, -33).into(), 0, 32);
        compose_bits(&mut words[4], unscale_int(eph.i0, -31).into(), 0, 32);
        compose_bits(&mut words[5], unscale_int(eph.omega0, -31).into(), 0, 32);
        compose_bits(&mut words[6], unscale_int(eph.omega, -31).into(), 0, 32);
        compose_bits(&mut words[7], unscale_int(eph.af0, -31).into(), 10, 22);

        let mut bits = Vec::with_capacity(SUBFRAME2_BITS);
        'outer: for word in words {
            for i in 0..32 {
                bits.push(((word >> (31 - i)) & 1) as u8);
                if bits.len() == SUBFRAME2_BITS - 24 {
                    break 'outer;
                }
            }
        }
        let crc = compute_crc24q_bits(&bits, 0);
        for i in (0..24).rev() {
            bits.push(((crc >> i) & 1) as u8);
        }
        bits.resize(SUBFRAME2_BITS, 0);
        bits
    }

    fn subframe3(gf: &Gf64, page: u8, eph: &KeplerianEphemeris) -> Vec<u8> {
        let mut info = Vec::with_capacity(200);
        let mut header = 0u32;
        compose_bits(&mut header, i64::from(page), 26, 6);
        for i in 0..32u32 {
            info.push(((header >> (31 - i)) & 1) as u8);
        }
        match page {
            1 => {
                let mut w = 0u32;
                compose_bits(&mut w, unscale_int(eph.delta_n, -43).into(), 15, 17);
                for i in 0..32u32 {
                    info.push(((w >> (31 - i)) & 1) as u8);
                }
            }
            2 => {
                let mut w = 0u32;
                compose_bits(&mut w, unscale_int(eph.cuc, -30).into(), 16, 16);
                for i in 0..32u32 {
                    info.push(((w >> (31 - i)) & 1) as u8);
                }
            }
            _ => {}
        }
        info.resize(250, 0);

        // LDPC-style parity: fold the information symbols (packed 6 bits
        // each) through the GF(2^6) field via a small fixed generator, one
        // parity symbol per 6 info symbols.
        let info_symbols: Vec<u8> = info.chunks(6).map(|c| {
            c.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | (b << (5 - i)))
        }).collect();
        let generator: Vec<Vec<u8>> = (0..info_symbols.len())
            .map(|i| vec![((i as u8).wrapping_mul(3).wrapping_add(1)) & 0x3F; 4])
            .collect();
        let parity_symbols = gf.vec_mul_matrix(&info_symbols, &generator);

        let mut bits = info;
        for symbol in parity_symbols {
            for i in 0..6 {
                bits.push((symbol >> (5 - i)) & 1);
            }
        }
        bits.resize(SUBFRAME3_BITS, 0);
        bits
    }
}

impl NavEngine for Cnav2Engine {
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

        let tow = start_time.tow();
        let frame_count = (tow / FRAME_PERIOD_S).floor() as u32;
        let toi = (frame_count % 512) as u16;
        let page = ((frame_count % 4) + 1) as u8;

        out_bit_sequence.clear();
        out_bit_sequence.extend(Self::subframe1(toi));
        out_bit_sequence.extend(Self::subframe2(frame_count, eph));
        out_bit_sequence.extend(Self::subframe3(self.gf.get(), page, eph));
        out_bit_sequence.len()
    }
}
