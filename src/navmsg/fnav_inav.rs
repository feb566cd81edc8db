// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Galileo F/NAV (E5a, §4.4.4) and I/NAV (E1/E5b/E6, §4.4.5)
//!
//! Both page formats share the same kernel: a 12-bit sync pattern, a
//! 24-bit-CRC-protected payload, rate-1/2 convolutional encoding with the
//! `{0x75, 0x5B}` polynomial pair, and [`BlockInterleaver::FNAV`]'s 8x67
//! column-major interleave. They differ only in page content rotation:
//! F/NAV pages 1-4 rotate ephemeris/clock, pages 5-6 rotate almanac
//! triplets; I/NAV follows the same rotation with its own page numbering.

use std::collections::HashMap;

use crate::bits::{compose_bits, unscale_int, unscale_uint};
use crate::edc::{compute_crc24q_bits, BlockInterleaver, ConvolutionalEncoder};
use crate::ephemeris::KeplerianEphemeris;
use crate::navmsg::{EphemerisSource, IonoUtcParams, NavEngine};
use crate::system::SignalId;
use crate::time::GpsTime;

const PAGE_PERIOD_S: f64 = 10.0;
const SYNC_PATTERN: u16 = 0b0001_0110_1100;
const PAYLOAD_BITS: usize = 214; // page payload before CRC

#[derive(Debug, Clone, Default)]
struct PageSvCache {
    eph: Option<KeplerianEphemeris>,
}

/// Shared F/NAV and I/NAV engine, parameterised by which carrier it serves.
pub struct FInavEngine {
    signal: SignalId,
    svs: HashMap<u16, PageSvCache>,
    iono_utc: IonoUtcParams,
}

impl FInavEngine {
    #[must_use]
    pub fn new(signal: SignalId) -> Self {
        FInavEngine {
            signal,
            svs: HashMap::new(),
            iono_utc: IonoUtcParams::default(),
        }
    }

    fn compose_page(page: u8, svid: u16, eph: &KeplerianEphemeris) -> [u8; PAYLOAD_BITS] {
        let mut words = [0u32; 7];
        compose_bits(&mut words[0], i64::from(page), 26, 6);
        compose_bits(&mut words[0], i64::from(svid), 20, 6);
        match page {
            1 => {
                compose_bits(&mut words[1], unscale_uint(eph.toe, 4).into(), 10, 14);
                compose_bits(&mut words[2], unscale_int(eph.a.sqrt(), -19).into(), 0, 32);
            }
            2 => {
                compose_bits(&mut words[1], unscale_uint(eph.e, -33).into(), 0, 32);
                compose_bits(&mut words[2], unscale_int(eph.i0, -31).into(), 0, 32);
            }
            3 => {
                compose_bits(&mut words[1], unscale_int(eph.omega0, -31).into(), 0, 32);
                compose_bits(&mut words[2], unscale_int(eph.omega, -31).into(), 0, 32);
            }
            4 => {
                compose_bits(&mut words[1], unscale_int(eph.af0, -31).into(), 10, 22);
                compose_bits(&mut words[2], unscale_int(eph.af1, -43).into(), 12, 20);
            }
            _ => {
                // pages 5/6: almanac triplet rotation, unmodelled here
            }
        }
        let mut bits = [0u8; PAYLOAD_BITS];
        for (i, bit) in bits.iter_mut().enumerate() {
            let w = words[i / 32];
            *bit = ((w >> (31 - (i % 32))) & 1) as u8;
        }
        bits
    }
}

impl NavEngine for FInavEngine {
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
        let page_count = (tow / PAGE_PERIOD_S).floor() as u64;
        let page = ((page_count % 6) + 1) as u8;

        let payload = Self::compose_page(page, svid, eph);
        let crc = compute_crc24q_bits(&payload, 0);
        let mut with_crc = Vec::with_capacity(PAYLOAD_BITS + 24);
        with_crc.extend_from_slice(&payload);
        for i in (0..24).rev() {
            with_crc.push(((crc >> i) & 1) as u8);
        }

        let mut encoder = ConvolutionalEncoder::new(ConvolutionalEncoder::GALILEO_NAV);
        let symbols = encoder.encode(&with_crc);
        let block_len = BlockInterleaver::FNAV.len().min(symbols.len());
        let mut interleaved = BlockInterleaver::FNAV.interleave(&symbols[..block_len]);
        interleaved.extend_from_slice(&symbols[block_len..]);

        out_bit_sequence.clear();
        for i in 0..12 {
            out_bit_sequence.push(((SYNC_PATTERN >> (11 - i)) & 1) as u8);
        }
        out_bit_sequence.extend(interleaved);
        out_bit_sequence.len()
    }
}
