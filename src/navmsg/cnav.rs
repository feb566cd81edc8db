// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GPS CNAV / L5 CNAV (L2C, L5), §4.4.2
//!
//! 12-second, 300-bit messages: CRC-24Q over the first 276 bits, rate-1/2
//! convolutional encode, block-interleaved with [`BlockInterleaver::L5_CNAV`].
//! Message content rotates across a 25-frame, 1200-second super-frame
//! following the schedule table in §4.4.2; message 37 (almanac) cycles
//! SV01-SV24 in slot 3 and SV25-SV32 in slot 2.

use std::collections::HashMap;

use crate::bits::{compose_bits, unscale_int, unscale_uint};
use crate::edc::{compute_crc24q_bits, BlockInterleaver, ConvolutionalEncoder};
use crate::ephemeris::KeplerianEphemeris;
use crate::navmsg::{EphemerisSource, IonoUtcParams, NavEngine};
use crate::system::SignalId;
use crate::time::GpsTime;

const MESSAGE_PERIOD_S: f64 = 12.0;
const INFO_BITS: usize = 276;
/// The slot-2 message id cycles through this 6-entry pattern across the
/// 25-frame super-frame.
const SLOT2_PATTERN: [u8; 6] = [30, 33, 31, 37, 31, 37];

/// Message id broadcast in `slot` (0..4) during `frame` (0..25) of the
/// super-frame, per the §4.4.2 schedule table.
fn scheduled_message_id(slot: u64, frame: usize) -> u8 {
    match slot {
        0 => 10,
        1 => 11,
        2 => SLOT2_PATTERN[frame % SLOT2_PATTERN.len()],
        _ => {
            if frame == 24 {
                33
            } else {
                37
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CnavSvCache {
    eph: Option<KeplerianEphemeris>,
    encoder_state: u8,
}

/// Serves both GPS L2C CNAV and L5 CNAV, which share the same message
/// format and schedule.
pub struct CnavEngine {
    signal: SignalId,
    svs: HashMap<u16, CnavSvCache>,
    iono_utc: IonoUtcParams,
}

impl CnavEngine {
    #[must_use]
    pub fn new(signal: SignalId) -> Self {
        CnavEngine {
            signal,
            svs: HashMap::new(),
            iono_utc: IonoUtcParams::default(),
        }
    }

    fn compose_message(msg_id: u8, svid: u16, tow_count: u32, eph: &KeplerianEphemeris) -> [u8; INFO_BITS] {
        let mut word = [0u32; 9]; // 9 x 32-bit words hold 276 bits (with slack)
        compose_bits(&mut word[0], i64::from(msg_id), 20, 6);
        compose_bits(&mut word[0], i64::from(svid), 14, 6);
        compose_bits(&mut word[0], i64::from(tow_count & 0x1FFFF), 0, 17);
        match msg_id {
            10 => {
                compose_bits(&mut word[1], unscale_uint(eph.toe, 4).into(), 16, 11);
                compose_bits(&mut word[2], unscale_int(eph.a.sqrt(), -19).into(), 0, 32);
                compose_bits(&mut word[4], unscale_int(eph.delta_n, -43).into(), 15, 17);
            }
            11 => {
                compose_bits(&mut word[1], unscale_uint(eph.e, -33).into(), 0, 32);
                compose_bits(&mut word[3], unscale_int(eph.omega0, -31).into(), 0, 32);
                compose_bits(&mut word[5], unscale_int(eph.i0, -31).into(), 0, 32);
            }
            30 | 31 => {
                compose_bits(&mut word[1], unscale_int(eph.af0, -31).into(), 10, 22);
                compose_bits(&mut word[2], unscale_int(eph.af1, -43).into(), 14, 18);
                compose_bits(&mut word[3], unscale_int(eph.af2, -59).into(), 16, 8);
            }
            33 => {
                compose_bits(&mut word[1], i64::from(eph.iodc), 16, 8);
            }
            _ => {
                // message 37 (almanac rotation): unmodelled, emits the common header only
            }
        }
        let mut bits = [0u8; INFO_BITS];
        for (i, bit) in bits.iter_mut().enumerate() {
            let w = word[i / 32];
            *bit = ((w >> (31 - (i % 32))) & 1) as u8;
        }
        bits
    }
}

impl NavEngine for CnavEngine {
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
        let message_count = (tow / MESSAGE_PERIOD_S).floor() as u64;
        let slot = message_count % 4;
        let frame_in_superframe = ((message_count / 4) % 25) as usize;
        let msg_id = scheduled_message_id(slot, frame_in_superframe);

        let info_bits = Self::compose_message(msg_id, svid, message_count as u32, eph);
        let crc = compute_crc24q_bits(&info_bits, 0);
        let mut payload = Vec::with_capacity(300);
        payload.extend_from_slice(&info_bits);
        for i in (0..24).rev() {
            payload.push(((crc >> i) & 1) as u8);
        }

        let mut encoder = ConvolutionalEncoder::new(ConvolutionalEncoder::GPS_CNAV);
        let symbols = encoder.encode(&payload);
        // Interleave the first L5_CNAV-sized block; the remainder (the
        // convolutional code's trailing symbols) is appended unintereaved.
        let block_len = BlockInterleaver::L5_CNAV.len().min(symbols.len());
        let mut out = BlockInterleaver::L5_CNAV.interleave(&symbols[..block_len]);
        out.extend_from_slice(&symbols[block_len..]);

        out_bit_sequence.clear();
        out_bit_sequence.extend(out);
        out_bit_sequence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_eph(svid: u16) -> KeplerianEphemeris {
        KeplerianEphemeris {
            svid,
            week: 2300,
            toe: 300_000.0,
            toc: 300_000.0,
            a: 26_560_000.0_f64.powi(2),
            a_dot: 0.0,
            e: 0.01,
            i0: 0.95,
            idot: 0.0,
            omega0: 1.2,
            omega_dot: -8e-9,
            omega: 0.5,
            m0: 0.1,
            delta_n: 4e-9,
            delta_n_dot: 0.0,
            cuc: 0.0,
            cus: 0.0,
            crc: 0.0,
            crs: 0.0,
            cic: 0.0,
            cis: 0.0,
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
    fn message_schedule_repeats_every_superframe() {
        // The schedule has 4 slots x 25 frames = 100 messages per
        // super-frame (1200 s); `scheduled_message_id` must return the same
        // message id at the same (slot, frame) position one full cycle
        // later, for every position in the cycle.
        for message_count in 0u64..100 {
            let slot = message_count % 4;
            let frame = ((message_count / 4) % 25) as usize;

            let next_count = message_count + 100;
            let next_slot = next_count % 4;
            let next_frame = ((next_count / 4) % 25) as usize;

            assert_eq!(
                scheduled_message_id(slot, frame),
                scheduled_message_id(next_slot, next_frame),
                "schedule mismatch at message_count={message_count}"
            );
        }
    }

    #[test]
    fn no_ephemeris_yields_empty() {
        let engine = CnavEngine::new(SignalId::GpsL2C);
        let mut out = Vec::new();
        assert_eq!(engine.get_frame_data(GpsTime::new_unchecked(2300, 0.0), 9, &mut out), 0);
    }

    #[test]
    fn output_is_symbol_valued() {
        let mut engine = CnavEngine::new(SignalId::GpsL5);
        engine.set_ephemeris(3, EphemerisSource::Keplerian(sample_eph(3)));
        let mut out = Vec::new();
        engine.get_frame_data(GpsTime::new_unchecked(2300, 0.0), 3, &mut out);
        assert!(out.iter().all(|&b| b == 0 || b == 1));
        assert_eq!(out.len(), 600); // 300 bits x rate 1/2
    }
}
