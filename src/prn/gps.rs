// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GPS L1 C/A Gold code generator
//!
//! The classic two-LFSR construction: G1 is a fixed 10-stage shift register
//! (taps 3, 10), G2 is a second 10-stage register (taps 2, 3, 6, 8, 9, 10)
//! whose output is combined from two of its internal stages, selected per
//! SVID by the ICD's published tap table. The code is the modulo-2 sum of
//! G1 and the selected G2 combination, 1023 chips long, repeating every
//! millisecond.

use crate::error::GenError;

/// G2 tap pairs (1-based shift-register stage numbers) for PRN 1..=32,
/// per the GPS ICD (IS-GPS-200).
const G2_TAPS: [(u8, u8); 32] = [
    (2, 6), (3, 7), (4, 8), (5, 9), (1, 9), (2, 10), (1, 8), (2, 9),
    (3, 10), (2, 3), (3, 4), (5, 6), (6, 7), (7, 8), (8, 9), (9, 10),
    (1, 4), (2, 5), (3, 6), (4, 7), (5, 8), (6, 9), (1, 3), (4, 6),
    (5, 7), (6, 8), (7, 9), (8, 10), (1, 6), (2, 7), (3, 8), (4, 9),
];

const CODE_LENGTH: usize = 1023;

fn shift_g1(state: &mut [u8; 10]) -> u8 {
    let out = state[9];
    let fb = state[2] ^ state[9];
    for i in (1..10).rev() {
        state[i] = state[i - 1];
    }
    state[0] = fb;
    out
}

fn shift_g2(state: &mut [u8; 10]) -> u8 {
    let out = state[9];
    let fb = state[1] ^ state[2] ^ state[5] ^ state[7] ^ state[8] ^ state[9];
    for i in (1..10).rev() {
        state[i] = state[i - 1];
    }
    state[0] = fb;
    out
}

/// Generates the 1023-chip L1 C/A Gold code for `svid` (1-based, `1..=32`).
///
/// # Errors
///
/// Returns [`GenError::MalformedFrame`] if `svid` is out of the GPS ICD
/// range.
pub fn l1ca_gold_code(svid: u16) -> Result<Vec<u8>, GenError> {
    let Some((tap_a, tap_b)) = (1..=32u16)
        .zip(G2_TAPS)
        .find(|(id, _)| *id == svid)
        .map(|(_, taps)| taps)
    else {
        return Err(GenError::MalformedFrame {
            svid,
            signal: crate::system::SignalId::GpsL1Ca,
            reason: "svid out of range 1..=32 for L1 C/A".into(),
        });
    };

    let mut g1 = [1u8; 10];
    let mut g2 = [1u8; 10];
    let mut code = Vec::with_capacity(CODE_LENGTH);
    for _ in 0..CODE_LENGTH {
        let g1_out = shift_g1(&mut g1);
        // Taps are 1-based stage indices counted from the register's output
        // end, i.e. stage 10 is the output stage sampled before shifting.
        let g2_out = g2[10 - tap_a as usize] ^ g2[10 - tap_b as usize];
        shift_g2(&mut g2);
        code.push(g1_out ^ g2_out);
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_length_and_alphabet() {
        let code = l1ca_gold_code(1).unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.iter().all(|&c| c == 0 || c == 1));
    }

    #[test]
    fn distinct_svids_give_distinct_codes() {
        let code1 = l1ca_gold_code(1).unwrap();
        let code5 = l1ca_gold_code(5).unwrap();
        assert_ne!(code1, code5);
    }

    #[test]
    fn out_of_range_svid_errors() {
        assert!(l1ca_gold_code(0).is_err());
        assert!(l1ca_gold_code(33).is_err());
    }

    #[test]
    fn deterministic() {
        assert_eq!(l1ca_gold_code(19).unwrap(), l1ca_gold_code(19).unwrap());
    }
}
