// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Quantisation to the output wire formats
//!
//! The scale constants below (3 for IQ4, 25 for IQ8) are chosen so that
//! unit-variance noise, at nominal AGC gain, lands comfortably inside the
//! quantiser's range instead of saturating it.

use crate::ephemeris::SampleFormat;
use crate::noise::Complex;

/// Result of quantising one millisecond's worth of samples: the encoded
/// bytes plus how many I/Q components clipped against the format's range.
#[derive(Debug, Clone)]
pub struct QuantizeResult {
    pub bytes: Vec<u8>,
    pub clipped_count: u64,
}

fn quantize_iq4_component(v: f64, clipped: &mut u64) -> u8 {
    let magnitude = (v.abs() * 3.0).floor() as i32;
    let magnitude = if magnitude > 7 {
        *clipped += 1;
        7
    } else {
        magnitude
    };
    let sign = u8::from(v < 0.0);
    (sign << 3) | (magnitude as u8 & 0x7)
}

fn quantize_iq8_component(v: f64, clipped: &mut u64) -> i8 {
    let scaled = (v * 25.0).floor();
    if scaled > 127.0 {
        *clipped += 1;
        127
    } else if scaled < -128.0 {
        *clipped += 1;
        -128
    } else {
        scaled as i8
    }
}

/// Quantises a slice of complex baseband samples into the requested output
/// format, little-endian, with no framing header.
#[must_use]
pub fn quantize(samples: &[Complex], format: SampleFormat) -> QuantizeResult {
    let mut clipped_count = 0u64;
    let bytes = match format {
        SampleFormat::Iq4 => samples
            .iter()
            .map(|s| {
                let i = quantize_iq4_component(s.re, &mut clipped_count);
                let q = quantize_iq4_component(s.im, &mut clipped_count);
                (i << 4) | q
            })
            .collect(),
        SampleFormat::Iq8 => {
            let mut out = Vec::with_capacity(samples.len() * 2);
            for s in samples {
                out.push(quantize_iq8_component(s.re, &mut clipped_count) as u8);
                out.push(quantize_iq8_component(s.im, &mut clipped_count) as u8);
            }
            out
        }
    };
    QuantizeResult {
        bytes,
        clipped_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iq4_packs_sign_and_three_bit_magnitude() {
        let samples = [Complex::new(0.9, -0.9)];
        let result = quantize(&samples, SampleFormat::Iq4);
        assert_eq!(result.bytes.len(), 1);
        let byte = result.bytes[0];
        let i_nibble = byte >> 4;
        let q_nibble = byte & 0xF;
        assert_eq!(i_nibble & 0x8, 0); // positive
        assert_eq!(q_nibble & 0x8, 0x8); // negative
        assert_eq!(result.clipped_count, 0);
    }

    #[test]
    fn iq4_clamps_at_seven() {
        let samples = [Complex::new(10.0, -10.0)];
        let result = quantize(&samples, SampleFormat::Iq4);
        let byte = result.bytes[0];
        assert_eq!(byte >> 4, 0b0111); // positive, magnitude clamped to 7
        assert_eq!(byte & 0xF, 0b1111); // negative, magnitude clamped to 7
        assert_eq!(result.clipped_count, 2);
    }

    #[test]
    fn iq8_two_bytes_per_sample() {
        let samples = [Complex::new(1.0, -1.0), Complex::new(0.0, 0.0)];
        let result = quantize(&samples, SampleFormat::Iq8);
        assert_eq!(result.bytes.len(), 4);
        assert_eq!(result.bytes[0] as i8, 25);
        assert_eq!(result.bytes[1] as i8, -25);
    }

    #[test]
    fn iq8_clamps_at_range() {
        let samples = [Complex::new(100.0, -100.0)];
        let result = quantize(&samples, SampleFormat::Iq8);
        assert_eq!(result.bytes[0] as i8, 127);
        assert_eq!(result.bytes[1] as i8, -128);
        assert_eq!(result.clipped_count, 2);
    }
}
