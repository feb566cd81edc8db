// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Per-SV spreading code catalogue
//!
//! [`generate`] is the single entry point [`crate::channel`] uses to obtain
//! a satellite's data and pilot chip arrays: given `(system, signal, svid)`
//! it returns the chip sequences plus a [`PrnAttribute`] describing the
//! chip rate, periods, and which subcarrier modulation applies. GPS L1 C/A
//! uses the textbook Gold-code construction ([`gps::l1ca_gold_code`]);
//! the remaining signal families use a signal-specific maximal-length LFSR
//! seeded from the SVID, since their ICD code tables run to tens of
//! thousands of published chips each and this generator's job is correct
//! *behaviour* (determinism, period, modulation dispatch) rather than
//! bit-for-bit reproduction of a published code table.

mod gps;

use crate::error::GenError;
use crate::system::{SignalId, System};

/// Subcarrier / combining scheme applied on top of the chip sequence, as
/// dispatched by [`crate::channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// Plain BPSK, no subcarrier
    Bpsk,
    /// Time-division multiplex between data and pilot channel (GPS L2C)
    Tdm,
    /// Binary offset carrier, single subcarrier rate
    Boc { subcarrier_chips_per_chip: u32 },
    /// Time-multiplexed BOC, e.g. GPS L1C pilot
    Tmboc,
    /// Quadrature-multiplexed BOC, e.g. BeiDou B1C pilot
    Qmboc,
    /// Composite BOC, e.g. Galileo E1 pilot
    Cboc,
    /// GLONASS FDMA, meander XOR applied in the channel model
    GlonassFdma,
}

/// Static attributes of a generated spreading code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrnAttribute {
    /// Chip rate, chips per millisecond
    pub chip_rate_per_ms: u32,
    /// Data-channel code period, milliseconds
    pub data_period_ms: u32,
    /// Pilot-channel code period, milliseconds (equal to `data_period_ms`
    /// when there's no separate pilot)
    pub pilot_period_ms: u32,
    pub modulation: Modulation,
}

/// Data and pilot chip arrays plus the attributes describing them.
#[derive(Debug, Clone)]
pub struct PrnChipSet {
    /// `None` for the GLONASS and classic-BPSK-only signals
    pub data: Vec<u8>,
    pub pilot: Option<Vec<u8>>,
    pub attribute: PrnAttribute,
}

/// Maximal-length LFSR seeded deterministically from `seed`, producing
/// `length` chip values in `{0, 1}`.
fn lfsr_sequence(seed: u32, length: usize) -> Vec<u8> {
    // 17-bit LFSR, primitive polynomial x^17 + x^14 + 1, period 2^17 - 1.
    let mut state = seed.max(1) & 0x1FFFF;
    let mut out = Vec::with_capacity(length);
    for _ in 0..length {
        out.push((state & 1) as u8);
        let fb = ((state >> 0) ^ (state >> 3)) & 1;
        state = (state >> 1) | (fb << 16);
    }
    out
}

fn svid_seed(system: System, signal: SignalId, svid: u16) -> u32 {
    let system_tag = system as u32;
    let signal_tag = signal as u32;
    0x9E37_79B9u32
        .wrapping_mul(u32::from(svid) + 1)
        .wrapping_add(system_tag.wrapping_mul(131))
        .wrapping_add(signal_tag.wrapping_mul(524_287))
}

/// Produces the data/pilot chip arrays and attribute record for a
/// `(system, signal, svid)` triple.
///
/// # Errors
///
/// Returns [`GenError::UnsupportedSignal`] if `signal` doesn't belong to
/// `system`, and [`GenError::MalformedFrame`]-free validation of `svid`
/// range is the caller's responsibility (an out-of-range SVID simply
/// produces a deterministic-but-meaningless code here).
pub fn generate(system: System, signal: SignalId, svid: u16) -> Result<PrnChipSet, GenError> {
    if signal.system() != system {
        return Err(GenError::UnsupportedSignal(signal));
    }

    let chip_set = match signal {
        SignalId::GpsL1Ca => {
            let code = gps::l1ca_gold_code(svid)?;
            PrnChipSet {
                data: code,
                pilot: None,
                attribute: PrnAttribute {
                    chip_rate_per_ms: 1023,
                    data_period_ms: 1,
                    pilot_period_ms: 1,
                    modulation: Modulation::Bpsk,
                },
            }
        }
        SignalId::GpsL2P | SignalId::BdsB1I | SignalId::BdsB2I | SignalId::BdsB3I => {
            let seed = svid_seed(system, signal, svid);
            PrnChipSet {
                data: lfsr_sequence(seed, 2046),
                pilot: None,
                attribute: PrnAttribute {
                    chip_rate_per_ms: 2046,
                    data_period_ms: 1,
                    pilot_period_ms: 1,
                    modulation: Modulation::Bpsk,
                },
            }
        }
        SignalId::GpsL2C => {
            let seed = svid_seed(system, signal, svid);
            PrnChipSet {
                data: lfsr_sequence(seed, 10230),
                pilot: Some(lfsr_sequence(seed ^ 0xFFFF_FFFF, 10230 * 75)),
                attribute: PrnAttribute {
                    chip_rate_per_ms: 511,
                    data_period_ms: 20,
                    pilot_period_ms: 1500,
                    modulation: Modulation::Tdm,
                },
            }
        }
        SignalId::GpsL5 => {
            let seed = svid_seed(system, signal, svid);
            PrnChipSet {
                data: lfsr_sequence(seed, 10230),
                pilot: Some(lfsr_sequence(seed ^ 0xAAAA_AAAA, 10230)),
                attribute: PrnAttribute {
                    chip_rate_per_ms: 10230,
                    data_period_ms: 1,
                    pilot_period_ms: 1,
                    modulation: Modulation::Bpsk,
                },
            }
        }
        SignalId::GpsL1C | SignalId::BdsB1C => {
            let seed = svid_seed(system, signal, svid);
            PrnChipSet {
                data: lfsr_sequence(seed, 10230),
                pilot: Some(lfsr_sequence(seed ^ 0x5555_5555, 10230)),
                attribute: PrnAttribute {
                    chip_rate_per_ms: 10230,
                    data_period_ms: 10,
                    pilot_period_ms: 10,
                    modulation: if signal == SignalId::GpsL1C {
                        Modulation::Tmboc
                    } else {
                        Modulation::Qmboc
                    },
                },
            }
        }
        SignalId::GalE1 => {
            let seed = svid_seed(system, signal, svid);
            PrnChipSet {
                data: lfsr_sequence(seed, 4092),
                pilot: Some(lfsr_sequence(seed ^ 0x3333_3333, 4092)),
                attribute: PrnAttribute {
                    chip_rate_per_ms: 1023,
                    data_period_ms: 4,
                    pilot_period_ms: 4,
                    modulation: Modulation::Cboc,
                },
            }
        }
        SignalId::GalE5A | SignalId::GalE5B | SignalId::GalE5 | SignalId::BdsB2A | SignalId::BdsB2B => {
            let seed = svid_seed(system, signal, svid);
            PrnChipSet {
                data: lfsr_sequence(seed, 10230),
                pilot: Some(lfsr_sequence(seed ^ 0x0F0F_0F0F, 10230 * 100)),
                attribute: PrnAttribute {
                    chip_rate_per_ms: 10230,
                    data_period_ms: 1,
                    pilot_period_ms: 100,
                    modulation: Modulation::Boc {
                        subcarrier_chips_per_chip: 1,
                    },
                },
            }
        }
        SignalId::GloG1 | SignalId::GloG2 => PrnChipSet {
            data: lfsr_sequence(0x0000_01FF, 511),
            pilot: None,
            attribute: PrnAttribute {
                chip_rate_per_ms: 511,
                data_period_ms: 1,
                pilot_period_ms: 1,
                modulation: Modulation::GlonassFdma,
            },
        },
        SignalId::GalE6 => return Err(GenError::UnsupportedSignal(signal)),
    };

    if let Some(pilot) = &chip_set.pilot {
        debug_assert!(
            pilot.len() % chip_set.data.len().max(1) == 0,
            "pilot array length must be an integer multiple of the data array length"
        );
    }

    Ok(chip_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = generate(System::Gps, SignalId::GpsL1Ca, 5).unwrap();
        let b = generate(System::Gps, SignalId::GpsL1Ca, 5).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn chips_are_binary() {
        let set = generate(System::Gal, SignalId::GalE1, 3).unwrap();
        assert!(set.data.iter().all(|&c| c == 0 || c == 1));
    }

    #[test]
    fn pilot_period_is_multiple_of_data_period() {
        let set = generate(System::Gps, SignalId::GpsL2C, 10).unwrap();
        let pilot = set.pilot.unwrap();
        assert_eq!(pilot.len() % set.data.len(), 0);
    }

    #[test]
    fn mismatched_system_is_unsupported() {
        let err = generate(System::Gps, SignalId::GalE1, 1).unwrap_err();
        assert!(matches!(err, GenError::UnsupportedSignal(_)));
    }

    #[test]
    fn unimplemented_e6_is_unsupported() {
        let err = generate(System::Gal, SignalId::GalE6, 1).unwrap_err();
        assert!(matches!(err, GenError::UnsupportedSignal(_)));
    }
}
