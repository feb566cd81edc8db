// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Constellations and signal identifiers
//!
//! Every other component is keyed off of a `(System, SignalId, svid)` triple:
//! [`System`] picks the constellation, [`SignalId`] the broadcast signal
//! within it, and `svid` a 1-based space-vehicle number whose valid range
//! depends on [`System::sat_count`].

/// The four constellations this generator synthesises.
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    strum::AsRefStr,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[repr(u8)]
#[strum(serialize_all = "UPPERCASE")]
pub enum System {
    /// GPS
    Gps,
    /// BeiDou
    Bds,
    /// Galileo
    Gal,
    /// GLONASS
    Glo,
}

impl System {
    /// Maximum number of active space vehicles the ICD allocates for this
    /// constellation; navigation-engine caches are sized to this count.
    #[must_use]
    pub const fn sat_count(self) -> u16 {
        match self {
            System::Gps => 32,
            System::Bds => 63,
            System::Gal => 36,
            System::Glo => 24,
        }
    }

    /// `true` if `svid` (1-based) is in range for this constellation
    #[must_use]
    pub const fn svid_in_range(self, svid: u16) -> bool {
        svid >= 1 && svid <= self.sat_count()
    }

    /// Iterates over all four supported constellations
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// Broadcast signals recognised by [`crate::navmsg`] and [`crate::prn`].
///
/// Each variant names the system and band it belongs to; the bit layout and
/// message format are determined by looking up the engine that serves it
/// (see [`crate::navmsg::engine_for`]).
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    strum::AsRefStr,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum SignalId {
    /// GPS L1 C/A, LNAV
    GpsL1Ca,
    /// GPS L1C, CNAV2
    GpsL1C,
    /// GPS L2C, CNAV
    GpsL2C,
    /// GPS L2P, LNAV
    GpsL2P,
    /// GPS L5, L5 CNAV
    GpsL5,
    /// BeiDou B1C, B-CNAV1
    BdsB1C,
    /// BeiDou B1I, D1/D2
    BdsB1I,
    /// BeiDou B2I, D1/D2
    BdsB2I,
    /// BeiDou B3I, D1/D2
    BdsB3I,
    /// BeiDou B2a, B-CNAV2
    BdsB2A,
    /// BeiDou B2b, B-CNAV3
    BdsB2B,
    /// Galileo E1, I/NAV
    GalE1,
    /// Galileo E5a, F/NAV
    GalE5A,
    /// Galileo E5b, I/NAV
    GalE5B,
    /// Galileo E5 (E5a+E5b AltBOC), F/NAV
    GalE5,
    /// Galileo E6 (unimplemented, commercial service)
    GalE6,
    /// GLONASS G1, GNAV
    GloG1,
    /// GLONASS G2, GNAV
    GloG2,
}

impl SignalId {
    /// The constellation this signal belongs to
    #[must_use]
    pub const fn system(self) -> System {
        match self {
            SignalId::GpsL1Ca | SignalId::GpsL1C | SignalId::GpsL2C | SignalId::GpsL2P | SignalId::GpsL5 => {
                System::Gps
            }
            SignalId::BdsB1C
            | SignalId::BdsB1I
            | SignalId::BdsB2I
            | SignalId::BdsB3I
            | SignalId::BdsB2A
            | SignalId::BdsB2B => System::Bds,
            SignalId::GalE1 | SignalId::GalE5A | SignalId::GalE5B | SignalId::GalE5 | SignalId::GalE6 => {
                System::Gal
            }
            SignalId::GloG1 | SignalId::GloG2 => System::Glo,
        }
    }

    /// The `output.freqSelect` bit index for this signal, per system, as laid
    /// out in the configuration schema.
    #[must_use]
    pub const fn select_bit(self) -> u8 {
        match self {
            SignalId::GpsL1Ca => 0,
            SignalId::GpsL1C => 1,
            SignalId::GpsL2C => 2,
            SignalId::GpsL2P => 3,
            SignalId::GpsL5 => 4,
            SignalId::BdsB1C => 0,
            SignalId::BdsB1I => 1,
            SignalId::BdsB2I => 2,
            SignalId::BdsB3I => 3,
            SignalId::BdsB2A => 4,
            SignalId::BdsB2B => 5,
            SignalId::GalE1 => 0,
            SignalId::GalE5A => 1,
            SignalId::GalE5B => 2,
            SignalId::GalE5 => 3,
            SignalId::GalE6 => 4,
            SignalId::GloG1 => 0,
            SignalId::GloG2 => 1,
        }
    }

    /// Nominal broadcast carrier frequency, Hz, used to scale line-of-sight
    /// Doppler from band to band.
    ///
    /// GLONASS is FDMA: every SV offsets from the band centre by its
    /// broadcast frequency-channel number (`-7..=6`), so `glonass_channel`
    /// must be supplied for [`SignalId::GloG1`]/[`SignalId::GloG2`] and is
    /// ignored for every other signal.
    #[must_use]
    pub fn nominal_carrier_hz(self, glonass_channel: i8) -> f64 {
        match self {
            SignalId::GpsL1Ca | SignalId::GpsL1C => 1_575.42e6,
            SignalId::GpsL2C | SignalId::GpsL2P => 1_227.60e6,
            SignalId::GpsL5 | SignalId::GalE5A => 1_176.45e6,
            SignalId::BdsB1C | SignalId::BdsB1I | SignalId::GalE1 => 1_575.42e6,
            SignalId::BdsB2I | SignalId::BdsB3I => 1_268.52e6,
            SignalId::BdsB2A => 1_176.45e6,
            SignalId::BdsB2B | SignalId::GalE5B => 1_207.14e6,
            SignalId::GalE5 => 1_191.795e6,
            SignalId::GalE6 => 1_278.75e6,
            SignalId::GloG1 => 1_602.0e6 + f64::from(glonass_channel) * 0.562_5e6,
            SignalId::GloG2 => 1_246.0e6 + f64::from(glonass_channel) * 0.437_5e6,
        }
    }
}
