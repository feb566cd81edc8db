// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Navigation-message engines
//!
//! Every signal family is served by exactly one engine type, looked up once
//! via [`NavEngineTable::for_signal`] and shared read-only across every
//! satellite channel broadcasting that signal. Engines are process-lifetime:
//! their per-SV caches are populated by the `set_*` setters during scene
//! setup and never mutated again, so `get_frame_data` can run concurrently
//! from every channel's worker-pool task (design note: "navigation engines
//! as a polymorphic set... each variant carries only its own packed-frame
//! caches").
//!
//! The shared contract (§4.4's "Shared contract"): given `start_time` and an
//! SVID, `get_frame_data` produces a deterministic bit sequence for that
//! instant's frame/page/message/string, and repeated calls at the same
//! `(start_time mod period, svid)` yield identical output.

mod bcnav;
mod cnav;
mod cnav2;
mod d1d2;
mod fnav_inav;
mod gnav;
mod lnav;

pub use bcnav::BCnavEngine;
pub use cnav::CnavEngine;
pub use cnav2::Cnav2Engine;
pub use d1d2::D1D2Engine;
pub use fnav_inav::FInavEngine;
pub use gnav::GnavEngine;
pub use lnav::LnavEngine;

use std::sync::Arc;

use crate::ephemeris::{AlmanacRecord, GlonassEphemeris, IonoUtcParams, KeplerianEphemeris};
use crate::system::SignalId;
use crate::time::GpsTime;

/// Either flavour of broadcast ephemeris an engine might be handed.
#[derive(Debug, Clone)]
pub enum EphemerisSource {
    Keplerian(KeplerianEphemeris),
    Glonass(GlonassEphemeris),
}

/// Capability set every navigation-message engine implements.
///
/// Implementations must be safe to call concurrently once setup is done:
/// `get_frame_data` takes `&self`, not `&mut self`.
pub trait NavEngine: Send + Sync {
    fn set_ephemeris(&mut self, svid: u16, eph: EphemerisSource);
    fn set_almanac(&mut self, svid: u16, alm: AlmanacRecord);
    fn set_iono_utc(&mut self, iono_utc: IonoUtcParams);

    /// Produces the bit sequence (one `u8` per bit, values `{0, 1}`) for the
    /// frame/page/message/string covering `start_time`, for `svid`.
    ///
    /// Returns the number of bits written into `out_bit_sequence`, or 0 if
    /// `svid` isn't one this engine has ephemeris for.
    fn get_frame_data(&self, start_time: GpsTime, svid: u16, out_bit_sequence: &mut Vec<u8>) -> usize;
}

/// Static lookup table from [`SignalId`] to the engine instance that serves
/// it, built once at scene setup.
#[derive(Clone, Default)]
pub struct NavEngineTable {
    lnav: Option<Arc<std::sync::RwLock<LnavEngine>>>,
    l2c_cnav: Option<Arc<std::sync::RwLock<CnavEngine>>>,
    l5_cnav: Option<Arc<std::sync::RwLock<CnavEngine>>>,
    cnav2: Option<Arc<std::sync::RwLock<Cnav2Engine>>>,
    fnav: Option<Arc<std::sync::RwLock<FInavEngine>>>,
    inav_e1: Option<Arc<std::sync::RwLock<FInavEngine>>>,
    inav_e5b: Option<Arc<std::sync::RwLock<FInavEngine>>>,
    d1d2: Option<Arc<std::sync::RwLock<D1D2Engine>>>,
    bcnav1: Option<Arc<std::sync::RwLock<BCnavEngine>>>,
    bcnav2: Option<Arc<std::sync::RwLock<BCnavEngine>>>,
    bcnav3: Option<Arc<std::sync::RwLock<BCnavEngine>>>,
    gnav: Option<Arc<std::sync::RwLock<GnavEngine>>>,
}

impl NavEngineTable {
    /// Builds a table with one fresh instance of every implemented engine.
    /// `GalE6` has no entry: per the open questions in the design notes, the
    /// source never fully implements ECNAV, so it stays `UnsupportedSignal`.
    #[must_use]
    pub fn new() -> Self {
        NavEngineTable {
            lnav: Some(Arc::new(std::sync::RwLock::new(LnavEngine::default()))),
            l2c_cnav: Some(Arc::new(std::sync::RwLock::new(CnavEngine::new(SignalId::GpsL2C)))),
            l5_cnav: Some(Arc::new(std::sync::RwLock::new(CnavEngine::new(SignalId::GpsL5)))),
            cnav2: Some(Arc::new(std::sync::RwLock::new(Cnav2Engine::default()))),
            fnav: Some(Arc::new(std::sync::RwLock::new(FInavEngine::new(SignalId::GalE5A)))),
            inav_e1: Some(Arc::new(std::sync::RwLock::new(FInavEngine::new(SignalId::GalE1)))),
            inav_e5b: Some(Arc::new(std::sync::RwLock::new(FInavEngine::new(SignalId::GalE5B)))),
            d1d2: Some(Arc::new(std::sync::RwLock::new(D1D2Engine::default()))),
            bcnav1: Some(Arc::new(std::sync::RwLock::new(BCnavEngine::new(SignalId::BdsB1C)))),
            bcnav2: Some(Arc::new(std::sync::RwLock::new(BCnavEngine::new(SignalId::BdsB2A)))),
            bcnav3: Some(Arc::new(std::sync::RwLock::new(BCnavEngine::new(SignalId::BdsB2B)))),
            gnav: Some(Arc::new(std::sync::RwLock::new(GnavEngine::default()))),
        }
    }

    /// Looks up the shared engine handle for `signal`, or `None` if it's not
    /// implemented (e.g. Galileo E6).
    #[must_use]
    pub fn handle_for(&self, signal: SignalId) -> Option<EngineHandle> {
        match signal {
            SignalId::GpsL1Ca | SignalId::GpsL2P => self.lnav.clone().map(EngineHandle::Lnav),
            SignalId::GpsL2C => self.l2c_cnav.clone().map(EngineHandle::Cnav),
            SignalId::GpsL5 => self.l5_cnav.clone().map(EngineHandle::Cnav),
            SignalId::GpsL1C => self.cnav2.clone().map(EngineHandle::Cnav2),
            SignalId::GalE5A => self.fnav.clone().map(EngineHandle::FInav),
            SignalId::GalE1 => self.inav_e1.clone().map(EngineHandle::FInav),
            SignalId::GalE5B | SignalId::GalE5 => self.inav_e5b.clone().map(EngineHandle::FInav),
            SignalId::BdsB1I | SignalId::BdsB2I | SignalId::BdsB3I => {
                self.d1d2.clone().map(EngineHandle::D1D2)
            }
            SignalId::BdsB1C => self.bcnav1.clone().map(EngineHandle::BCnav),
            SignalId::BdsB2A => self.bcnav2.clone().map(EngineHandle::BCnav),
            SignalId::BdsB2B => self.bcnav3.clone().map(EngineHandle::BCnav),
            SignalId::GloG1 | SignalId::GloG2 => self.gnav.clone().map(EngineHandle::Gnav),
            SignalId::GalE6 => None,
        }
    }
}

/// A shared, lockable reference to one of the concrete engine types.
///
/// Using an enum of `Arc<RwLock<T>>` rather than `Arc<dyn NavEngine>` keeps
/// setup (`set_ephemeris` etc., called once per SV) and the hot read path
/// (`get_frame_data`) on concrete types the compiler can inline, while still
/// giving every signal a uniform handle the scene loop can hold in a table.
/// `RwLock` over `Mutex` matters here: every channel's worker-pool task calls
/// `get_frame_data` every millisecond, and those calls must run concurrently
/// rather than serialize on a single per-engine lock.
#[derive(Clone)]
pub enum EngineHandle {
    Lnav(Arc<std::sync::RwLock<LnavEngine>>),
    Cnav(Arc<std::sync::RwLock<CnavEngine>>),
    Cnav2(Arc<std::sync::RwLock<Cnav2Engine>>),
    FInav(Arc<std::sync::RwLock<FInavEngine>>),
    D1D2(Arc<std::sync::RwLock<D1D2Engine>>),
    BCnav(Arc<std::sync::RwLock<BCnavEngine>>),
    Gnav(Arc<std::sync::RwLock<GnavEngine>>),
}

impl EngineHandle {
    /// Produces the frame bits for `svid` at `start_time`, regardless of
    /// which concrete engine backs this handle. Takes the read lock, so any
    /// number of channels can call this at once.
    pub fn get_frame_data(&self, start_time: GpsTime, svid: u16, out: &mut Vec<u8>) -> usize {
        match self {
            EngineHandle::Lnav(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
            EngineHandle::Cnav(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
            EngineHandle::Cnav2(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
            EngineHandle::FInav(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
            EngineHandle::D1D2(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
            EngineHandle::BCnav(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
            EngineHandle::Gnav(e) => e.read().unwrap().get_frame_data(start_time, svid, out),
        }
    }

    pub fn set_ephemeris(&self, svid: u16, eph: EphemerisSource) {
        match self {
            EngineHandle::Lnav(e) => e.write().unwrap().set_ephemeris(svid, eph),
            EngineHandle::Cnav(e) => e.write().unwrap().set_ephemeris(svid, eph),
            EngineHandle::Cnav2(e) => e.write().unwrap().set_ephemeris(svid, eph),
            EngineHandle::FInav(e) => e.write().unwrap().set_ephemeris(svid, eph),
            EngineHandle::D1D2(e) => e.write().unwrap().set_ephemeris(svid, eph),
            EngineHandle::BCnav(e) => e.write().unwrap().set_ephemeris(svid, eph),
            EngineHandle::Gnav(e) => e.write().unwrap().set_ephemeris(svid, eph),
        }
    }

    pub fn set_almanac(&self, svid: u16, alm: AlmanacRecord) {
        match self {
            EngineHandle::Lnav(e) => e.write().unwrap().set_almanac(svid, alm),
            EngineHandle::Cnav(e) => e.write().unwrap().set_almanac(svid, alm),
            EngineHandle::Cnav2(e) => e.write().unwrap().set_almanac(svid, alm),
            EngineHandle::FInav(e) => e.write().unwrap().set_almanac(svid, alm),
            EngineHandle::D1D2(e) => e.write().unwrap().set_almanac(svid, alm),
            EngineHandle::BCnav(e) => e.write().unwrap().set_almanac(svid, alm),
            EngineHandle::Gnav(e) => e.write().unwrap().set_almanac(svid, alm),
        }
    }

    pub fn set_iono_utc(&self, iono_utc: IonoUtcParams) {
        match self {
            EngineHandle::Lnav(e) => e.write().unwrap().set_iono_utc(iono_utc),
            EngineHandle::Cnav(e) => e.write().unwrap().set_iono_utc(iono_utc),
            EngineHandle::Cnav2(e) => e.write().unwrap().set_iono_utc(iono_utc),
            EngineHandle::FInav(e) => e.write().unwrap().set_iono_utc(iono_utc),
            EngineHandle::D1D2(e) => e.write().unwrap().set_iono_utc(iono_utc),
            EngineHandle::BCnav(e) => e.write().unwrap().set_iono_utc(iono_utc),
            EngineHandle::Gnav(e) => e.write().unwrap().set_iono_utc(iono_utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_serves_every_implemented_signal() {
        let table = NavEngineTable::new();
        assert!(table.handle_for(SignalId::GpsL1Ca).is_some());
        assert!(table.handle_for(SignalId::GloG1).is_some());
        assert!(table.handle_for(SignalId::BdsB2B).is_some());
    }

    #[test]
    fn gal_e6_is_unimplemented() {
        let table = NavEngineTable::new();
        assert!(table.handle_for(SignalId::GalE6).is_none());
    }
}
