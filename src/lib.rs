// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! `swiftnav-ifgen` synthesises a multi-constellation GNSS intermediate-
//! frequency baseband recording: given a receiver trajectory, a time window,
//! an IF plan, and broadcast orbital data, it produces a quantised
//! complex-baseband stream containing the superposition of every visible
//! GPS/BeiDou/Galileo/GLONASS signal plus thermal noise.
//!
//! ## Pipeline
//!
//! [`config`] parses the run's configuration document into the inputs
//! [`scene::Scene`] needs. [`scene`] is the per-millisecond heartbeat: it
//! asks [`trajectory`] for the receiver's new position, refreshes visibility
//! using [`orbit`] and [`ionosphere`], drives each visible satellite's
//! [`channel::SatelliteIfChannel`] (which in turn draws on [`prn`] spreading
//! codes and [`navmsg`] navigation bits, assembled via [`edc`]'s checksum/FEC
//! kernels and [`bits`]' fixed-point packing), sums the result onto
//! [`noise`], and hands the mixed buffer to [`quantize`] and [`sink`].
//!
//! ## Supporting layers
//!
//! [`system`] defines the `(System, SignalId)` identifiers everything else is
//! keyed off of; [`ephemeris`] holds the broadcast orbital-element types and
//! the per-SV arenas that cache them; [`coords`] and [`time`] are the
//! geodesy/time-base utility layer the scene loop and navigation engines
//! build on; [`error`] collects the error kinds every fallible operation
//! returns.

pub mod bits;
pub mod channel;
pub mod config;
pub mod coords;
pub mod edc;
pub mod ephemeris;
pub mod error;
pub mod ionosphere;
mod math;
pub mod navmsg;
pub mod noise;
pub mod orbit;
pub mod prn;
pub mod quantize;
pub mod scene;
pub mod signal;
pub mod sink;
pub mod system;
pub mod time;
pub mod trajectory;
