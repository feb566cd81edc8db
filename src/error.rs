// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Error kinds produced across the generator
//!
//! [`GenError`] distinguishes fatal errors (configuration, I/O) from
//! recoverable ones (a malformed frame from one engine, a signal nobody
//! implements): the scene loop in [`crate::scene`] matches on the kind to
//! decide whether to abort the run or locally disable the offending
//! channel/system and carry on.

use std::path::PathBuf;

use crate::system::SignalId;

/// Errors produced while configuring or running the generator.
#[derive(thiserror::Error, Debug)]
pub enum GenError {
    /// The configuration document was unparsable or semantically
    /// inconsistent (e.g. a non-positive sample rate). Fatal.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A system was enabled but no valid ephemeris exists for any of its
    /// SVs. Logged; that system is disabled for the run.
    #[error("no ephemeris available for {0}")]
    OrbitalDataMissing(crate::system::System),

    /// No navigation engine implements the requested signal. Logged; that
    /// signal is silently disabled.
    #[error("unsupported signal: {0:?}")]
    UnsupportedSignal(SignalId),

    /// A navigation engine's internal consistency check failed while
    /// building a frame. Logged; the affected channel emits zeros for the
    /// affected frame.
    #[error("malformed frame for svid {svid} on {signal:?}: {reason}")]
    MalformedFrame {
        svid: u16,
        signal: SignalId,
        reason: String,
    },

    /// Writing to the output sink failed. Fatal.
    #[error("failed to write to sink {path}: {source}")]
    SinkIoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Not an error: the trajectory collaborator signalled end-of-track. Carries
/// no information since it always terminates the run cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryExhausted;

impl std::fmt::Display for TrajectoryExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trajectory exhausted")
    }
}

/// Whether a [`GenError`] should abort the run (`Fatal`) or can be handled
/// locally by disabling the affected channel/system (`Recoverable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Recoverable,
}

impl GenError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            GenError::ConfigInvalid(_) | GenError::SinkIoFailure { .. } => Severity::Fatal,
            GenError::OrbitalDataMissing(_)
            | GenError::UnsupportedSignal(_)
            | GenError::MalformedFrame { .. } => Severity::Recoverable,
        }
    }
}
