// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Output sink, §6 "Output file formats"
//!
//! The scene loop hands [`Sink::write_ms`] one millisecond of quantised
//! bytes at a time; the sink's only job is to get them onto disk in order,
//! with no framing header, and to turn I/O failure into a [`GenError`] the
//! caller can treat as fatal per §7.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::GenError;
use crate::noise::Complex;
use crate::quantize::{quantize, QuantizeResult};

/// Buffered little-endian writer for the generator's output recording.
pub struct Sink {
    path: PathBuf,
    writer: BufWriter<File>,
    bytes_written: u64,
    clipped_count: u64,
}

impl Sink {
    /// Creates (or truncates) the output file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, GenError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| GenError::SinkIoFailure {
            path: path.clone(),
            source,
        })?;
        Ok(Sink {
            path,
            writer: BufWriter::new(file),
            bytes_written: 0,
            clipped_count: 0,
        })
    }

    /// Quantises `samples` to `format` and appends the resulting bytes.
    ///
    /// Returns the number of I/Q components that clipped this millisecond,
    /// which the caller may fold into its own diagnostics.
    pub fn write_ms(&mut self, samples: &[Complex], format: crate::ephemeris::SampleFormat) -> Result<u64, GenError> {
        let QuantizeResult { bytes, clipped_count } = quantize(samples, format);
        self.writer.write_all(&bytes).map_err(|source| GenError::SinkIoFailure {
            path: self.path.clone(),
            source,
        })?;
        self.bytes_written += bytes.len() as u64;
        self.clipped_count += clipped_count;
        Ok(clipped_count)
    }

    /// Flushes buffered bytes to disk. The scene loop calls this at the end
    /// of a run; dropping a [`Sink`] without flushing risks losing the
    /// final buffered bytes on some platforms.
    pub fn finish(mut self) -> Result<(), GenError> {
        self.writer.flush().map_err(|source| GenError::SinkIoFailure {
            path: self.path.clone(),
            source,
        })
    }

    /// Total bytes written so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Total I/Q components clipped so far, across every call to
    /// [`Sink::write_ms`].
    #[must_use]
    pub fn clipped_count(&self) -> u64 {
        self.clipped_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::SampleFormat;

    #[test]
    fn writes_expected_byte_count_for_iq4() {
        let dir = std::env::temp_dir();
        let path = dir.join("swiftnav_ifgen_sink_test_iq4.bin");
        let mut sink = Sink::create(&path).unwrap();
        let samples = vec![Complex::new(0.1, -0.1); 10];
        sink.write_ms(&samples, SampleFormat::Iq4).unwrap();
        assert_eq!(sink.bytes_written(), 10);
        sink.finish().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 10);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn writes_expected_byte_count_for_iq8() {
        let dir = std::env::temp_dir();
        let path = dir.join("swiftnav_ifgen_sink_test_iq8.bin");
        let mut sink = Sink::create(&path).unwrap();
        let samples = vec![Complex::new(0.1, -0.1); 4];
        for _ in 0..3 {
            sink.write_ms(&samples, SampleFormat::Iq8).unwrap();
        }
        sink.finish().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4 * 2 * 3);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reports_clipped_components() {
        let dir = std::env::temp_dir();
        let path = dir.join("swiftnav_ifgen_sink_test_clip.bin");
        let mut sink = Sink::create(&path).unwrap();
        let samples = vec![Complex::new(100.0, -100.0)];
        let clipped_this_ms = sink.write_ms(&samples, SampleFormat::Iq8).unwrap();
        assert_eq!(clipped_this_ms, 2);
        assert_eq!(sink.clipped_count(), 2);
        sink.finish().unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_path_is_a_sink_io_failure() {
        let err = Sink::create("/nonexistent_dir_for_test/out.bin").unwrap_err();
        assert!(matches!(err, GenError::SinkIoFailure { .. }));
    }
}
