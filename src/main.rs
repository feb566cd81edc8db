// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! CLI entry point, §6 "External interfaces"
//!
//! Single positional argument: path to a configuration document, default
//! `IfGenTest.json`. Exit codes follow §6 exactly: 0 on a clean run, 1 if the
//! configuration couldn't be read/parsed/resolved, any other non-zero code
//! on a fatal runtime error (I/O failure writing the recording).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use swiftnav_ifgen::config::Config;
use swiftnav_ifgen::error::Severity;
use swiftnav_ifgen::scene::Scene;
use swiftnav_ifgen::sink::Sink;

/// Synthesise a multi-constellation GNSS IF baseband recording.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the run's configuration document.
    #[arg(default_value = "IfGenTest.json")]
    config: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let resolved = match Config::load(&cli.config).and_then(Config::resolve) {
        Ok(resolved) => resolved,
        Err(e) => {
            log::error!("configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    let output_file = resolved.output.output_file.clone();
    let format = resolved.output.format;
    let mut scene = Scene::new(
        resolved.output,
        resolved.trajectory,
        resolved.initial_llh,
        resolved.ephemeris,
        resolved.almanac,
        resolved.iono_utc,
        resolved.elevation_mask_deg,
        resolved.noise_seed,
        resolved.noise_sigma,
        resolved.start_time,
    );

    let mut sink = match Sink::create(&output_file) {
        Ok(sink) => sink,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut issues = Vec::new();
    let mut ms_written = 0u64;
    loop {
        issues.clear();
        let Some(samples) = scene.generate_ms(&mut issues) else {
            break;
        };
        for issue in &issues {
            match issue.severity() {
                Severity::Fatal => log::error!("{issue}"),
                Severity::Recoverable => log::warn!("{issue}"),
            }
        }
        let sample_count = samples.len();
        let clipped = match sink.write_ms(&samples, format) {
            Ok(clipped) => clipped,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        };
        scene.report_clipping(clipped, sample_count as u64 * 2);
        ms_written += 1;
    }

    if let Err(e) = sink.finish() {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    log::info!("wrote {ms_written} ms to {}", output_file.display());
    ExitCode::SUCCESS
}
