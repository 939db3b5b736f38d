// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    anyhow::{bail, Context, Error},
    argh::FromArgs,
    log::info,
    serde_json,
    simplelog::{Config, LevelFilter, SimpleLogger},
    std::{
        fmt::Display,
        fs,
        io::{self, Write},
        path::{Path, PathBuf},
    },
    wlan_radio::{CaptureSummary, CapturedFrame, FrameRadioInfo, RadioConfig, RadioSession},
};

/// Derives rate, airtime and TSF timing for every frame of a decoded 802.11 capture.
#[derive(FromArgs, Debug)]
struct Args {
    /// JSON file holding a radio configuration.
    #[argh(option)]
    config: Option<PathBuf>,

    /// log processing details.
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// query every frame again in reverse order and fail if any result changes.
    #[argh(switch)]
    revisit: bool,

    /// print one JSON object per frame instead of text.
    #[argh(switch)]
    json: bool,

    /// JSON array of captured frames, in capture order.
    #[argh(positional)]
    capture: PathBuf,
}

struct ReplayOptions {
    revisit: bool,
    json: bool,
}

fn load_config(path: &Path) -> Result<RadioConfig, Error> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Ok(RadioConfig::from_json(&json)?)
}

fn load_capture(path: &Path) -> Result<Vec<CapturedFrame>, Error> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read capture {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("malformed capture {}", path.display()))
}

fn or_unknown<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |value| value.to_string())
}

fn describe(info: &FrameRadioInfo, session: &RadioSession) -> String {
    let mut line = format!(
        "frame {}: {}, rate {} Mb/s, duration {} us, preamble {} us",
        info.frame,
        info.phy,
        or_unknown(info.rate.map(|rate| format!("{:.1}", rate))),
        or_unknown(info.duration),
        or_unknown(info.preamble),
    );
    if let Some(id) = info.aggregate {
        let burst = session.aggregate(id).and_then(|aggregate| aggregate.duration);
        line.push_str(&format!(
            ", {} (prior {} bytes, burst {} us)",
            id,
            info.prior_aggregate_bytes,
            or_unknown(burst)
        ));
    }
    if let (Some(start), Some(end), Some(timing)) = (info.start_tsf, info.end_tsf, info.timing) {
        line.push_str(&format!(
            ", tsf {}..{} ({:?}), ifs {}",
            start,
            end,
            timing,
            or_unknown(info.ifs)
        ));
    }
    if let Some(nav) = info.nav {
        line.push_str(&format!(", nav {} us", nav));
    }
    if let Some(signal) = info.signal_dbm {
        line.push_str(&format!(", {} dBm", signal));
    }
    line
}

fn replay<W: Write>(
    frames: &[CapturedFrame],
    config: RadioConfig,
    options: &ReplayOptions,
    out: &mut W,
) -> Result<CaptureSummary, Error> {
    let mut session = RadioSession::new(config);
    for frame in frames {
        session.process(frame).with_context(|| format!("failed to process frame {}", frame.id))?;
    }
    let summary = session.finish();

    if options.revisit {
        for frame in frames.iter().rev() {
            let before = session.frame_info(frame.id).cloned();
            let after = session.process(frame)?;
            if before.as_ref() != Some(after) {
                bail!("frame {} changed when revisited", frame.id);
            }
        }
        info!("revisited {} frames", frames.len());
    }

    for frame in frames {
        let info = match session.frame_info(frame.id) {
            Some(info) => info,
            None => continue,
        };
        if options.json {
            writeln!(out, "{}", serde_json::to_string(info)?)?;
        } else {
            writeln!(out, "{}", describe(info, &session))?;
            for advisory in info.advisories.iter() {
                writeln!(out, "    note: {}", advisory)?;
            }
        }
    }
    for entry in session.timeline() {
        writeln!(
            out,
            "timeline: frame {} {}..{} ifs {}",
            entry.frame,
            entry.start,
            entry.end,
            or_unknown(entry.spacing)
        )?;
    }
    writeln!(
        out,
        "{} frames, {} aggregates, {} timed, {} unresolved, {} with advisories",
        summary.frames,
        summary.aggregates,
        summary.timed,
        summary.unresolved,
        summary.with_advisories
    )?;
    Ok(summary)
}

fn main() -> Result<(), Error> {
    let args: Args = argh::from_env();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    SimpleLogger::init(level, Config::default())?;

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RadioConfig::default(),
    };
    let frames = load_capture(&args.capture)?;
    let options = ReplayOptions { revisit: args.revisit, json: args.json };
    let stdout = io::stdout();
    replay(&frames, config, &options, &mut stdout.lock())?;
    Ok(())
}
