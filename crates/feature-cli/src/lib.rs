//! Noise Feature CLI
//!
//! Command-line front end for the feature pipeline: reads recordings,
//! runs extraction across inputs in parallel and writes JSON lines.

use std::f64::consts::PI;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use feature_engine::{FeaturePipeline, FeatureSet, SignalBuffer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod cli;
pub mod input;
pub mod output;
pub mod settings;

use cli::{Cli, Command, DemoArgs, ExtractArgs, SchemaArgs};

/// Initialize logging on stderr; stdout is reserved for feature data
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("failed to set tracing subscriber")
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Extract(args) => extract(args, &mut out),
        Command::Schema(args) => schema(args, &mut out),
        Command::Demo(args) => demo(args, &mut out),
    }
}

fn extract<W: Write>(args: ExtractArgs, out: &mut W) -> Result<()> {
    let pipeline_config = settings::load(
        args.config.as_deref(),
        settings::Overrides {
            frame_size: args.frame_size,
            hop_size: args.hop_size,
        },
    )?;
    let pipeline = FeaturePipeline::new(pipeline_config)?;

    let mut sources = Vec::with_capacity(args.inputs.len());
    let mut signals = Vec::with_capacity(args.inputs.len());
    let mut failures = 0usize;
    for path in &args.inputs {
        match input::read_recording(path, args.sample_rate) {
            Ok(signal) => {
                sources.push(source_name(path));
                signals.push(signal);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read recording");
                failures += 1;
            }
        }
    }

    let results = pipeline.extract_batch(&signals);
    for ((source, signal), result) in sources.iter().zip(&signals).zip(results) {
        match result {
            Ok(set) if args.summary => {
                if !output::write_summary(out, source, &set, args.schema)? {
                    warn!(source = %source, "recording produced no frames");
                }
            }
            Ok(set) => {
                let flux = if args.flux {
                    Some(pipeline.onset_flux(signal)?)
                } else {
                    None
                };
                output::write_frames(out, source, &set, args.schema, flux.as_deref())?
            }
            Err(e) => {
                error!(source = %source, error = %e, "feature extraction failed");
                failures += 1;
            }
        }
    }
    out.flush()?;

    if failures > 0 {
        bail!("{} of {} inputs failed", failures, args.inputs.len());
    }
    Ok(())
}

fn schema<W: Write>(args: SchemaArgs, out: &mut W) -> Result<()> {
    for name in args.schema.field_names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// One second of a 440 Hz tone with 50 Hz mains hum
pub fn demo_signal(sample_rate: f64) -> Result<SignalBuffer> {
    let len = sample_rate.round().max(0.0) as usize;
    Ok(SignalBuffer::from_fn(sample_rate, len, |t| {
        0.1 * (2.0 * PI * 440.0 * t).sin() + 0.02 * (2.0 * PI * 50.0 * t).sin()
    })?)
}

fn demo<W: Write>(args: DemoArgs, out: &mut W) -> Result<()> {
    let signal = demo_signal(args.sample_rate)?;
    let set = FeaturePipeline::default().extract(&signal)?;
    info!(frames = set.len(), "demo signal analyzed");

    let first = FeatureSet::new(set.iter().take(1).copied().collect());
    output::write_frames(out, "demo", &first, args.schema, None)
}

fn source_name(path: &Path) -> String {
    path.display().to_string()
}
