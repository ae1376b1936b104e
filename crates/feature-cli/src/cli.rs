use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use feature_engine::FeatureSchema;

#[derive(Debug, Parser)]
#[command(
    name = "noise-features",
    version,
    about = "Per-frame acoustic feature extraction for noise classification",
    long_about = "Condition recordings (mains notch, highpass, lowpass), split them into \
                  frames and emit fixed-order feature vectors as JSON lines.\n\
                  Feature data goes to stdout, logs go to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract features from WAV or text sample files
    Extract(ExtractArgs),
    /// Print the ordered field names of a schema
    Schema(SchemaArgs),
    /// Run the pipeline on a synthetic 440 Hz tone with 50 Hz hum
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Input files (.wav, or text with one sample per line)
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Sample rate of text inputs in Hz
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Output schema
    #[arg(long, default_value_t = FeatureSchema::Full)]
    pub schema: FeatureSchema,

    /// Write one mean vector per input instead of one line per frame
    #[arg(long)]
    pub summary: bool,

    /// Add each frame's spectral flux (onset measure) to per-frame records
    #[arg(long, conflicts_with = "summary")]
    pub flux: bool,

    /// TOML file with pipeline settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Samples per frame (overrides config file and environment)
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Samples between frame starts (overrides config file and environment)
    #[arg(long)]
    pub hop_size: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Schema to describe
    #[arg(long, default_value_t = FeatureSchema::Full)]
    pub schema: FeatureSchema,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Sample rate of the synthetic tone in Hz
    #[arg(long, default_value_t = 16000.0)]
    pub sample_rate: f64,

    /// Output schema
    #[arg(long, default_value_t = FeatureSchema::Full)]
    pub schema: FeatureSchema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "noise-features",
            "extract",
            "a.wav",
            "b.txt",
            "--sample-rate",
            "8000",
            "--schema",
            "on-device",
            "--summary",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.sample_rate, Some(8000.0));
                assert_eq!(args.schema, FeatureSchema::OnDevice);
                assert!(args.summary);
                assert!(args.frame_size.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flux_conflicts_with_summary() {
        let args = ["noise-features", "extract", "a.wav", "--flux", "--summary"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(["noise-features", "extract", "a.wav", "--flux"]).is_ok());
    }

    #[test]
    fn test_extract_requires_inputs() {
        assert!(Cli::try_parse_from(["noise-features", "extract"]).is_err());
    }

    #[test]
    fn test_unknown_schema_rejected() {
        assert!(Cli::try_parse_from(["noise-features", "schema", "--schema", "mfcc"]).is_err());
    }
}
