//! Pipeline settings, layered: defaults, TOML file, environment, CLI flags.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use feature_engine::{PipelineConfig, DEFAULT_FRAME_SIZE, DEFAULT_HOP_SIZE};
use tracing::debug;

/// Environment variable prefix, e.g. `NOISE_FEATURES_FRAME_SIZE`
pub const ENV_PREFIX: &str = "NOISE_FEATURES";

/// Explicit overrides from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub frame_size: Option<usize>,
    pub hop_size: Option<usize>,
}

/// Resolve the pipeline configuration and validate it
pub fn load(file: Option<&Path>, overrides: Overrides) -> Result<PipelineConfig> {
    load_with_env(file, Environment::with_prefix(ENV_PREFIX).try_parsing(true), overrides)
}

fn load_with_env(
    file: Option<&Path>,
    env: Environment,
    overrides: Overrides,
) -> Result<PipelineConfig> {
    let mut builder = Config::builder()
        .set_default("frame_size", DEFAULT_FRAME_SIZE as u64)?
        .set_default("hop_size", DEFAULT_HOP_SIZE as u64)?;

    if let Some(path) = file {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }
    builder = builder.add_source(env);

    if let Some(frame_size) = overrides.frame_size {
        builder = builder.set_override("frame_size", frame_size as u64)?;
    }
    if let Some(hop_size) = overrides.hop_size {
        builder = builder.set_override("hop_size", hop_size as u64)?;
    }

    let settings: PipelineConfig = builder
        .build()
        .context("failed to assemble pipeline configuration")?
        .try_deserialize()
        .context("invalid pipeline configuration")?;
    settings.validate()?;

    debug!(
        frame_size = settings.frame_size,
        hop_size = settings.hop_size,
        "resolved pipeline configuration"
    );
    Ok(settings)
}
