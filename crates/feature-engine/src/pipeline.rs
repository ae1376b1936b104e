//! Feature Extraction Pipeline
//!
//! Conditioning runs in a fixed order: mains notch, then DC/drift highpass,
//! then anti-aliasing lowpass. The conditioned signal is framed and every
//! frame is reduced to a [`FeatureVector`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use signal_filter::{apply, design_highpass, design_lowpass, design_notch};
use tracing::{debug, info};

use crate::error::FeatureError;
use crate::features::{FeatureSet, FeatureVector, OnDeviceFeatureVector};
use crate::fft::{spectral_flux, FrequencyBands, SpectralAnalyzer};
use crate::framing::frame_signal;
use crate::signal::SignalBuffer;
use crate::temporal::TemporalFeatures;

/// Mains hum frequency removed by the notch stage (Hz)
pub const MAINS_FREQUENCY_HZ: f64 = 50.0;
/// Quality factor of the mains notch
pub const NOTCH_Q: f64 = 30.0;
/// Highpass cutoff removing DC and slow drift (Hz)
pub const HIGHPASS_CUTOFF_HZ: f64 = 20.0;
pub const HIGHPASS_ORDER: usize = 2;
pub const LOWPASS_ORDER: usize = 4;

/// Default analysis frame length (samples)
pub const DEFAULT_FRAME_SIZE: usize = 1024;
/// Default hop between frame starts (samples)
pub const DEFAULT_HOP_SIZE: usize = 512;

/// Anti-aliasing cutoff: `min(0.45 * fs, fs / 2 - 1)`
pub fn lowpass_cutoff(sample_rate: f64) -> f64 {
    (0.45 * sample_rate).min(sample_rate / 2.0 - 1.0)
}

/// Framing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples per frame
    pub frame_size: usize,
    /// Samples between consecutive frame starts
    pub hop_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Reject zero frame or hop sizes
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.frame_size == 0 {
            return Err(FeatureError::Configuration(
                "frame_size must be greater than zero".to_string(),
            ));
        }
        if self.hop_size == 0 {
            return Err(FeatureError::Configuration(
                "hop_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Signal conditioning and per-frame feature extraction
///
/// Holds only configuration; every call builds its own filters and FFT
/// state, so one pipeline can serve many threads.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }
}

impl FeaturePipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Apply notch, highpass and lowpass in that order, zero-phase where the
    /// signal is long enough
    pub fn condition(&self, signal: &SignalBuffer) -> Result<Vec<f64>, FeatureError> {
        let fs = signal.sample_rate();
        let notch = design_notch(fs, MAINS_FREQUENCY_HZ, NOTCH_Q)?;
        let highpass = design_highpass(HIGHPASS_CUTOFF_HZ, fs, HIGHPASS_ORDER)?;
        let lowpass = design_lowpass(lowpass_cutoff(fs), fs, LOWPASS_ORDER)?;

        debug!(
            "Conditioning {} samples at {} Hz (lowpass {} Hz)",
            signal.len(),
            fs,
            lowpass_cutoff(fs)
        );

        let conditioned = apply(signal.samples(), &notch, true);
        let conditioned = apply(&conditioned, &highpass, true);
        Ok(apply(&conditioned, &lowpass, true))
    }

    /// Full feature vectors for every frame of `signal`
    pub fn extract(&self, signal: &SignalBuffer) -> Result<FeatureSet, FeatureError> {
        let conditioned = self.condition(signal)?;
        let frames = frame_signal(&conditioned, self.config.frame_size, self.config.hop_size)?;

        let mut analyzer = SpectralAnalyzer::new();
        let vectors = frames
            .iter()
            .map(|frame| extract_frame(&mut analyzer, frame.samples(), signal.sample_rate()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Extracted features for {} frames", vectors.len());
        Ok(FeatureSet::new(vectors))
    }

    /// Spectral flux of every frame against the one before it (0 for the first)
    ///
    /// Frames match [`FeaturePipeline::extract`] one to one. Flux is an onset
    /// measure kept outside both feature schemas.
    pub fn onset_flux(&self, signal: &SignalBuffer) -> Result<Vec<f64>, FeatureError> {
        let conditioned = self.condition(signal)?;
        let frames = frame_signal(&conditioned, self.config.frame_size, self.config.hop_size)?;

        let mut analyzer = SpectralAnalyzer::new();
        let mut previous = None;
        let mut flux = Vec::with_capacity(frames.len());
        for frame in &frames {
            let spectrum = analyzer.spectrum(frame.samples(), signal.sample_rate());
            flux.push(previous.as_ref().map_or(0.0, |p| spectral_flux(p, &spectrum)));
            previous = Some(spectrum);
        }
        Ok(flux)
    }

    /// On-device projection of [`FeaturePipeline::extract`]
    pub fn extract_on_device(
        &self,
        signal: &SignalBuffer,
    ) -> Result<Vec<OnDeviceFeatureVector>, FeatureError> {
        Ok(self.extract(signal)?.on_device())
    }

    /// Extract several signals in parallel, results in input order
    pub fn extract_batch(&self, signals: &[SignalBuffer]) -> Vec<Result<FeatureSet, FeatureError>> {
        info!("Extracting features for a batch of {} signals", signals.len());
        let results: Vec<_> = signals.par_iter().map(|s| self.extract(s)).collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!("Batch finished: {} ok, {} failed", results.len() - failed, failed);
        results
    }
}

/// Assemble the full feature vector for one (already conditioned) frame
pub fn extract_frame(
    analyzer: &mut SpectralAnalyzer,
    frame: &[f64],
    sample_rate: f64,
) -> Result<FeatureVector, FeatureError> {
    let temporal = TemporalFeatures::compute(frame)?;
    let spectrum = analyzer.spectrum(frame, sample_rate);
    let bands = FrequencyBands::for_sample_rate(sample_rate);

    Ok(FeatureVector {
        rms: temporal.rms,
        zcr: temporal.zcr,
        centroid: spectrum.centroid(),
        band_energy_low: spectrum.band_energy(bands.low.0, bands.low.1),
        band_energy_mid: spectrum.band_energy(bands.mid.0, bands.mid.1),
        band_energy_high: spectrum.band_energy(bands.high.0, bands.high.1),
        snr: spectrum.snr(),
    })
}
