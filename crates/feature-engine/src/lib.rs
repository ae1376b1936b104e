//! Feature Engineering Engine
//!
//! Turns audio-rate samples into fixed-schema per-frame feature vectors for
//! noise classification: conditioning, framing, time and frequency domain
//! features, and the reduced on-device projection.

mod error;
mod features;
mod fft;
mod framing;
mod pipeline;
mod signal;
mod temporal;

pub use error::FeatureError;
pub use features::{
    FeatureSchema, FeatureSet, FeatureVector, OnDeviceFeatureVector, FEATURE_DIMENSION,
    ON_DEVICE_FEATURE_DIMENSION,
};
pub use fft::{hann_window, spectral_flux, FrequencyBands, SpectralAnalyzer, Spectrum, SNR_CEILING_DB};
pub use framing::{frame_count, frame_signal, Frame};
pub use pipeline::{
    extract_frame, lowpass_cutoff, FeaturePipeline, PipelineConfig, DEFAULT_FRAME_SIZE,
    DEFAULT_HOP_SIZE, HIGHPASS_CUTOFF_HZ, HIGHPASS_ORDER, LOWPASS_ORDER, MAINS_FREQUENCY_HZ,
    NOTCH_Q,
};
pub use signal::SignalBuffer;
pub use temporal::{rms, zero_crossing_rate, TemporalFeatures};
