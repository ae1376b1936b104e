//! Time Domain Features

use crate::error::FeatureError;

/// Time domain features for a frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemporalFeatures {
    /// Root mean square amplitude
    pub rms: f64,
    /// Fraction of adjacent sample pairs that change sign
    pub zcr: f64,
}

impl TemporalFeatures {
    /// Compute RMS and zero-crossing rate for a frame of at least two samples
    pub fn compute(frame: &[f64]) -> Result<Self, FeatureError> {
        Ok(Self {
            rms: rms(frame),
            zcr: zero_crossing_rate(frame)?,
        })
    }
}

/// Root mean square of a frame (0 for an empty frame)
pub fn rms(frame: &[f64]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_square = frame.iter().map(|x| x * x).sum::<f64>() / frame.len() as f64;
    mean_square.sqrt()
}

/// Sign changes between adjacent samples divided by `N - 1`
///
/// A pair counts only when its product is strictly negative, so samples
/// that are exactly zero never cross.
pub fn zero_crossing_rate(frame: &[f64]) -> Result<f64, FeatureError> {
    if frame.len() < 2 {
        return Err(FeatureError::InvalidInput(format!(
            "zero-crossing rate needs at least 2 samples, got {}",
            frame.len()
        )));
    }
    let crossings = frame.windows(2).filter(|w| w[0] * w[1] < 0.0).count();
    Ok(crossings as f64 / (frame.len() - 1) as f64)
}
