//! Captured Sample Buffers

use crate::error::FeatureError;

/// Audio-rate samples together with their sample rate
///
/// Immutable once built; the pipeline only borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffer {
    samples: Vec<f64>,
    sample_rate: f64,
}

impl SignalBuffer {
    /// Wrap captured samples, rejecting non-positive or non-finite sample rates
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Result<Self, FeatureError> {
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            return Err(FeatureError::Configuration(format!(
                "sample rate must be positive and finite, got {sample_rate}"
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Synthesize `len` samples from a function of time in seconds
    pub fn from_fn<F>(sample_rate: f64, len: usize, f: F) -> Result<Self, FeatureError>
    where
        F: Fn(f64) -> f64,
    {
        let samples = (0..len).map(|i| f(i as f64 / sample_rate)).collect();
        Self::new(samples, sample_rate)
    }

    /// Samples in capture order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample rate (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_sample_rate() {
        assert!(matches!(
            SignalBuffer::new(vec![0.0; 4], 0.0),
            Err(FeatureError::Configuration(_))
        ));
        assert!(SignalBuffer::new(vec![0.0; 4], -1.0).is_err());
        assert!(SignalBuffer::new(vec![0.0; 4], f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_fn_uses_seconds() {
        let signal = SignalBuffer::from_fn(4.0, 4, |t| t).unwrap();
        assert_eq!(signal.samples(), &[0.0, 0.25, 0.5, 0.75]);
        assert!((signal.duration_secs() - 1.0).abs() < 1e-12);
    }
}
