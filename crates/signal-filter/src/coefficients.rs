//! Digital Filter Coefficients

use crate::error::FilterError;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Transfer function of a digital IIR filter
///
/// `b` holds the feedforward (numerator) taps and `a` the feedback (denominator)
/// taps, both ordered by increasing delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoefficients {
    /// Create coefficients from raw taps
    ///
    /// Both sequences must be non-empty and `a[0]` must be non-zero.
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self, FilterError> {
        if b.is_empty() || a.is_empty() {
            return Err(FilterError::Configuration(
                "filter coefficients must not be empty".to_string(),
            ));
        }
        if a[0] == 0.0 || !a[0].is_finite() {
            return Err(FilterError::Configuration(format!(
                "leading feedback coefficient must be finite and non-zero, got {}",
                a[0]
            )));
        }
        Ok(Self { b, a })
    }

    /// Feedforward taps
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Feedback taps
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Length of the longer tap sequence
    pub fn num_taps(&self) -> usize {
        self.a.len().max(self.b.len())
    }

    /// Taps padded to a common length and scaled so that `a[0] == 1`
    pub(crate) fn normalized(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.num_taps();
        let a0 = self.a[0];
        let scale = |taps: &[f64]| -> Vec<f64> {
            let mut out: Vec<f64> = taps.iter().map(|t| t / a0).collect();
            out.resize(n, 0.0);
            out
        };
        (scale(&self.b), scale(&self.a))
    }

    /// Magnitude of the frequency response at `freq` Hz for sample rate `fs`
    pub fn magnitude_response(&self, freq: f64, fs: f64) -> f64 {
        let omega = 2.0 * std::f64::consts::PI * freq / fs;
        let eval = |taps: &[f64]| -> Complex<f64> {
            taps.iter()
                .enumerate()
                .map(|(k, &t)| Complex::from_polar(t, -omega * k as f64))
                .sum()
        };
        let den = eval(&self.a);
        if den.norm() == 0.0 {
            return f64::INFINITY;
        }
        (eval(&self.b) / den).norm()
    }
}
