//! IIR Filter Design
//!
//! Butterworth highpass/lowpass filters are designed from the analog prototype,
//! frequency-transformed, then mapped to the z-plane with the bilinear transform
//! (pre-warped, normalized sample rate of 2). The notch uses the closed-form
//! second-order band-stop.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use tracing::{debug, warn};

use crate::coefficients::FilterCoefficients;
use crate::error::FilterError;

/// Distance kept between a design frequency and the band edges (Hz)
pub const CUTOFF_EPSILON: f64 = 1e-6;

/// Clamp a design frequency into `[CUTOFF_EPSILON, fs/2 - CUTOFF_EPSILON]`
///
/// Out-of-range requests are moved silently to the nearest valid edge, which
/// changes the effective response of the designed filter.
pub fn clamp_cutoff(cutoff: f64, fs: f64) -> f64 {
    let nyquist = 0.5 * fs;
    cutoff.min(nyquist - CUTOFF_EPSILON).max(CUTOFF_EPSILON)
}

#[derive(Debug, Clone, Copy)]
enum BandType {
    Lowpass,
    Highpass,
}

/// Design a Butterworth highpass filter
pub fn design_highpass(
    cutoff: f64,
    fs: f64,
    order: usize,
) -> Result<FilterCoefficients, FilterError> {
    butterworth(cutoff, fs, order, BandType::Highpass)
}

/// Design a Butterworth lowpass filter
pub fn design_lowpass(
    cutoff: f64,
    fs: f64,
    order: usize,
) -> Result<FilterCoefficients, FilterError> {
    butterworth(cutoff, fs, order, BandType::Lowpass)
}

/// Design a second-order notch (band-stop) filter centred on `freq`
///
/// The -3 dB bandwidth is `freq / q`. DC gain is exactly one.
pub fn design_notch(fs: f64, freq: f64, q: f64) -> Result<FilterCoefficients, FilterError> {
    validate_sample_rate(fs)?;
    if !(q > 0.0 && q.is_finite()) {
        return Err(FilterError::Configuration(format!(
            "notch quality factor must be positive and finite, got {q}"
        )));
    }

    let centre = clamped("notch", freq, fs);
    let w0 = 2.0 * PI * centre / fs;
    let beta = (w0 / q / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    debug!("Notch design: fs={}, freq={}, q={}, gain={:.6}", fs, centre, q, gain);

    FilterCoefficients::new(
        vec![gain, -2.0 * gain * cos_w0, gain],
        vec![1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
    )
}

fn validate_sample_rate(fs: f64) -> Result<(), FilterError> {
    if fs > 0.0 && fs.is_finite() {
        Ok(())
    } else {
        Err(FilterError::invalid_sample_rate(fs))
    }
}

fn clamped(kind: &str, freq: f64, fs: f64) -> f64 {
    let value = clamp_cutoff(freq, fs);
    if value != freq {
        warn!("{} frequency {} Hz clamped to {} Hz (fs={})", kind, freq, value, fs);
    }
    value
}

fn butterworth(
    cutoff: f64,
    fs: f64,
    order: usize,
    band: BandType,
) -> Result<FilterCoefficients, FilterError> {
    validate_sample_rate(fs)?;
    if order == 0 {
        return Err(FilterError::Configuration(
            "Butterworth order must be at least 1".to_string(),
        ));
    }

    let cutoff = clamped("cutoff", cutoff, fs);
    let normalized = cutoff / (0.5 * fs);
    debug!(
        "Butterworth {:?} design: order={}, cutoff={} Hz, wn={:.6}",
        band, order, cutoff, normalized
    );

    // Analog prototype: poles evenly spaced on the left half of the unit circle
    let n = order as f64;
    let prototype: Vec<Complex<f64>> = (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - (n - 1.0);
            -Complex::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect();

    let warped = 4.0 * (PI * normalized / 2.0).tan();

    let (zeros, poles, gain) = match band {
        BandType::Lowpass => {
            let poles: Vec<Complex<f64>> = prototype.iter().map(|&p| p * warped).collect();
            (Vec::new(), poles, warped.powi(order as i32))
        }
        BandType::Highpass => {
            let product = prototype
                .iter()
                .fold(Complex::new(1.0, 0.0), |acc, &p| acc * -p);
            let poles: Vec<Complex<f64>> = prototype.iter().map(|&p| warped / p).collect();
            let zeros = vec![Complex::new(0.0, 0.0); order];
            (zeros, poles, (Complex::new(1.0, 0.0) / product).re)
        }
    };

    bilinear(&zeros, &poles, gain)
}

/// Map analog zeros/poles/gain to a digital transfer function
fn bilinear(
    zeros: &[Complex<f64>],
    poles: &[Complex<f64>],
    gain: f64,
) -> Result<FilterCoefficients, FilterError> {
    let fs2 = Complex::new(4.0, 0.0);
    let one = Complex::new(1.0, 0.0);

    let mut digital_zeros: Vec<Complex<f64>> =
        zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let digital_poles: Vec<Complex<f64>> =
        poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    // Zeros at infinity land on Nyquist
    let degree = poles.len().saturating_sub(zeros.len());
    digital_zeros.extend(std::iter::repeat(Complex::new(-1.0, 0.0)).take(degree));

    let num = zeros.iter().fold(one, |acc, &z| acc * (fs2 - z));
    let den = poles.iter().fold(one, |acc, &p| acc * (fs2 - p));
    let k = gain * (num / den).re;

    let b = poly(&digital_zeros).into_iter().map(|c| c * k).collect();
    let a = poly(&digital_poles);
    FilterCoefficients::new(b, a)
}

/// Expand roots into polynomial coefficients, highest power first
fn poly(roots: &[Complex<f64>]) -> Vec<f64> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    // Conjugate pairs leave only rounding noise in the imaginary parts
    coeffs.into_iter().map(|c| c.re).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_taps(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-8, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_lowpass_half_nyquist_order_2() {
        let coeffs = design_lowpass(250.0, 1000.0, 2).unwrap();
        assert_taps(coeffs.b(), &[0.292_893_218_8, 0.585_786_437_6, 0.292_893_218_8]);
        assert_taps(coeffs.a(), &[1.0, 0.0, 0.171_572_875_3]);
    }

    #[test]
    fn test_highpass_half_nyquist_order_2() {
        let coeffs = design_highpass(250.0, 1000.0, 2).unwrap();
        assert_taps(coeffs.b(), &[0.292_893_218_8, -0.585_786_437_6, 0.292_893_218_8]);
        assert_taps(coeffs.a(), &[1.0, 0.0, 0.171_572_875_3]);
    }

    #[test]
    fn test_lowpass_first_order() {
        let coeffs = design_lowpass(250.0, 1000.0, 1).unwrap();
        assert_taps(coeffs.b(), &[0.5, 0.5]);
        assert_taps(coeffs.a(), &[1.0, 0.0]);
    }

    #[test]
    fn test_butterworth_half_power_at_cutoff() {
        for order in 1..=6 {
            let lp = design_lowpass(1000.0, 16000.0, order).unwrap();
            let hp = design_highpass(1000.0, 16000.0, order).unwrap();
            let half_power = std::f64::consts::FRAC_1_SQRT_2;
            assert!((lp.magnitude_response(1000.0, 16000.0) - half_power).abs() < 1e-9);
            assert!((hp.magnitude_response(1000.0, 16000.0) - half_power).abs() < 1e-9);
            assert!((lp.magnitude_response(0.0, 16000.0) - 1.0).abs() < 1e-9);
            assert!((hp.magnitude_response(8000.0, 16000.0) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_notch_rejects_centre_and_passes_dc() {
        let coeffs = design_notch(16000.0, 50.0, 30.0).unwrap();
        assert_eq!(coeffs.b()[0], coeffs.b()[2]);
        assert!(coeffs.magnitude_response(50.0, 16000.0) < 1e-9);
        assert!((coeffs.magnitude_response(0.0, 16000.0) - 1.0).abs() < 1e-12);
        assert!(coeffs.magnitude_response(440.0, 16000.0) > 0.99);
    }

    #[test]
    fn test_invalid_sample_rate() {
        assert!(matches!(
            design_lowpass(100.0, 0.0, 4),
            Err(FilterError::Configuration(_))
        ));
        assert!(design_highpass(100.0, -8000.0, 2).is_err());
        assert!(design_notch(f64::NAN, 50.0, 30.0).is_err());
    }

    #[test]
    fn test_invalid_order_and_quality() {
        assert!(design_lowpass(100.0, 8000.0, 0).is_err());
        assert!(design_notch(8000.0, 50.0, 0.0).is_err());
    }

    #[test]
    fn test_out_of_range_cutoff_is_clamped_not_rejected() {
        let above = design_lowpass(20_000.0, 16000.0, 4).unwrap();
        let edge = design_lowpass(8000.0 - CUTOFF_EPSILON, 16000.0, 4).unwrap();
        assert_eq!(above, edge);

        let below = design_highpass(-5.0, 16000.0, 2).unwrap();
        let floor = design_highpass(CUTOFF_EPSILON, 16000.0, 2).unwrap();
        assert_eq!(below, floor);
    }

    #[test]
    fn test_notch_frequency_above_nyquist_is_clamped() {
        let above = design_notch(100.0, 60.0, 30.0).unwrap();
        let edge = design_notch(100.0, 50.0 - CUTOFF_EPSILON, 30.0).unwrap();
        assert_eq!(above, edge);

        let below = design_notch(8000.0, -50.0, 30.0).unwrap();
        let floor = design_notch(8000.0, CUTOFF_EPSILON, 30.0).unwrap();
        assert_eq!(below, floor);
    }

    proptest! {
        #[test]
        fn prop_clamped_cutoff_in_band(fs in 1e-3f64..1e6, cutoff in -1e7f64..1e7) {
            let clamped = clamp_cutoff(cutoff, fs);
            prop_assert!(clamped >= CUTOFF_EPSILON);
            prop_assert!(clamped <= fs / 2.0 - CUTOFF_EPSILON);
        }

        #[test]
        fn prop_in_range_cutoff_unchanged(fs in 10.0f64..1e6, ratio in 0.01f64..0.49) {
            let cutoff = fs * ratio;
            prop_assert_eq!(clamp_cutoff(cutoff, fs), cutoff);
        }
    }
}
