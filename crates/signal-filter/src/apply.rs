//! Filter Application
//!
//! Causal filtering runs a direct form II transposed recursion. Zero-phase
//! filtering runs it forward and backward over a copy of the signal extended
//! at both ends by linear prediction, starting both passes from the
//! steady-state response to the edge sample. The extension covers the
//! filter's settling time so neither pass rings into the signal, and it
//! continues tones smoothly past the edges so no step is introduced there.

use tracing::debug;

use crate::coefficients::FilterCoefficients;

/// How a filter was (or would be) applied to a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Forward-backward, no phase distortion
    ZeroPhase,
    /// Single forward pass
    Causal,
}

/// Tail energy (relative to the total) left when the impulse response counts as settled
const SETTLING_TOLERANCE: f64 = 1e-9;
/// First horizon of the settling search
const SETTLING_BLOCK: usize = 1024;
/// Longest impulse response examined; filters that have not settled by then are padded this much
pub const MAX_EDGE_PADDING: usize = 1 << 20;

/// Highest order of the edge predictor
const PREDICTION_ORDER: usize = 16;
/// Samples nearest each edge used to fit the predictor
const PREDICTION_FIT_LEN: usize = 1 << 14;
/// Prediction error, relative to the signal energy, below which the fit stops adding poles
const PREDICTION_ERROR_FLOOR: f64 = 1e-10;

/// Minimum signal length, exclusive, for zero-phase filtering: `3 * max(len(a), len(b))`
pub fn min_zero_phase_len(coeffs: &FilterCoefficients) -> usize {
    3 * coeffs.num_taps()
}

/// Pick the filtering mode for a signal of `len` samples
///
/// Zero-phase filtering needs more than [`min_zero_phase_len`] samples;
/// shorter signals fall back to a causal pass.
pub fn select_mode(len: usize, coeffs: &FilterCoefficients, zero_phase: bool) -> FilterMode {
    if zero_phase && len > min_zero_phase_len(coeffs) {
        FilterMode::ZeroPhase
    } else {
        FilterMode::Causal
    }
}

/// Filter `samples`, zero-phase when requested and the signal is long enough
pub fn apply(samples: &[f64], coeffs: &FilterCoefficients, zero_phase: bool) -> Vec<f64> {
    match select_mode(samples.len(), coeffs, zero_phase) {
        FilterMode::ZeroPhase => filtfilt(samples, coeffs),
        FilterMode::Causal => {
            if zero_phase {
                debug!(
                    "Signal of {} samples too short for zero-phase filtering (needs > {}), using causal pass",
                    samples.len(),
                    min_zero_phase_len(coeffs)
                );
            }
            let (b, a) = coeffs.normalized();
            lfilter(&b, &a, samples, None)
        }
    }
}

/// Samples predicted onto each end for zero-phase filtering
///
/// At least `3 * max(len(a), len(b))`, extended to the impulse-response
/// settling length and never more than [`MAX_EDGE_PADDING`]. Independent of
/// the signal length.
pub fn edge_padding(coeffs: &FilterCoefficients) -> usize {
    let (b, a) = coeffs.normalized();
    min_zero_phase_len(coeffs).max(settling_len(&b, &a))
}

fn filtfilt(samples: &[f64], coeffs: &FilterCoefficients) -> Vec<f64> {
    let edge = edge_padding(coeffs);
    let (b, a) = coeffs.normalized();
    debug!("Zero-phase filtering {} samples with {} samples of edge padding", samples.len(), edge);
    let zi = steady_state(&b, &a);

    let extended = predictive_extend(samples, edge);
    let x0 = extended.first().copied().unwrap_or(0.0);
    let initial: Vec<f64> = zi.iter().map(|z| z * x0).collect();
    let forward = lfilter(&b, &a, &extended, Some(&initial));

    let y0 = forward.last().copied().unwrap_or(0.0);
    let initial: Vec<f64> = zi.iter().map(|z| z * y0).collect();
    let reversed: Vec<f64> = forward.into_iter().rev().collect();
    let mut output = lfilter(&b, &a, &reversed, Some(&initial));
    output.reverse();

    output.truncate(output.len() - edge);
    output.split_off(edge)
}

/// Direct form II transposed over normalized taps of equal length
fn lfilter(b: &[f64], a: &[f64], input: &[f64], initial: Option<&[f64]>) -> Vec<f64> {
    let order = b.len().saturating_sub(1);
    let mut state = match initial {
        Some(zi) => zi.to_vec(),
        None => vec![0.0; order],
    };

    let mut output = Vec::with_capacity(input.len());
    for &x in input {
        let y = b[0] * x + state.first().copied().unwrap_or(0.0);
        for k in 0..order {
            let carried = if k + 1 < order { state[k + 1] } else { 0.0 };
            state[k] = b[k + 1] * x + carried - a[k + 1] * y;
        }
        output.push(y);
    }
    output
}

/// Samples until the impulse response holds at most `SETTLING_TOLERANCE` of
/// its energy
///
/// The horizon doubles from `SETTLING_BLOCK` until the response settles in
/// the first half of it, so the work tracks the filter, not the signal.
fn settling_len(b: &[f64], a: &[f64]) -> usize {
    let mut horizon = SETTLING_BLOCK;
    loop {
        let mut impulse = vec![0.0; horizon];
        impulse[0] = 1.0;
        let energy: Vec<f64> = lfilter(b, a, &impulse, None)
            .into_iter()
            .map(|h| h * h)
            .collect();

        let settled = settled_index(&energy);
        if settled <= horizon / 2 || horizon >= MAX_EDGE_PADDING {
            return settled.min(MAX_EDGE_PADDING);
        }
        horizon = (horizon * 2).min(MAX_EDGE_PADDING);
    }
}

/// First index whose remaining tail is within tolerance of the total energy
fn settled_index(energy: &[f64]) -> usize {
    let limit = SETTLING_TOLERANCE * energy.iter().sum::<f64>();
    let mut tail = 0.0;
    for (i, e) in energy.iter().enumerate().rev() {
        tail += e;
        if tail > limit {
            return i + 1;
        }
    }
    0
}

/// Filter state after a long run of unit input
fn steady_state(b: &[f64], a: &[f64]) -> Vec<f64> {
    let a_sum: f64 = a.iter().sum();
    let dc_gain = if a_sum != 0.0 {
        b.iter().sum::<f64>() / a_sum
    } else {
        0.0
    };
    (1..b.len())
        .map(|k| (k..b.len()).map(|j| b[j] - a[j] * dc_gain).sum())
        .collect()
}

/// Continue `samples` by `edge` predicted samples before the start and after the end
fn predictive_extend(samples: &[f64], edge: usize) -> Vec<f64> {
    let head: Vec<f64> = samples.iter().take(PREDICTION_FIT_LEN).rev().copied().collect();
    let mut before = predict(&head, edge);
    before.reverse();
    let tail = &samples[samples.len().saturating_sub(PREDICTION_FIT_LEN)..];
    let after = predict(tail, edge);

    let mut extended = Vec::with_capacity(samples.len() + 2 * edge);
    extended.extend(before);
    extended.extend_from_slice(samples);
    extended.extend(after);
    extended
}

/// Run a Burg linear predictor fitted to `history` for `count` samples past its end
fn predict(history: &[f64], count: usize) -> Vec<f64> {
    let coeffs = burg(history, PREDICTION_ORDER.min(history.len() / 2));
    let order = coeffs.len() - 1;

    let mut buffer = Vec::with_capacity(order + count);
    buffer.extend_from_slice(&history[history.len() - order..]);
    for _ in 0..count {
        let n = buffer.len();
        let y: f64 = (1..=order).map(|k| -coeffs[k] * buffer[n - k]).sum();
        buffer.push(y);
    }
    buffer.split_off(order)
}

/// Prediction-error filter `[1, a1, .., ap]` of `x` by Burg's method
///
/// Every reflection coefficient has magnitude at most one, so the predictor
/// never grows without bound. Stops early once the error is negligible.
fn burg(x: &[f64], max_order: usize) -> Vec<f64> {
    let n = x.len();
    let mut forward = x.to_vec();
    let mut backward = x.to_vec();
    let mut coeffs = vec![1.0];
    let mut initial_error = 0.0;

    for m in 0..max_order {
        let mut num = 0.0;
        let mut den = 0.0;
        for i in m + 1..n {
            num += forward[i] * backward[i - 1];
            den += forward[i] * forward[i] + backward[i - 1] * backward[i - 1];
        }
        if m == 0 {
            initial_error = den;
        }
        if !den.is_finite() || den <= PREDICTION_ERROR_FLOOR * initial_error {
            break;
        }
        let k = -2.0 * num / den;

        coeffs.push(0.0);
        let previous = coeffs.clone();
        for j in 1..=m + 1 {
            coeffs[j] = previous[j] + k * previous[m + 1 - j];
        }
        for i in (m + 1..n).rev() {
            let f = forward[i];
            let b = backward[i - 1];
            forward[i] = f + k * b;
            backward[i] = b + k * f;
        }
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{design_highpass, design_lowpass, design_notch};

    fn sine(freq: f64, fs: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_causal_first_order_recursion() {
        // y[n] = x[n] + 0.5 y[n-1]
        let coeffs = FilterCoefficients::new(vec![1.0], vec![1.0, -0.5]).unwrap();
        let out = apply(&[1.0, 0.0, 0.0, 0.0], &coeffs, false);
        assert_eq!(out, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_causal_normalizes_leading_feedback() {
        let coeffs = FilterCoefficients::new(vec![2.0], vec![2.0]).unwrap();
        assert_eq!(apply(&[1.0, -3.0], &coeffs, false), vec![1.0, -3.0]);
    }

    #[test]
    fn test_short_signal_falls_back_to_causal() {
        let coeffs = design_lowpass(1000.0, 8000.0, 4).unwrap();
        // 5 taps -> more than 15 samples needed
        let signal: Vec<f64> = (0..15).map(|i| i as f64).collect();
        assert_eq!(select_mode(signal.len(), &coeffs, true), FilterMode::Causal);
        assert_eq!(apply(&signal, &coeffs, true), apply(&signal, &coeffs, false));
    }

    #[test]
    fn test_mode_selection_threshold() {
        let coeffs = design_highpass(20.0, 16000.0, 2).unwrap();
        assert_eq!(min_zero_phase_len(&coeffs), 9);
        assert_eq!(select_mode(9, &coeffs, true), FilterMode::Causal);
        assert_eq!(select_mode(10, &coeffs, true), FilterMode::ZeroPhase);
        assert_eq!(select_mode(10_000, &coeffs, false), FilterMode::Causal);
    }

    #[test]
    fn test_edge_padding_follows_settling_time() {
        let fs = 16000.0;
        let lowpass = design_lowpass(7200.0, fs, 4).unwrap();
        // Wide lowpass settles quickly
        let short = edge_padding(&lowpass);
        assert!((15..300).contains(&short), "padding {short}");

        // A Q=30 mains notch rings for thousands of samples
        let notch = design_notch(fs, 50.0, 30.0).unwrap();
        let long = edge_padding(&notch);
        assert!(long > 10_000 && long < 30_000, "padding {long}");

        let highpass = design_highpass(20.0, fs, 2).unwrap();
        assert!((500..5000).contains(&edge_padding(&highpass)));
    }

    #[test]
    fn test_edge_padding_bounded_for_undamped_filter() {
        // A pure integrator never settles
        let integrator = FilterCoefficients::new(vec![1.0], vec![1.0, -1.0]).unwrap();
        assert_eq!(edge_padding(&integrator), MAX_EDGE_PADDING);
    }

    #[test]
    fn test_zero_phase_preserves_length() {
        let coeffs = design_lowpass(1000.0, 8000.0, 4).unwrap();
        let signal = sine(100.0, 8000.0, 16);
        assert_eq!(apply(&signal, &coeffs, true).len(), 16);
    }

    #[test]
    fn test_zero_phase_passes_constant_exactly() {
        let coeffs = design_lowpass(500.0, 8000.0, 4).unwrap();
        let signal = vec![0.75; 200];
        for y in apply(&signal, &coeffs, true) {
            assert!((y - 0.75).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_phase_has_no_delay() {
        let fs = 8000.0;
        let coeffs = design_lowpass(1000.0, fs, 4).unwrap();
        let signal = sine(100.0, fs, 4000);
        let out = apply(&signal, &coeffs, true);
        // Away from the edges the passband tone is reproduced in phase
        for i in 500..3500 {
            assert!((out[i] - signal[i]).abs() < 1e-3, "sample {i}");
        }
        // The causal pass lags
        let causal = apply(&signal, &coeffs, false);
        let lag_error: f64 = (500..3500).map(|i| (causal[i] - signal[i]).abs()).fold(0.0, f64::max);
        assert!(lag_error > 1e-2);
    }

    #[test]
    fn test_notch_removes_mains_hum() {
        let fs = 16000.0;
        let coeffs = design_notch(fs, 50.0, 30.0).unwrap();
        let signal = sine(50.0, fs, 16000);
        let out = apply(&signal, &coeffs, true);
        let peak = out.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak < 0.05, "residual hum {peak}");
    }

    #[test]
    fn test_silence_stays_silent() {
        let coeffs = design_highpass(20.0, 16000.0, 2).unwrap();
        let out = apply(&vec![0.0; 1000], &coeffs, true);
        assert!(out.iter().all(|&y| y == 0.0));
    }

    #[test]
    fn test_zero_phase_clean_at_both_edges() {
        // 1 s of 2500 Hz ends mid-cycle; a reflected edge leaves a step there
        let fs = 16000.0;
        let signal: Vec<f64> = sine(2500.0, fs, 16000).iter().map(|x| 0.5 * x).collect();
        for coeffs in [
            design_highpass(20.0, fs, 2).unwrap(),
            design_notch(fs, 50.0, 30.0).unwrap(),
        ] {
            let out = apply(&signal, &coeffs, true);
            for i in (0..1024).chain(16000 - 1024..16000) {
                assert!((out[i] - signal[i]).abs() < 1e-3, "sample {i}");
            }
        }
    }

    #[test]
    fn test_prediction_continues_sinusoid() {
        let fs = 8000.0;
        let phase = 0.3;
        let tone = |i: usize| (2.0 * std::f64::consts::PI * 1234.0 * i as f64 / fs + phase).sin();
        let history: Vec<f64> = (0..2048).map(tone).collect();
        let predicted = predict(&history, 256);
        assert_eq!(predicted.len(), 256);
        for (j, y) in predicted.iter().enumerate() {
            assert!((y - tone(2048 + j)).abs() < 1e-2, "sample {j}");
        }
    }

    #[test]
    fn test_prediction_of_constant_and_silence() {
        assert!(predict(&[0.75; 50], 100).iter().all(|y| (y - 0.75).abs() < 1e-12));
        assert!(predict(&[0.0; 50], 100).iter().all(|&y| y == 0.0));
    }

    #[test]
    fn test_extension_surrounds_signal() {
        let samples: Vec<f64> = (0..40).map(|i| (i as f64 * 0.3).sin()).collect();
        let extended = predictive_extend(&samples, 25);
        assert_eq!(extended.len(), 40 + 50);
        assert_eq!(&extended[25..65], samples.as_slice());
    }

    #[test]
    fn test_burg_recovers_resonator() {
        // x[n] = 2cos(w) x[n-1] - x[n-2]
        let w = 0.4f64;
        let x: Vec<f64> = (0..512).map(|i| (w * i as f64).cos()).collect();
        let coeffs = burg(&x, 2);
        assert_eq!(coeffs.len(), 3);
        assert!((coeffs[1] + 2.0 * w.cos()).abs() < 1e-3);
        assert!((coeffs[2] - 1.0).abs() < 1e-3);

        assert_eq!(burg(&[0.75; 50], 16), vec![1.0, -1.0]);
        assert_eq!(burg(&[0.0; 50], 16), vec![1.0]);
    }
}
