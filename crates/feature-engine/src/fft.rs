//! FFT-based Frequency Analysis

use rustfft::{num_complex::Complex, FftPlanner};
use tracing::trace;

/// Returned by [`Spectrum::snr`] when the median bin power is zero but the
/// spectrum is not silent
pub const SNR_CEILING_DB: f64 = 120.0;

/// Bins on each side of the peak counted as signal by [`Spectrum::snr`]
const SNR_PEAK_HALF_WIDTH: usize = 2;

/// Frequency band definitions (Hz, inclusive at both ends)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBands {
    /// Low frequency band (20-250 Hz)
    pub low: (f64, f64),
    /// Mid frequency band (250-2000 Hz)
    pub mid: (f64, f64),
    /// High frequency band (2000 Hz - Nyquist)
    pub high: (f64, f64),
}

impl FrequencyBands {
    /// Standard bands, with the high band running up to `fs / 2`
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self {
            low: (20.0, 250.0),
            mid: (250.0, 2000.0),
            high: (2000.0, sample_rate / 2.0),
        }
    }
}

/// One-sided magnitude spectrum of a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
}

impl Spectrum {
    /// Pair bin frequencies with magnitudes
    ///
    /// Extra entries on the longer side are dropped so both stay index-aligned.
    pub fn new(mut frequencies: Vec<f64>, mut magnitudes: Vec<f64>) -> Self {
        let len = frequencies.len().min(magnitudes.len());
        frequencies.truncate(len);
        magnitudes.truncate(len);
        Self {
            frequencies,
            magnitudes,
        }
    }

    /// Bin centre frequencies (Hz)
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Bin magnitudes
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Magnitude-weighted mean frequency, 0 for a silent spectrum
    pub fn centroid(&self) -> f64 {
        let magnitude_sum: f64 = self.magnitudes.iter().sum();
        if magnitude_sum == 0.0 {
            return 0.0;
        }
        let weighted_sum: f64 = self
            .frequencies
            .iter()
            .zip(&self.magnitudes)
            .map(|(f, m)| f * m)
            .sum();
        weighted_sum / magnitude_sum
    }

    /// Sum of squared magnitudes for bins with `f_low <= freq <= f_high`
    pub fn band_energy(&self, f_low: f64, f_high: f64) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .filter(|(f, _)| **f >= f_low && **f <= f_high)
            .map(|(_, m)| m * m)
            .sum()
    }

    /// Peak-neighbourhood power over median bin power, in dB
    ///
    /// Signal power is the power summed over the peak bin and up to two bins
    /// either side; noise power is the median bin power. Returns 0 for a
    /// silent spectrum and [`SNR_CEILING_DB`] when the median is zero.
    pub fn snr(&self) -> f64 {
        let power: Vec<f64> = self.magnitudes.iter().map(|m| m * m).collect();
        let total: f64 = power.iter().sum();
        if total == 0.0 {
            return 0.0;
        }

        let mut peak = 0;
        for (i, &p) in power.iter().enumerate() {
            if p > power[peak] {
                peak = i;
            }
        }
        let lo = peak.saturating_sub(SNR_PEAK_HALF_WIDTH);
        let hi = (peak + SNR_PEAK_HALF_WIDTH).min(power.len() - 1);
        let signal_power: f64 = power[lo..=hi].iter().sum();

        let noise_power = median(&power);
        if noise_power <= 0.0 {
            return SNR_CEILING_DB;
        }
        10.0 * (signal_power / noise_power).log10()
    }
}

/// Positive spectral change between consecutive frames
///
/// Sums bin-by-bin magnitude increases from `previous` to `current` over the
/// bins both spectra share. This is the firmware's onset measure; it is not
/// part of either feature schema. [`FeaturePipeline::onset_flux`] applies it
/// across the frames of a recording.
///
/// [`FeaturePipeline::onset_flux`]: crate::FeaturePipeline::onset_flux
pub fn spectral_flux(previous: &Spectrum, current: &Spectrum) -> f64 {
    previous
        .magnitudes
        .iter()
        .zip(&current.magnitudes)
        .map(|(p, c)| (c - p).max(0.0))
        .sum()
}

/// Symmetric Hann window (`[1.0]` for a single sample)
pub fn hann_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = n.saturating_sub(1) as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos())
        .collect()
}

/// Middle value of a set, mean of the two middle values for even counts
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        0.5 * (sorted[mid - 1] + sorted[mid])
    }
}

/// FFT analyzer producing normalized one-sided spectra
///
/// Holds a planner and the last window so repeated frames of one size reuse
/// both. Not shared between threads; each worker builds its own.
pub struct SpectralAnalyzer {
    /// FFT planner for efficient computation
    planner: FftPlanner<f64>,
    /// Cached window and its sum, keyed by frame length
    window: Option<(usize, Vec<f64>, f64)>,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer {
    /// Create a new spectral analyzer
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            window: None,
        }
    }

    /// Hann-windowed magnitude spectrum of `frame` for bins `k = 0..=N/2`
    ///
    /// Magnitudes are divided by half the window sum so a full-scale sine on a
    /// bin centre reads close to its amplitude. Bin `k` sits at `k * fs / N`.
    pub fn spectrum(&mut self, frame: &[f64], sample_rate: f64) -> Spectrum {
        let n = frame.len();
        if n == 0 {
            return Spectrum::default();
        }

        let (window, window_sum) = self.window_for(n);
        let scale = window_sum / 2.0;

        let mut buffer: Vec<Complex<f64>> = frame
            .iter()
            .zip(window)
            .map(|(&x, &w)| Complex::new(x * w, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let bins = n / 2 + 1;
        let magnitudes = buffer.iter().take(bins).map(|c| c.norm() / scale).collect();
        let frequencies = (0..bins)
            .map(|k| k as f64 * sample_rate / n as f64)
            .collect();

        trace!("Spectrum computed: n={}, bins={}", n, bins);
        Spectrum::new(frequencies, magnitudes)
    }

    fn window_for(&mut self, n: usize) -> (&[f64], f64) {
        if matches!(&self.window, Some((len, _, _)) if *len != n) {
            self.window = None;
        }
        let (_, window, sum) = self.window.get_or_insert_with(|| {
            let window = hann_window(n);
            let sum: f64 = window.iter().sum();
            (n, window, sum)
        });
        (window.as_slice(), *sum)
    }
}
