//! Feature Vector Schema
//!
//! Downstream consumers (the training collator and generated on-device
//! classifiers) index features by position, so field order here is part of
//! the external contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Number of features in the full training vector
pub const FEATURE_DIMENSION: usize = 7;

/// Number of features in the on-device projection
pub const ON_DEVICE_FEATURE_DIMENSION: usize = 5;

/// Full per-frame feature vector used for training
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Root mean square amplitude
    pub rms: f64,
    /// Zero-crossing rate
    pub zcr: f64,
    /// Spectral centroid (Hz)
    pub centroid: f64,
    /// Energy in 20-250 Hz
    pub band_energy_low: f64,
    /// Energy in 250-2000 Hz
    pub band_energy_mid: f64,
    /// Energy in 2000 Hz - Nyquist
    pub band_energy_high: f64,
    /// Peak-to-median spectral power ratio (dB)
    pub snr: f64,
}

impl FeatureVector {
    /// Field names in positional order
    pub const FIELD_NAMES: [&'static str; FEATURE_DIMENSION] = [
        "rms",
        "zcr",
        "centroid",
        "band_energy_low",
        "band_energy_mid",
        "band_energy_high",
        "snr",
    ];

    /// Values in positional order
    pub fn to_array(&self) -> [f64; FEATURE_DIMENSION] {
        [
            self.rms,
            self.zcr,
            self.centroid,
            self.band_energy_low,
            self.band_energy_mid,
            self.band_energy_high,
            self.snr,
        ]
    }

    /// Rebuild a vector from positional values
    pub fn from_array(values: [f64; FEATURE_DIMENSION]) -> Self {
        let [rms, zcr, centroid, band_energy_low, band_energy_mid, band_energy_high, snr] = values;
        Self {
            rms,
            zcr,
            centroid,
            band_energy_low,
            band_energy_mid,
            band_energy_high,
            snr,
        }
    }

    /// Project onto the on-device schema by copying the shared fields
    pub fn on_device(&self) -> OnDeviceFeatureVector {
        OnDeviceFeatureVector {
            rms: self.rms,
            zcr: self.zcr,
            band_energy_low: self.band_energy_low,
            band_energy_mid: self.band_energy_mid,
            band_energy_high: self.band_energy_high,
        }
    }
}

/// Reduced feature vector matching the on-device classifier input
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OnDeviceFeatureVector {
    pub rms: f64,
    pub zcr: f64,
    pub band_energy_low: f64,
    pub band_energy_mid: f64,
    pub band_energy_high: f64,
}

impl OnDeviceFeatureVector {
    /// Field names in positional order
    pub const FIELD_NAMES: [&'static str; ON_DEVICE_FEATURE_DIMENSION] = [
        "rms",
        "zcr",
        "band_energy_low",
        "band_energy_mid",
        "band_energy_high",
    ];

    /// Values in positional order
    pub fn to_array(&self) -> [f64; ON_DEVICE_FEATURE_DIMENSION] {
        [
            self.rms,
            self.zcr,
            self.band_energy_low,
            self.band_energy_mid,
            self.band_energy_high,
        ]
    }
}

impl From<&FeatureVector> for OnDeviceFeatureVector {
    fn from(full: &FeatureVector) -> Self {
        full.on_device()
    }
}

/// Which feature schema a consumer expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSchema {
    /// All seven training features
    #[default]
    Full,
    /// The five features computed on the device
    OnDevice,
}

impl FeatureSchema {
    /// Ordered field names for this schema
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            FeatureSchema::Full => &FeatureVector::FIELD_NAMES,
            FeatureSchema::OnDevice => &OnDeviceFeatureVector::FIELD_NAMES,
        }
    }

    /// Number of fields in this schema
    pub fn dimension(&self) -> usize {
        self.field_names().len()
    }

    /// Positional values of `vector` under this schema
    pub fn project(&self, vector: &FeatureVector) -> Vec<f64> {
        match self {
            FeatureSchema::Full => vector.to_array().to_vec(),
            FeatureSchema::OnDevice => vector.on_device().to_array().to_vec(),
        }
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSchema::Full => write!(f, "full"),
            FeatureSchema::OnDevice => write!(f, "on-device"),
        }
    }
}

impl FromStr for FeatureSchema {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(FeatureSchema::Full),
            "on-device" | "ondevice" => Ok(FeatureSchema::OnDevice),
            other => Err(FeatureError::Configuration(format!(
                "unknown feature schema '{other}' (expected 'full' or 'on-device')"
            ))),
        }
    }
}

/// Per-frame feature vectors of one recording, in frame order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    vectors: Vec<FeatureVector>,
}

impl FeatureSet {
    pub fn new(vectors: Vec<FeatureVector>) -> Self {
        Self { vectors }
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureVector> {
        self.vectors.iter()
    }

    /// On-device projection of every frame
    pub fn on_device(&self) -> Vec<OnDeviceFeatureVector> {
        self.vectors.iter().map(FeatureVector::on_device).collect()
    }

    /// Positional rows under `schema`
    pub fn rows(&self, schema: FeatureSchema) -> Vec<Vec<f64>> {
        self.vectors.iter().map(|v| schema.project(v)).collect()
    }

    /// Element-wise mean over frames, the per-recording training example
    pub fn mean(&self) -> Option<FeatureVector> {
        if self.vectors.is_empty() {
            return None;
        }
        let mut sums = [0.0; FEATURE_DIMENSION];
        for vector in &self.vectors {
            for (sum, value) in sums.iter_mut().zip(vector.to_array()) {
                *sum += value;
            }
        }
        let n = self.vectors.len() as f64;
        Some(FeatureVector::from_array(sums.map(|s| s / n)))
    }
}

impl IntoIterator for FeatureSet {
    type Item = FeatureVector;
    type IntoIter = std::vec::IntoIter<FeatureVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a FeatureVector;
    type IntoIter = std::slice::Iter<'a, FeatureVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}
