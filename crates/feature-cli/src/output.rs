//! JSON-lines records written to stdout.

use std::io::Write;

use feature_engine::{FeatureSchema, FeatureSet, FeatureVector, OnDeviceFeatureVector};
use serde::Serialize;

/// Feature values under the requested schema, serialized in field order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaVector {
    Full(FeatureVector),
    OnDevice(OnDeviceFeatureVector),
}

impl SchemaVector {
    pub fn project(schema: FeatureSchema, vector: &FeatureVector) -> Self {
        match schema {
            FeatureSchema::Full => SchemaVector::Full(*vector),
            FeatureSchema::OnDevice => SchemaVector::OnDevice(vector.on_device()),
        }
    }
}

/// One analysis frame of one recording
#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub source: &'a str,
    pub frame: usize,
    #[serde(flatten)]
    pub features: SchemaVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral_flux: Option<f64>,
}

/// Per-recording mean over all frames
#[derive(Debug, Serialize)]
pub struct SummaryRecord<'a> {
    pub source: &'a str,
    pub frames: usize,
    #[serde(flatten)]
    pub features: SchemaVector,
}

/// Write one line per frame, with the frame's flux when `flux` is given
pub fn write_frames<W: Write>(
    out: &mut W,
    source: &str,
    set: &FeatureSet,
    schema: FeatureSchema,
    flux: Option<&[f64]>,
) -> anyhow::Result<()> {
    for (frame, vector) in set.iter().enumerate() {
        let record = FrameRecord {
            source,
            frame,
            features: SchemaVector::project(schema, vector),
            spectral_flux: flux.and_then(|values| values.get(frame).copied()),
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the mean vector of a recording; returns false when there were no frames
pub fn write_summary<W: Write>(
    out: &mut W,
    source: &str,
    set: &FeatureSet,
    schema: FeatureSchema,
) -> anyhow::Result<bool> {
    let Some(mean) = set.mean() else {
        return Ok(false);
    };
    let record = SummaryRecord {
        source,
        frames: set.len(),
        features: SchemaVector::project(schema, &mean),
    };
    serde_json::to_writer(&mut *out, &record)?;
    writeln!(out)?;
    Ok(true)
}
