//! Signal Framing

use crate::error::FeatureError;

/// A fixed-length analysis window copied out of a signal
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position in the frame sequence
    pub index: usize,
    /// Offset of the first sample in the source signal
    pub start: usize,
    samples: Vec<f64>,
}

impl Frame {
    /// Frame samples, always `frame_size` long
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Number of frames produced for a signal of `len` samples
///
/// Signals shorter than a frame are padded to exactly one frame; samples
/// after the last full frame are dropped.
pub fn frame_count(len: usize, frame_size: usize, hop_size: usize) -> usize {
    if hop_size == 0 || frame_size == 0 {
        return 0;
    }
    1 + len.max(frame_size).saturating_sub(frame_size) / hop_size
}

/// Slice `signal` into frames of `frame_size` samples every `hop_size` samples
pub fn frame_signal(
    signal: &[f64],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Frame>, FeatureError> {
    if frame_size == 0 {
        return Err(FeatureError::InvalidInput(
            "frame size must be greater than zero".to_string(),
        ));
    }
    if hop_size == 0 {
        return Err(FeatureError::InvalidInput(
            "hop size must be greater than zero".to_string(),
        ));
    }

    let padded;
    let source = if signal.len() < frame_size {
        let mut buf = signal.to_vec();
        buf.resize(frame_size, 0.0);
        padded = buf;
        &padded[..]
    } else {
        signal
    };

    let frames = (0..frame_count(source.len(), frame_size, hop_size))
        .map(|index| {
            let start = index * hop_size;
            Frame {
                index,
                start,
                samples: source[start..start + frame_size].to_vec(),
            }
        })
        .collect();
    Ok(frames)
}
