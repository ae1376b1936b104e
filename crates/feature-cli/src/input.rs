//! Recording readers: WAV through hound, or plain text with one sample per line.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use feature_engine::{FeatureError, SignalBuffer};
use hound::{SampleFormat, WavReader};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a recording
#[derive(Debug, Error)]
pub enum InputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    #[error("line {line}: '{value}' is not a sample value")]
    Parse { line: usize, value: String },

    #[error("text input needs --sample-rate")]
    MissingSampleRate,

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Read a recording, choosing the decoder from the file extension
pub fn read_recording(path: &Path, sample_rate: Option<f64>) -> Result<SignalBuffer, InputError> {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    let signal = if is_wav {
        read_wav(BufReader::new(File::open(path)?))?
    } else {
        let sample_rate = sample_rate.ok_or(InputError::MissingSampleRate)?;
        read_text(BufReader::new(File::open(path)?), sample_rate)?
    };

    debug!(
        path = %path.display(),
        samples = signal.len(),
        sample_rate = signal.sample_rate(),
        "recording loaded"
    );
    Ok(signal)
}

/// Decode the first channel of a WAV stream into full-scale floats
pub fn read_wav<R: Read>(reader: R) -> Result<SignalBuffer, InputError> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .map(|s| s.map(f64::from))
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f64;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| f64::from(v) / full_scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(SignalBuffer::new(samples, f64::from(spec.sample_rate))?)
}

/// Parse one sample per line; blank lines and `#` comments are skipped
pub fn read_text<R: BufRead>(reader: R, sample_rate: f64) -> Result<SignalBuffer, InputError> {
    let mut samples = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let value = line.trim();
        if value.is_empty() || value.starts_with('#') {
            continue;
        }
        let sample = value.parse::<f64>().map_err(|_| InputError::Parse {
            line: index + 1,
            value: value.to_string(),
        })?;
        samples.push(sample);
    }
    Ok(SignalBuffer::new(samples, sample_rate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn wav_bytes(spec: WavSpec, write: impl FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_wav_int16_scaled_to_full_scale() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            for s in [0_i16, 16384, -32768, 32767] {
                w.write_sample(s).unwrap();
            }
        });
        let signal = read_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(signal.sample_rate(), 8000.0);
        assert_eq!(signal.samples()[..3], [0.0, 0.5, -1.0]);
        assert!(signal.samples()[3] < 1.0);
    }

    #[test]
    fn test_wav_takes_first_channel() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            for (left, right) in [(0.25_f32, -1.0_f32), (-0.5, 1.0), (0.125, 0.0)] {
                w.write_sample(left).unwrap();
                w.write_sample(right).unwrap();
            }
        });
        let signal = read_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(signal.samples(), &[0.25, -0.5, 0.125]);
    }

    #[test]
    fn test_wav_garbage_rejected() {
        assert!(matches!(
            read_wav(Cursor::new(b"not a wav file".to_vec())),
            Err(InputError::Wav(_))
        ));
    }

    #[test]
    fn test_text_samples() {
        let text = "# recorded at the gate\n0.5\n\n-0.25\n 1e-3 \n";
        let signal = read_text(Cursor::new(text), 16000.0).unwrap();
        assert_eq!(signal.samples(), &[0.5, -0.25, 1e-3]);
        assert_eq!(signal.sample_rate(), 16000.0);
    }

    #[test]
    fn test_text_parse_error_reports_line() {
        let err = read_text(Cursor::new("0.1\nloud\n"), 8000.0).unwrap_err();
        match err {
            InputError::Parse { line, value } => {
                assert_eq!(line, 2);
                assert_eq!(value, "loud");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_text_invalid_sample_rate() {
        assert!(matches!(
            read_text(Cursor::new("0.1\n"), 0.0),
            Err(InputError::Feature(FeatureError::Configuration(_)))
        ));
    }

    #[test]
    fn test_text_needs_sample_rate() {
        let path = Path::new("recording.txt");
        assert!(matches!(
            read_recording(path, None),
            Err(InputError::MissingSampleRate)
        ));
    }
}
