//! Feature Extraction Error Types

use signal_filter::FilterError;
use thiserror::Error;

/// Errors during conditioning, framing or feature computation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Invalid sample rate, frame size, hop size or filter parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input whose shape a feature is undefined for
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<FilterError> for FeatureError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Configuration(msg) => FeatureError::Configuration(msg),
        }
    }
}
