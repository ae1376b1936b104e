//! Filter Error Types

use thiserror::Error;

/// Errors during filter design
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Design parameters that no filter can be built from
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FilterError {
    pub(crate) fn invalid_sample_rate(fs: f64) -> Self {
        FilterError::Configuration(format!("sample rate must be positive and finite, got {fs}"))
    }
}
