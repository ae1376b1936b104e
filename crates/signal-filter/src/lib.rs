//! Signal Conditioning Filters
//!
//! Provides Butterworth highpass/lowpass and notch IIR design, and applies
//! designed filters either zero-phase (forward-backward) or causally.

mod apply;
mod coefficients;
mod design;
mod error;

pub use apply::{
    apply, edge_padding, min_zero_phase_len, select_mode, FilterMode, MAX_EDGE_PADDING,
};
pub use coefficients::FilterCoefficients;
pub use design::{clamp_cutoff, design_highpass, design_lowpass, design_notch, CUTOFF_EPSILON};
pub use error::FilterError;
