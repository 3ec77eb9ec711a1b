//! Error types for spectrogram computation and rendering.

use thiserror::Error;

/// Result type for spectrogram operations
pub type Result<T> = std::result::Result<T, SpectrogramError>;

/// Errors raised synchronously by the transform and lookup stages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrogramError {
    /// Window size, overlap factor or hop outside the accepted range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Normalization requested without both bounds
    #[error("can't normalize without data min and data max")]
    MissingBounds,

    /// Sample buffer or window weights don't fit the requested window
    #[error("malformed sample input: {0}")]
    MalformedSampleInput(String),

    /// The pixel buffer could not be materialized
    #[error("could not create image: {0}")]
    ImageConstruction(String),

    /// No colormap registered under the requested name
    #[error("unknown colormap '{0}'")]
    UnknownColormap(String),
}
