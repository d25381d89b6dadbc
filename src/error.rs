//! Error types for the tamper detector.

use std::fmt;

/// Which side of a comparison an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Reference,
    Uploaded,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Reference => f.write_str("reference"),
            ImageRole::Uploaded => f.write_str("uploaded"),
        }
    }
}

/// Errors raised while loading and comparing images.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The reference image is not provisioned. This is a deployment problem,
    /// never a tampering signal.
    #[error("Reference PAN card image not found.")]
    ReferenceMissing,

    #[error("The {role} image is empty.")]
    EmptyImage { role: ImageRole },

    #[error("Failed to decode the {role} image: {source}")]
    Decode {
        role: ImageRole,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "Image dimensions do not match: reference is {reference_width}x{reference_height}, \
         upload is {uploaded_width}x{uploaded_height}"
    )]
    DimensionMismatch {
        reference_width: u32,
        reference_height: u32,
        uploaded_width: u32,
        uploaded_height: u32,
    },

    #[error("The {role} image is too small ({width}x{height}); minimum is {min}x{min}")]
    ImageTooSmall {
        role: ImageRole,
        width: u32,
        height: u32,
        min: u32,
    },

    #[error("The {role} image is too large ({width}x{height}); maximum is {max}x{max}")]
    ImageTooLarge {
        role: ImageRole,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    /// True when the failure comes from the images being compared rather than
    /// from the deployment or the host.
    pub fn is_processing_error(&self) -> bool {
        matches!(
            self,
            DetectorError::EmptyImage { .. }
                | DetectorError::Decode { .. }
                | DetectorError::DimensionMismatch { .. }
                | DetectorError::ImageTooSmall { .. }
                | DetectorError::ImageTooLarge { .. }
        )
    }
}

/// Result alias for detector operations.
pub type Result<T> = std::result::Result<T, DetectorError>;
