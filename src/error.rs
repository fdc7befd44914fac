// Error types for dataset decoding and label parsing

use thiserror::Error;

/// Typed failures raised while turning stored frames and label tables into samples
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Malformed data URL: missing ',' separator")]
    MalformedDataUrl,

    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decoding error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Label parse error on line {line}: {message}")]
    Label { line: u64, message: String },

    #[error("Batch index {index} out of range (generator has {len} batches)")]
    BatchOutOfRange { index: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dataset operations
pub type Result<T> = std::result::Result<T, DatasetError>;
