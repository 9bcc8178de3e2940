//! Forensic Engine Error Types
//!
//! Only `MalformedImage` and `ConfigurationError` abort a request. Everything
//! else is absorbed by the analyzer that hit it and surfaces as a neutral
//! signal with an attached note.

use crate::error_handler::ErrorCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicError {
    #[error("Malformed image: {0}")]
    MalformedImage(String),

    #[error("Codec failure: {0}")]
    CodecFailure(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl ForensicError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForensicError::MalformedImage(_)
            | ForensicError::ConfigurationError(_)
            | ForensicError::IoError(_) => ErrorCategory::Fatal,

            ForensicError::CodecFailure(_) | ForensicError::ImageError(_) => {
                ErrorCategory::Recoverable
            }

            ForensicError::UnsupportedContentType(_) => ErrorCategory::Optional,
        }
    }

    /// Request-level errors: no partial result may be produced.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Fatal
    }
}

pub type Result<T> = std::result::Result<T, ForensicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(ForensicError::MalformedImage("0x0".into()).is_fatal());
        assert!(ForensicError::ConfigurationError("sum=0".into()).is_fatal());
        assert!(!ForensicError::CodecFailure("jpeg".into()).is_fatal());
        assert!(!ForensicError::UnsupportedContentType("audio".into()).is_fatal());
    }

    #[test]
    fn test_display_messages() {
        let err = ForensicError::CodecFailure("encoder rejected buffer".into());
        assert_eq!(err.to_string(), "Codec failure: encoder rejected buffer");
    }
}
