//! Unified Error Handler Module
//!
//! ## Error categories
//! - Recoverable: the analyzer degrades to a neutral signal and the request continues
//! - Fatal: the request is aborted before any partial result is produced
//! - Optional: informational, e.g. a comparator that does not exist for a content type
//!
//! The core never prints; everything goes through `tracing`. Callers decide
//! how loud to be.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Recoverable,
    Fatal,
    Optional,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Recoverable => write!(f, "RECOVERABLE"),
            ErrorCategory::Fatal => write!(f, "FATAL"),
            ErrorCategory::Optional => write!(f, "OPTIONAL"),
        }
    }
}

#[derive(Debug)]
pub enum ErrorAction {
    Continue,
    Abort(anyhow::Error),
}

pub fn handle_error<E: std::error::Error + Send + Sync + 'static>(
    category: ErrorCategory,
    context: &str,
    error: E,
) -> ErrorAction {
    match category {
        ErrorCategory::Recoverable => {
            tracing::warn!(%category, context, error = %error, "continuing with neutral fallback");
            ErrorAction::Continue
        }
        ErrorCategory::Fatal => {
            tracing::error!(%category, context, error = %error, "operation aborted");
            ErrorAction::Abort(anyhow::anyhow!("{}: {}", context, error))
        }
        ErrorCategory::Optional => {
            tracing::info!(%category, context, error = %error, "non-critical, continuing");
            ErrorAction::Continue
        }
    }
}

/// Log an error and its full `source()` chain.
pub fn report_error<E: std::error::Error + ?Sized>(error: &E) {
    tracing::error!("Error occurred: {}", error);

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        tracing::error!("  Caused by (level {}): {}", level, err);
        source = err.source();
        level += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ForensicError;

    #[test]
    fn test_recoverable_error_continues() {
        let error = ForensicError::CodecFailure("jpeg encoder rejected buffer".into());
        let action = handle_error(error.category(), "ELA re-encode", error);
        assert!(matches!(action, ErrorAction::Continue));
    }

    #[test]
    fn test_fatal_error_aborts() {
        let error = ForensicError::MalformedImage("width is 0".into());
        let action = handle_error(error.category(), "Loading raster", error);
        match action {
            ErrorAction::Abort(e) => assert!(e.to_string().contains("Loading raster")),
            ErrorAction::Continue => panic!("malformed image must abort"),
        }
    }

    #[test]
    fn test_optional_error_continues() {
        let error = ForensicError::UnsupportedContentType("audio".into());
        let action = handle_error(error.category(), "Comparing artifacts", error);
        assert!(matches!(action, ErrorAction::Continue));
    }

    #[test]
    fn test_report_error_chain() {
        let outer: Box<dyn std::error::Error> =
            Box::new(ForensicError::IoError(std::io::Error::other("disk full")));
        report_error(outer.as_ref());
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(format!("{}", ErrorCategory::Recoverable), "RECOVERABLE");
        assert_eq!(format!("{}", ErrorCategory::Fatal), "FATAL");
        assert_eq!(format!("{}", ErrorCategory::Optional), "OPTIONAL");
    }
}
