//! Perceptual Comparator
//!
//! Similarity between a subject artifact and a reference (archive) artifact:
//! - `score`: overall similarity in [0, 1]
//! - `variant_score`: how much the differences look like a derived variant
//! - `alteration_score`: how much of the content was changed
//!
//! Images and texts have comparators; audio is recognised but only yields a
//! neutral placeholder. Mismatched pairings score 0 with an explanation.

pub mod text;
pub mod visual;

use crate::error_handler::handle_error;
use crate::errors::{ForensicError, Result};
use crate::raster::RasterImage;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use text::compare_texts;
pub use visual::compare_images;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Text,
    Audio,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Image => write!(f, "image"),
            ContentType::Text => write!(f, "text"),
            ContentType::Audio => write!(f, "audio"),
        }
    }
}

/// Decoded content handed over by the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Image(RasterImage),
    Text(String),
    /// Opaque encoded audio; no comparator reads it yet.
    Audio(Vec<u8>),
}

impl Artifact {
    pub fn content_type(&self) -> ContentType {
        match self {
            Artifact::Image(_) => ContentType::Image,
            Artifact::Text(_) => ContentType::Text,
            Artifact::Audio(_) => ContentType::Audio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub score: f64,
    pub variant_score: f64,
    pub alteration_score: f64,
    /// Image only: mean per-pixel `1 - |diff| / 255`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssim_score: Option<f64>,
    /// Image only: normalized absolute-difference similarity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ComparisonResult {
    pub fn new(score: f64, variant_score: f64, alteration_score: f64) -> Self {
        Self {
            score,
            variant_score,
            alteration_score,
            ssim_score: None,
            similarity_score: None,
            note: None,
        }
    }

    pub fn audio_placeholder() -> Self {
        Self {
            note: Some("audio comparison not implemented".to_string()),
            ..Self::new(0.5, 0.0, 0.0)
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            note: Some(reason.into()),
            ..Self::new(0.0, 0.0, 0.0)
        }
    }
}

/// Compare two artifacts as `content_type`. Both artifacts must be of that
/// type; any other pairing is reported in the result, not as an error.
pub fn compare(a: &Artifact, b: &Artifact, content_type: ContentType) -> Result<ComparisonResult> {
    match (content_type, a, b) {
        (ContentType::Image, Artifact::Image(a), Artifact::Image(b)) => compare_images(a, b),
        (ContentType::Text, Artifact::Text(a), Artifact::Text(b)) => Ok(compare_texts(a, b)),
        (ContentType::Audio, Artifact::Audio(_), Artifact::Audio(_)) => {
            Ok(ComparisonResult::audio_placeholder())
        }
        _ => {
            let error = ForensicError::UnsupportedContentType(format!(
                "no {} comparator for {} vs {}",
                content_type,
                a.content_type(),
                b.content_type()
            ));
            let note = error.to_string();
            handle_error(error.category(), "Perceptual comparison", error);
            Ok(ComparisonResult::unsupported(note))
        }
    }
}
