use crate::osm::{ElementKind, ElementRef};
use thiserror::Error;

/// Failure while turning one element into a shape.
///
/// The first four variants are per-element and subject to the
/// `raise_on_failure` option; `Config` always aborts the conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("{parent} references {kind}/{id}, which is not in the input")]
    MissingReference {
        parent: ElementRef,
        kind: ElementKind,
        id: i64,
    },

    #[error("{element}: ring built from ways {way_ids:?} does not close")]
    UnclosedRing {
        element: ElementRef,
        way_ids: Vec<i64>,
    },

    #[error("{element}: invalid geometry: {reason}")]
    InvalidGeometry { element: ElementRef, reason: String },

    #[error("{element}: unsupported element: {reason}")]
    UnsupportedElement { element: ElementRef, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConversionError {
    /// The element the failure was detected on, if any.
    pub fn element(&self) -> Option<ElementRef> {
        match self {
            ConversionError::MissingReference { parent, .. } => Some(*parent),
            ConversionError::UnclosedRing { element, .. }
            | ConversionError::InvalidGeometry { element, .. }
            | ConversionError::UnsupportedElement { element, .. } => Some(*element),
            ConversionError::Config(_) => None,
        }
    }
}

/// Bad rule or area-key table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("polygon rule for key '{0}' is defined more than once")]
    DuplicateRule(String),
}
