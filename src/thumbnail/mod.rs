//! Preview images for archive items.
//!
//! - `generator`: turns a file into a small raster preview, delegating to the
//!   host or to a document/video renderer.
//! - `cache`: the two-tier, single-flight cache in front of the generator.
//! - `renderer`: the capability that rasterizes the first page or frame.

pub mod cache;
pub mod generator;
pub mod renderer;

use crate::core::DocumentType;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

pub use cache::ThumbnailCache;
pub use generator::{RenderingGenerator, ThumbnailGenerator};
pub use renderer::{DocumentRenderer, RenderError};

/// A preview image, held as a data URI. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Thumbnail(Arc<str>);

impl Thumbnail {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(Arc::from(uri.into()))
    }

    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        Self::from_data_uri(format!("data:image/png;base64,{}", B64.encode(bytes)))
    }

    /// The fixed stand-in shown when real generation fails.
    pub fn placeholder(doc_type: DocumentType) -> Self {
        let (label, color) = match doc_type {
            DocumentType::Image => ("IMG", "#4f9d69"),
            DocumentType::Pdf => ("PDF", "#c0392b"),
            DocumentType::Video => ("VID", "#2c6fbb"),
            DocumentType::Other => ("FILE", "#7f8c8d"),
        };
        let svg = format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="96" height="128" "##,
                r##"viewBox="0 0 96 128"><rect width="96" height="128" rx="8" fill="{color}"/>"##,
                r##"<text x="48" y="72" font-family="sans-serif" font-size="22" fill="#ffffff" "##,
                r##"text-anchor="middle">{label}</text></svg>"##,
            ),
            color = color,
            label = label,
        );
        Self::from_data_uri(format!("data:image/svg+xml;base64,{}", B64.encode(svg)))
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder_for(&self, doc_type: DocumentType) -> bool {
        *self == Self::placeholder(doc_type)
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(32).collect();
        f.debug_tuple("Thumbnail")
            .field(&format_args!("{}… ({} bytes)", prefix, self.0.len()))
            .finish()
    }
}

impl Serialize for Thumbnail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
