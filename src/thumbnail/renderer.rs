//! The rasterizing capability used for documents the host does not preview.

use crate::core::{DocumentType, HostError};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No renderer for {0:?} documents")]
    Unsupported(DocumentType),

    #[error("Failed to decode document: {0}")]
    Decode(String),

    #[error("Failed to encode preview: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Rasterizes the first page of a document or the first frame of a video.
///
/// Implementations decode nothing beyond the first page or frame and must
/// close the document/page handles and free the render surface before they
/// return, so memory never grows with document size.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_first_page(
        &self,
        path: &Path,
        max_edge: u32,
    ) -> Result<DynamicImage, RenderError>;

    async fn capture_first_frame(
        &self,
        path: &Path,
        max_edge: u32,
    ) -> Result<DynamicImage, RenderError>;
}

/// A renderer for setups without document or video decoding.
pub struct NoopRenderer;

#[async_trait]
impl DocumentRenderer for NoopRenderer {
    async fn render_first_page(
        &self,
        _path: &Path,
        _max_edge: u32,
    ) -> Result<DynamicImage, RenderError> {
        Err(RenderError::Unsupported(DocumentType::Pdf))
    }

    async fn capture_first_frame(
        &self,
        _path: &Path,
        _max_edge: u32,
    ) -> Result<DynamicImage, RenderError> {
        Err(RenderError::Unsupported(DocumentType::Video))
    }
}
