//! The thumbnail generation adapter.
//!
//! Given a path and its declared type, produces a small preview. Images and
//! unknown types are previewed by the host; PDFs and videos are rasterized by
//! a `DocumentRenderer` and encoded here. The adapter never touches
//! navigation or listing state.

use super::renderer::{DocumentRenderer, RenderError};
use super::Thumbnail;
use crate::core::{DocumentType, EngineError};
use crate::host::FileService;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    async fn generate(&self, path: &Path, doc_type: DocumentType) -> Result<Thumbnail, EngineError>;
}

pub struct RenderingGenerator {
    service: Arc<dyn FileService>,
    renderer: Arc<dyn DocumentRenderer>,
    max_edge: u32,
}

impl RenderingGenerator {
    pub fn new(
        service: Arc<dyn FileService>,
        renderer: Arc<dyn DocumentRenderer>,
        max_edge: u32,
    ) -> Self {
        Self {
            service,
            renderer,
            max_edge,
        }
    }

    async fn render(&self, path: &Path, doc_type: DocumentType) -> Result<Thumbnail, RenderError> {
        match doc_type {
            DocumentType::Pdf => {
                let raster = self.renderer.render_first_page(path, self.max_edge).await?;
                encode_raster(raster, self.max_edge).await
            }
            DocumentType::Video => {
                let raster = self.renderer.capture_first_frame(path, self.max_edge).await?;
                encode_raster(raster, self.max_edge).await
            }
            DocumentType::Image | DocumentType::Other => {
                Ok(self.service.get_file_thumbnail(path).await?)
            }
        }
    }
}

#[async_trait]
impl ThumbnailGenerator for RenderingGenerator {
    async fn generate(
        &self,
        path: &Path,
        doc_type: DocumentType,
    ) -> Result<Thumbnail, EngineError> {
        tracing::debug!("Generating {} thumbnail for {:?}", doc_type.as_str(), path);
        self.render(path, doc_type)
            .await
            .map_err(|e| EngineError::Generation {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Downscales and PNG-encodes a raster on the blocking pool.
///
/// The raster is moved into the task and dropped there as soon as the
/// encoded bytes exist, so only the small PNG outlives this call.
pub async fn encode_raster(raster: DynamicImage, max_edge: u32) -> Result<Thumbnail, RenderError> {
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, image::ImageError> {
        let preview = if raster.width() > max_edge || raster.height() > max_edge {
            raster.thumbnail(max_edge, max_edge)
        } else {
            raster
        };
        let mut buffer = Vec::new();
        preview.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    })
    .await??;
    Ok(Thumbnail::from_png_bytes(&bytes))
}
