pub mod settings;

use crate::core::DocumentType;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Longest edge, in pixels, of generated thumbnails.
    pub thumbnail_size: u32,
    /// Document types whose thumbnails are kept in the host's persistent store.
    pub persisted_types: Vec<DocumentType>,
    /// Name prefix of archive bookkeeping entries hidden from listings.
    pub hidden_prefix: String,
    pub last_case: Option<PathBuf>,
    pub auto_open_last_case: bool,
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    pub fn is_persisted(&self, doc_type: DocumentType) -> bool {
        self.persisted_types.contains(&doc_type)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 256,
            persisted_types: vec![DocumentType::Pdf],
            hidden_prefix: ".".to_string(),
            last_case: None,
            auto_open_last_case: false,
        }
    }
}
