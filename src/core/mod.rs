//! Domain model and pure logic of the archive engine.
//!
//! Nothing in this module talks to the host service; it only describes cases,
//! items and tags, and provides the navigation and search logic that the
//! stateful `app` layer drives.

pub mod error;
pub mod listing;
pub mod navigation;
pub mod search;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{EngineError, HostError};
pub use navigation::Navigator;
pub use search::{DocumentRelations, SearchEngine, SearchFilter};

/// The kind of document a file item holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Image,
    Pdf,
    Video,
    Other,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Image => "image",
            DocumentType::Pdf => "pdf",
            DocumentType::Video => "video",
            DocumentType::Other => "other",
        }
    }
}

/// How a folder came to exist inside a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FolderType {
    /// A folder the user created to organize the case.
    CaseSubfolder,
    /// A folder generated from a source document (e.g. extracted pages).
    ExtractionFolder,
}

/// A top-level container of files and folders, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub path: PathBuf,
    pub name: String,
    pub description: Option<String>,
    pub background_image: Option<String>,
    pub tag_id: Option<String>,
}

impl Case {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            description: None,
            background_image: None,
            tag_id: None,
        }
    }
}

/// A file or folder inside a case.
///
/// File-only attributes (`doc_type`, `thumbnail`, `tag_id`) are `None` for
/// folders, and folder-only attributes (`folder_type`,
/// `parent_document_name`) are `None` for files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub is_folder: bool,
    #[serde(rename = "type")]
    pub doc_type: Option<DocumentType>,
    /// Preview image as a data URI.
    pub thumbnail: Option<String>,
    pub tag_id: Option<String>,
    pub folder_type: Option<FolderType>,
    pub parent_document_name: Option<String>,
}

impl Item {
    pub fn file(path: impl Into<PathBuf>, doc_type: DocumentType) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path),
            path,
            size: 0,
            modified: DateTime::<Utc>::UNIX_EPOCH,
            is_folder: false,
            doc_type: Some(doc_type),
            thumbnail: None,
            tag_id: None,
            folder_type: None,
            parent_document_name: None,
        }
    }

    pub fn folder(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path),
            path,
            size: 0,
            modified: DateTime::<Utc>::UNIX_EPOCH,
            is_folder: true,
            doc_type: None,
            thumbnail: None,
            tag_id: None,
            folder_type: Some(FolderType::CaseSubfolder),
            parent_document_name: None,
        }
    }

    /// An extraction folder linked by name to the document it was derived from.
    pub fn extraction_folder(path: impl Into<PathBuf>, parent_document_name: &str) -> Self {
        Self {
            folder_type: Some(FolderType::ExtractionFolder),
            parent_document_name: Some(parent_document_name.to_string()),
            ..Self::folder(path)
        }
    }

    pub fn with_tag(mut self, tag_id: &str) -> Self {
        self.tag_id = Some(tag_id.to_string());
        self
    }

    pub fn is_pdf(&self) -> bool {
        !self.is_folder && self.doc_type == Some(DocumentType::Pdf)
    }

    /// Moves the item to `new_path`, keeping `name` in sync with the last component.
    pub fn relocate(&mut self, new_path: PathBuf) {
        self.name = file_name_of(&new_path);
        self.path = new_path;
    }
}

/// A colored label attached to cases or files by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTag {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Where a document lives, as reported by a cross-case lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLocation {
    pub case_path: PathBuf,
    pub folder_path: Option<PathBuf>,
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `path` moved from under `from` to the same place under `to`.
///
/// Returns `None` when `path` is not `from` or below it.
pub(crate) fn rebase(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    let rest = path.strip_prefix(from).ok()?;
    if rest.as_os_str().is_empty() {
        Some(to.to_path_buf())
    } else {
        Some(to.join(rest))
    }
}
