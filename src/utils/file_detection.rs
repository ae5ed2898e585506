use crate::core::DocumentType;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "svg",
    "tiff", "tif", "raw", "cr2", "nef", "orf", "dng",
    "heic", "heif", "avif", "jfif",
];

const PDF_EXTENSIONS: &[&str] = &["pdf"];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "wmv", "flv", "webm", "mpg", "mpeg", "3gp",
];

/// Classifies a file by its extension. Unknown or missing extensions are `Other`.
pub fn detect_document_type(path: &Path) -> DocumentType {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return DocumentType::Other;
    };
    let ext_lower = extension.to_lowercase();

    if PDF_EXTENSIONS.contains(&ext_lower.as_str()) {
        DocumentType::Pdf
    } else if IMAGE_EXTENSIONS.contains(&ext_lower.as_str()) {
        DocumentType::Image
    } else if VIDEO_EXTENSIONS.contains(&ext_lower.as_str()) {
        DocumentType::Video
    } else {
        DocumentType::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_known_types_ignoring_case() {
        assert_eq!(detect_document_type(Path::new("/a/b.PDF")), DocumentType::Pdf);
        assert_eq!(detect_document_type(Path::new("/a/b.jpeg")), DocumentType::Image);
        assert_eq!(detect_document_type(Path::new("/a/b.MOV")), DocumentType::Video);
        assert_eq!(detect_document_type(Path::new("/a/b.docx")), DocumentType::Other);
    }

    #[test]
    fn test_missing_extension_is_other() {
        assert_eq!(detect_document_type(Path::new("/a/README")), DocumentType::Other);
    }
}
