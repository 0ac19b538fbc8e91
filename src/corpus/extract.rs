//! Plain-text extraction from downloaded report bytes.

use crate::error::{Result, WatchpostError};
use std::path::Path;

/// Extensions read as UTF-8 text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv"];

/// Extract text from report bytes, choosing the format from the object name.
pub fn extract_text(bytes: &[u8], name: &str) -> Result<String> {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => extract_pdf(bytes, name),
        ext if TEXT_EXTENSIONS.contains(&ext) => String::from_utf8(bytes.to_vec())
            .map_err(|e| WatchpostError::Extraction(format!("{} is not valid UTF-8: {}", name, e))),
        _ => Err(WatchpostError::Extraction(format!(
            "Unsupported report format: {}",
            name
        ))),
    }
}

fn extract_pdf(bytes: &[u8], name: &str) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| WatchpostError::Extraction(format!("Failed to read PDF {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_formats() {
        assert_eq!(extract_text(b"Created Time: 10:00", "report.TXT").unwrap(), "Created Time: 10:00");
        assert_eq!(extract_text(b"# Report", "notes/report.md").unwrap(), "# Report");
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(
            extract_text(&[0xff, 0xfe, 0x00], "report.txt"),
            Err(WatchpostError::Extraction(_))
        ));
        assert!(matches!(
            extract_text(b"data", "report.docx"),
            Err(WatchpostError::Extraction(_))
        ));
        assert!(matches!(
            extract_text(b"data", "report"),
            Err(WatchpostError::Extraction(_))
        ));
    }

    #[test]
    fn test_corrupt_pdf() {
        assert!(matches!(
            extract_text(b"this is not a pdf", "video_analysis_demo.pdf"),
            Err(WatchpostError::Extraction(_))
        ));
    }
}
