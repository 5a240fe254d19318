//! File types and per-chunk metadata stored alongside the vector index

use serde::{Deserialize, Deserializer, Serialize};

/// Extensions accepted for upload and ingestion
pub const ALLOWED_EXTS: &[&str] = &[".pdf", ".txt", ".md", ".markdown"];

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document, read page by page
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file (read as plain text)
    Markdown,
}

impl FileType {
    /// Detect file type from a file name (case-insensitive)
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
            Some(Self::Markdown)
        } else if lower.ends_with(".txt") {
            Some(Self::Txt)
        } else {
            None
        }
    }
}

/// Whether a file name carries one of the allowed extensions
pub fn is_allowed_ext(filename: &str) -> bool {
    let name = filename.to_lowercase();
    ALLOWED_EXTS.iter().any(|ext| name.ends_with(ext))
}

/// Metadata for one indexed chunk, one JSON line in `meta.jsonl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Source file name
    pub doc: String,
    /// Source file path
    pub path: String,
    /// `"<page>-<n>"` for PDFs, `"<n>"` otherwise
    #[serde(deserialize_with = "string_or_number")]
    pub chunk_id: String,
    /// 1-based page number (PDFs only)
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_u32")]
    pub page: Option<u32>,
    /// Page count of the source document (PDFs only)
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_pages: Option<u32>,
    /// Chunk text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ChunkMeta {
    /// Metadata for a chunk of a PDF page
    pub fn pdf(doc: &str, path: &str, page: u32, index: usize, total_pages: u32, text: &str) -> Self {
        Self {
            doc: doc.to_string(),
            path: path.to_string(),
            chunk_id: format!("{}-{}", page, index),
            page: Some(page),
            total_pages: Some(total_pages),
            text: Some(text.to_string()),
        }
    }

    /// Metadata for a chunk of a page-less text document
    pub fn text(doc: &str, path: &str, index: usize, text: &str) -> Self {
        Self {
            doc: doc.to_string(),
            path: path.to_string(),
            chunk_id: index.to_string(),
            page: None,
            total_pages: None,
            text: Some(text.to_string()),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_u32))
}

/// Interpret integers, integral floats and digit-prefixed strings as page numbers
pub fn coerce_u32(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_allowed_ext() {
        assert!(is_allowed_ext("report.PDF"));
        assert!(is_allowed_ext("notes.markdown"));
        assert!(is_allowed_ext("readme.md"));
        assert!(!is_allowed_ext("sheet.xlsx"));
        assert!(!is_allowed_ext("pdf"));
    }

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("a.Pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_filename("a.markdown"), Some(FileType::Markdown));
        assert_eq!(FileType::from_filename("a.txt"), Some(FileType::Txt));
        assert_eq!(FileType::from_filename("a.doc"), None);
    }

    #[test]
    fn test_meta_json_shape() {
        let pdf = ChunkMeta::pdf("a.pdf", "data/pdf/a.pdf", 3, 1, 10, "page three");
        let value = serde_json::to_value(&pdf).unwrap();
        assert_eq!(value["chunk_id"], "3-1");
        assert_eq!(value["page"], 3);
        assert_eq!(value["total_pages"], 10);
        assert_eq!(value["text"], "page three");

        let txt = ChunkMeta::text("b.txt", "data/pdf/b.txt", 0, "body");
        let value = serde_json::to_value(&txt).unwrap();
        assert!(value.get("page").is_none());
        assert!(value["total_pages"].is_null());
    }

    #[test]
    fn test_meta_lenient_parse() {
        let meta: ChunkMeta = serde_json::from_value(json!({
            "doc": "a.pdf",
            "path": "a.pdf",
            "chunk_id": 4,
            "page": "12",
            "total_pages": 20.0
        }))
        .unwrap();
        assert_eq!(meta.chunk_id, "4");
        assert_eq!(meta.page, Some(12));
        assert_eq!(meta.total_pages, Some(20));
        assert_eq!(meta.text, None);
    }

    #[test]
    fn test_coerce_u32() {
        assert_eq!(coerce_u32(&json!(7)), Some(7));
        assert_eq!(coerce_u32(&json!("5p")), Some(5));
        assert_eq!(coerce_u32(&json!(2.5)), None);
        assert_eq!(coerce_u32(&json!(true)), None);
        assert_eq!(coerce_u32(&json!("x")), None);
    }
}
