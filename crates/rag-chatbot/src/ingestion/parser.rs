//! Text extraction for PDF, plain text and Markdown files

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Seconds allowed for whole-document extraction before giving up
const PDF_EXTRACT_TIMEOUT_SECS: u64 = 60;

/// Normalise characters that PDF text extraction commonly produces
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads documents from disk
pub struct DocumentReader;

impl DocumentReader {
    /// Read a PDF as one string per page (1-based order)
    pub fn read_pdf_pages(path: &Path) -> Result<Vec<String>> {
        let data = std::fs::read(path)?;
        Self::pdf_pages_from_mem(&file_label(path), &data)
    }

    /// Extract per-page text from PDF bytes.
    ///
    /// Pages come from lopdf. When lopdf cannot load the document, or finds no
    /// text on any page, pdf-extract is tried on the whole document and its
    /// output becomes a single page.
    pub fn pdf_pages_from_mem(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                numbers
                    .iter()
                    .map(|&n| match doc.extract_text(&[n]) {
                        Ok(text) => cleanup_pdf_text(&text),
                        Err(e) => {
                            tracing::debug!("{}: no text on page {}: {}", filename, n, e);
                            String::new()
                        }
                    })
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                tracing::warn!("lopdf could not load {}: {}, trying pdf-extract", filename, e);
                Vec::new()
            }
        };

        if pages.iter().any(|p| !p.trim().is_empty()) {
            return Ok(pages);
        }

        match Self::extract_pdf_with_timeout(data) {
            Ok(text) if !text.trim().is_empty() => Ok(vec![cleanup_pdf_text(&text)]),
            Ok(_) if !pages.is_empty() => {
                tracing::warn!("{}: no extractable text, PDF may be image-based", filename);
                Ok(pages)
            }
            Ok(_) => Err(Error::file_parse(filename, "No text content could be extracted from PDF")),
            Err(e) if !pages.is_empty() => {
                tracing::warn!("{}: {}", filename, e);
                Ok(pages)
            }
            Err(e) => Err(Error::file_parse(filename, e.to_string())),
        }
    }

    /// Run pdf-extract on its own thread so a pathological font cannot hang ingestion
    fn extract_pdf_with_timeout(data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Duration::from_secs(PDF_EXTRACT_TIMEOUT_SECS)) {
            Ok(result) => {
                let _ = handle.join();
                result.map_err(|e| Error::internal(format!("pdf-extract failed: {}", e)))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::internal(format!(
                "PDF extraction timed out after {}s",
                PDF_EXTRACT_TIMEOUT_SECS
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::internal("PDF extraction thread crashed"))
            }
        }
    }

    /// Read a text file, replacing invalid UTF-8
    pub fn read_text(path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Full text of a document (PDF pages joined by newlines)
    pub fn read_document(path: &Path) -> Result<String> {
        match FileType::from_filename(&file_label(path)) {
            Some(FileType::Pdf) => Ok(Self::read_pdf_pages(path)?.join("\n")),
            Some(_) => Self::read_text(path),
            None => Err(Error::UnsupportedFileType(file_label(path))),
        }
    }

    /// First `limit` characters of a document, or an empty string if it cannot be read
    pub fn read_preview(path: &Path, limit: usize) -> String {
        match Self::read_document(path) {
            Ok(text) => text.chars().take(limit).collect(),
            Err(e) => {
                tracing::debug!("preview unavailable for {}: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Page count of a PDF on disk, if it can be loaded
    pub fn page_count(path: &Path) -> Option<u32> {
        let doc = lopdf::Document::load(path).ok()?;
        u32::try_from(doc.get_pages().len()).ok().filter(|n| *n > 0)
    }
}

/// Build a Helvetica PDF with one line of ASCII text per page
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => kids,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}
