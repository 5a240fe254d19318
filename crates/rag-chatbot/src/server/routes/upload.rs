//! File upload endpoint

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

use crate::error::{ApiError, Error};
use crate::server::state::AppState;
use crate::server::RequestTrace;
use crate::types::document::is_allowed_ext;
use crate::types::response::{SkippedUpload, UploadResponse};

/// Multipart field carrying the files
pub const FILES_FIELD: &str = "files";
/// Longest kept file stem, in characters
const MAX_BASE_CHARS: usize = 150;

const MISSING_FIELD_MSG: &str = "files フィールドが見つかりません";
const DISALLOWED_EXT_MSG: &str = "拡張子が許可されていません";

/// Split `name` into stem and extension (with the dot); a leading dot is not
/// an extension separator
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && !name[..i].chars().all(|c| c == '.') => name.split_at(i),
        _ => (name, ""),
    }
}

/// Make an uploaded file name safe to store while keeping non-ASCII text
pub fn safe_filename_keep_unicode(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let normalized: String = base.nfkc().collect();
    let cleaned: String = normalized
        .chars()
        .filter(|c| !matches!(*c as u32, 0x00..=0x1f | 0x7f))
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    let name = cleaned.trim().trim_matches('.');
    let name = if name.is_empty() { "file" } else { name };

    let (stem, ext) = split_ext(name);
    let stem: String = stem.chars().take(MAX_BASE_CHARS).collect();
    format!("{}{}", stem, ext)
}

/// `dir/filename`, or the first free `dir/<stem>_<n><ext>`
pub fn uniquify_path(dir: &Path, filename: &str) -> PathBuf {
    let (stem, ext) = split_ext(filename);
    let mut candidate = dir.join(filename);
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}{}", stem, n, ext));
        n += 1;
    }
    candidate
}

/// POST /api/upload - Store files in the input directory
pub async fn upload_files(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload_dir = state.config().paths.pdf_dir.clone();
    let mut saved = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_field = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request(format!("Failed to read multipart field: {}", e), &trace.id)
    })? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if !seen_field {
            seen_field = true;
            tokio::fs::create_dir_all(&upload_dir)
                .await
                .map_err(|e| ApiError::new(Error::Io(e), &trace.id))?;
        }

        let raw_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let filename = safe_filename_keep_unicode(&raw_name);
        if !is_allowed_ext(&filename) {
            skipped.push(SkippedUpload {
                name: raw_name,
                reason: DISALLOWED_EXT_MSG.to_string(),
            });
            continue;
        }

        let data = field.bytes().await.map_err(|e| {
            ApiError::bad_request(format!("Failed to read file {}: {}", raw_name, e), &trace.id)
        })?;

        let path = uniquify_path(&upload_dir, &filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ApiError::new(Error::Io(e), &trace.id))?;

        let stored = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(filename);
        tracing::info!("Saved upload {} ({} bytes)", stored, data.len());
        saved.push(stored);
    }

    if !seen_field {
        return Err(ApiError::bad_request(MISSING_FIELD_MSG, &trace.id));
    }

    Ok(Json(UploadResponse {
        ok: true,
        saved,
        skipped,
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        trace_id: trace.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filename_keeps_japanese() {
        assert_eq!(safe_filename_keep_unicode("補助金ガイド.pdf"), "補助金ガイド.pdf");
        assert_eq!(safe_filename_keep_unicode("ＩＴ導入　補助金.PDF"), "IT導入 補助金.PDF");
    }

    #[test]
    fn test_safe_filename_strips_paths_and_controls() {
        assert_eq!(safe_filename_keep_unicode("C:\\Users\\me\\a.pdf"), "a.pdf");
        assert_eq!(safe_filename_keep_unicode("../../etc/passwd.txt"), "passwd.txt");
        assert_eq!(safe_filename_keep_unicode("re\u{0}po\u{1f}rt.md"), "report.md");
        assert_eq!(safe_filename_keep_unicode(" .hidden.txt. "), "hidden.txt");
        assert_eq!(safe_filename_keep_unicode("..."), "file");
        // NFKC turns the fullwidth solidus into a real one
        assert_eq!(safe_filename_keep_unicode("a／b.txt"), "a_b.txt");
    }

    #[test]
    fn test_safe_filename_truncates_stem() {
        let name = format!("{}.pdf", "あ".repeat(200));
        let safe = safe_filename_keep_unicode(&name);
        assert_eq!(safe.chars().count(), 150 + 4);
        assert!(safe.ends_with(".pdf"));
    }

    #[test]
    fn test_uniquify_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(uniquify_path(dir.path(), "a.pdf"), dir.path().join("a.pdf"));

        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("a_1.pdf"), b"x").unwrap();
        assert_eq!(uniquify_path(dir.path(), "a.pdf"), dir.path().join("a_2.pdf"));
    }
}
