//! Context shaping, previews and source lists

use std::collections::HashSet;
use std::path::Path;

use crate::ingestion::DocumentReader;
use crate::types::{DocHit, Source, WebHit};

/// Collapse runs of whitespace (including newlines) to single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Contexts as handed to the summariser: at most `max_chunks`, whitespace
/// collapsed, each capped at `max_chars`, empties dropped
pub fn normalize_contexts(contexts: &[String], max_chunks: usize, max_chars: usize) -> Vec<String> {
    contexts
        .iter()
        .take(max_chunks)
        .map(|c| truncate_chars(&collapse_whitespace(c), max_chars))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Text of a document hit: the stored chunk, else the start of the file
pub fn doc_hit_text(hit: &DocHit, limit: usize) -> String {
    match hit.meta.text.as_deref() {
        Some(text) if !text.trim().is_empty() => truncate_chars(text, limit),
        _ => DocumentReader::read_preview(Path::new(&hit.meta.path), limit),
    }
}

/// `[<name> p.<page>] <snippet>` for the first `limit` document hits
pub fn doc_preview(hits: &[DocHit], limit: usize) -> Vec<String> {
    hits.iter()
        .take(limit)
        .map(|hit| {
            let page = hit
                .meta
                .page
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            let snippet = truncate_chars(&doc_hit_text(hit, 300), 200);
            format!("[{} p.{}] {}", hit.title(), page, snippet)
        })
        .collect()
}

/// `[web <i>] <title> — <snippet>` for the first `limit` web hits
pub fn web_preview(hits: &[WebHit], limit: usize) -> Vec<String> {
    hits.iter()
        .take(limit)
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[web {}] {} — {}",
                i + 1,
                hit.display_title(),
                truncate_chars(&hit.snippet, 200)
            )
        })
        .collect()
}

/// Drop previews whose label (text before the first `]`) was already seen,
/// collapse whitespace, keep at most `limit`
pub fn dedup_preview(items: &[String], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| {
            let key = item.split(']').next().unwrap_or(item.as_str());
            seen.insert(key.to_string())
        })
        .map(|item| collapse_whitespace(item))
        .take(limit)
        .collect()
}

/// Sources listed next to the answer: every document hit, then every web hit
pub fn summarize_sources(doc_hits: &[DocHit], web_hits: &[WebHit]) -> Vec<Source> {
    doc_hits
        .iter()
        .map(Source::from_doc_hit)
        .chain(web_hits.iter().map(Source::from_web_hit))
        .collect()
}
