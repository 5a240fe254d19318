//! Ingestion into an on-disk index and retrieval from it

mod common;

use std::sync::Arc;

use common::KeywordEmbedder;
use rag_chatbot::ingestion::{Ingestor, TextChunker};
use rag_chatbot::providers::EmbeddingProvider;
use rag_chatbot::retrieval::{LocalVectorStore, VectorStore, INDEX_FILE, META_FILE};

fn ingestor(root: &std::path::Path, chunker: TextChunker) -> (Ingestor, LocalVectorStore) {
    let store = LocalVectorStore::new(Arc::new(VectorStore::new(root.join("index"))));
    let ingestor = Ingestor::new(root.join("pdf"), chunker, Arc::new(KeywordEmbedder), store.clone());
    (ingestor, store)
}

#[tokio::test]
async fn test_ingest_and_search() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_dir = dir.path().join("pdf");
    std::fs::create_dir_all(&pdf_dir).unwrap();
    std::fs::write(pdf_dir.join("a.txt"), "補助金の申請締切は6月30日です。".repeat(4)).unwrap();
    std::fs::write(pdf_dir.join("b.md"), "# 概要\n\n助成の対象は中小企業です。").unwrap();
    std::fs::write(pdf_dir.join("notes.docx"), "ignored").unwrap();
    std::fs::write(pdf_dir.join("broken.pdf"), "not a pdf").unwrap();

    let (ingestor, store) = ingestor(dir.path(), TextChunker::new(40, 10));
    let report = ingestor.ingest_dir().await.unwrap();

    assert_eq!(report.documents, 2);
    assert!(report.chunks >= 3);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].ends_with("broken.pdf"));
    assert!(dir.path().join("index").join(INDEX_FILE).is_file());
    assert!(dir.path().join("index").join(META_FILE).is_file());

    let query = KeywordEmbedder.embed("補助金の申請締切").await.unwrap();
    let hits = store.search(query, 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].meta.doc, "a.txt");
    assert!(hits[0].meta.text.as_deref().unwrap().contains("締切"));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

    let files = store.list_indexed_files().await.unwrap();
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.md"]);
    assert_eq!(files[1].chunks, 1);
    assert_eq!(files[1].pages, None);
}

#[tokio::test]
async fn test_reingest_replaces_index() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_dir = dir.path().join("pdf");
    std::fs::create_dir_all(&pdf_dir).unwrap();
    std::fs::write(pdf_dir.join("a.txt"), "補助金").unwrap();
    std::fs::write(pdf_dir.join("b.txt"), "申請").unwrap();

    let (ingestor, store) = ingestor(dir.path(), TextChunker::default());
    assert_eq!(ingestor.ingest_dir().await.unwrap().documents, 2);

    std::fs::remove_file(pdf_dir.join("b.txt")).unwrap();
    assert_eq!(ingestor.ingest_dir().await.unwrap().documents, 1);

    let files = store.list_indexed_files().await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "a.txt");
}

#[tokio::test]
async fn test_empty_input_keeps_existing_index() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_dir = dir.path().join("pdf");
    std::fs::create_dir_all(&pdf_dir).unwrap();
    std::fs::write(pdf_dir.join("a.txt"), "補助金").unwrap();

    let (ingestor, store) = ingestor(dir.path(), TextChunker::default());
    ingestor.ingest_dir().await.unwrap();

    std::fs::write(pdf_dir.join("a.txt"), "   ").unwrap();
    let report = ingestor.ingest_dir().await.unwrap();
    assert_eq!(report.documents, 0);
    assert!(store.exists());
    assert_eq!(store.list_indexed_files().await.unwrap().len(), 1);
}
