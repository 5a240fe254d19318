//! On-disk vector store: `vectors.idx` plus one metadata line per row in `meta.jsonl`

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::ingestion::DocumentReader;
use crate::types::{ChunkMeta, DocHit, IndexedFile};

use super::flat::FlatIndex;

pub const INDEX_FILE: &str = "vectors.idx";
pub const META_FILE: &str = "meta.jsonl";

/// Index and metadata as loaded from disk
#[derive(Debug)]
struct Loaded {
    index: FlatIndex,
    metas: Vec<ChunkMeta>,
    stamp: (SystemTime, SystemTime),
}

/// Vector store rooted at an index directory
pub struct VectorStore {
    dir: PathBuf,
    /// Held for writing while both files are replaced, for reading while they are loaded
    files: RwLock<()>,
    cache: RwLock<Option<Arc<Loaded>>>,
}

fn modified(path: &Path) -> Result<SystemTime> {
    Ok(fs::metadata(path)?.modified()?)
}

/// Write `data` next to `path` and rename it into place
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Path with `/` separators
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

impl VectorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: RwLock::new(()),
            cache: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Both index files are present
    pub fn exists(&self) -> bool {
        self.index_path().is_file() && self.meta_path().is_file()
    }

    /// Replace the index with `vectors` (normalised here) and their metadata
    pub fn save(&self, vectors: &[Vec<f32>], metas: &[ChunkMeta]) -> Result<()> {
        if vectors.len() != metas.len() {
            return Err(Error::vector_db(format!(
                "{} vectors but {} metadata rows",
                vectors.len(),
                metas.len()
            )));
        }
        let index = FlatIndex::from_vectors(vectors)?;

        let mut lines = Vec::new();
        for meta in metas {
            serde_json::to_writer(&mut lines, meta)?;
            lines.push(b'\n');
        }

        fs::create_dir_all(&self.dir)?;
        {
            let _files = self.files.write();
            write_atomic(&self.index_path(), &index.encode())?;
            write_atomic(&self.meta_path(), &lines)?;
            *self.cache.write() = None;
        }

        tracing::info!(
            "Saved index: {} vectors (dim {}) to {}",
            index.len(),
            index.dim(),
            self.dir.display()
        );
        Ok(())
    }

    fn stamp(&self) -> Result<(SystemTime, SystemTime)> {
        Ok((modified(&self.index_path())?, modified(&self.meta_path())?))
    }

    /// Load from disk unless the cached copy is still current
    fn load(&self) -> Result<Arc<Loaded>> {
        let _files = self.files.read();
        if !self.exists() {
            return Err(Error::IndexMissing(self.dir.display().to_string()));
        }
        let stamp = self.stamp()?;

        if let Some(cached) = self.cache.read().as_ref() {
            if cached.stamp == stamp {
                return Ok(cached.clone());
            }
        }

        let index = FlatIndex::decode(&fs::read(self.index_path())?)?;
        let metas = fs::read_to_string(self.meta_path())?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<ChunkMeta>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if metas.len() != index.len() {
            return Err(Error::vector_db(format!(
                "index has {} vectors but {} metadata lines",
                index.len(),
                metas.len()
            )));
        }
        // Another process may have replaced the files mid-read
        if self.stamp()? != stamp {
            return Err(Error::vector_db("index files changed while loading"));
        }

        tracing::debug!("Loaded index with {} vectors", index.len());
        let loaded = Arc::new(Loaded { index, metas, stamp });
        *self.cache.write() = Some(loaded.clone());
        Ok(loaded)
    }

    /// Top `k` chunks for a query embedding
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<DocHit>> {
        let loaded = self.load()?;
        let hits = loaded.index.search(query, k)?;

        Ok(hits
            .into_iter()
            .filter_map(|(row, score)| {
                loaded.metas.get(row).map(|meta| {
                    let mut meta = meta.clone();
                    meta.path = normalize_path(&meta.path);
                    DocHit { score, meta }
                })
            })
            .collect())
    }

    /// Number of indexed chunks, 0 without an index
    pub fn chunk_count(&self) -> Result<usize> {
        if !self.exists() {
            return Ok(0);
        }
        Ok(self.load()?.metas.len())
    }

    /// Files present in the index with chunk and page counts, sorted by name
    pub fn list_indexed_files(&self) -> Result<Vec<IndexedFile>> {
        if !self.meta_path().is_file() {
            return Ok(Vec::new());
        }

        struct Group {
            name: String,
            chunks: usize,
            total_pages: Option<u32>,
            pages: BTreeSet<u32>,
        }

        let mut groups: HashMap<String, Group> = HashMap::new();
        for (n, line) in fs::read_to_string(self.meta_path())?.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let meta: ChunkMeta = match serde_json::from_str(line) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!("{}:{}: skipping malformed line: {}", META_FILE, n + 1, e);
                    continue;
                }
            };

            let path = normalize_path(&meta.path);
            let group = groups.entry(path.clone()).or_insert_with(|| Group {
                name: if meta.doc.is_empty() {
                    path.rsplit('/').next().unwrap_or(&path).to_string()
                } else {
                    meta.doc.clone()
                },
                chunks: 0,
                total_pages: None,
                pages: BTreeSet::new(),
            });
            group.chunks += 1;
            if let Some(total) = meta.total_pages.filter(|t| *t > 0) {
                group.total_pages = Some(total);
            }
            if let Some(page) = meta.page {
                group.pages.insert(page);
            }
        }

        let mut files: Vec<IndexedFile> = groups
            .into_iter()
            .map(|(path, group)| {
                let pages = group
                    .total_pages
                    .or_else(|| u32::try_from(group.pages.len()).ok().filter(|n| *n > 0))
                    .or_else(|| {
                        let on_disk = Path::new(&path);
                        if path.to_lowercase().ends_with(".pdf") && on_disk.is_file() {
                            DocumentReader::page_count(on_disk)
                        } else {
                            None
                        }
                    });
                IndexedFile {
                    path,
                    name: group.name,
                    chunks: group.chunks,
                    pages,
                }
            })
            .collect();

        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }
}

/// Async facade running store operations on the blocking pool
#[derive(Clone)]
pub struct LocalVectorStore {
    store: Arc<VectorStore>,
}

impl LocalVectorStore {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn exists(&self) -> bool {
        self.store.exists()
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&VectorStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    pub async fn save(&self, vectors: Vec<Vec<f32>>, metas: Vec<ChunkMeta>) -> Result<()> {
        self.blocking(move |store| store.save(&vectors, &metas)).await
    }

    pub async fn search(&self, query: Vec<f32>, k: usize) -> Result<Vec<DocHit>> {
        self.blocking(move |store| store.search(&query, k)).await
    }

    pub async fn list_indexed_files(&self) -> Result<Vec<IndexedFile>> {
        self.blocking(|store| store.list_indexed_files()).await
    }
}
