//! On-disk persistence of per-document index entries.
//!
//! Each document owns two artifacts under the store root:
//!
//! - `<doc_id>.index`: binary header (`DQIX`, format version, generation id,
//!   dimensions, count) followed by `count * dimensions` little-endian f32.
//! - `<doc_id>.chunks`: JSON envelope holding the chunk texts, the generation
//!   id and a SHA-256 of the vector bytes.
//!
//! Writes go to temporary files that are synced and then renamed, index
//! first. The chunks rename is the commit point, so a reader sees either the
//! previous pair or the new pair.

use crate::vector_index::{FlatIndex, VectorIndex};
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use uuid::Uuid;

const INDEX_MAGIC: &[u8; 4] = b"DQIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 16 + 4 + 4;
const INDEX_EXT: &str = "index";
const CHUNKS_EXT: &str = "chunks";

/// Attempts made when the two artifacts disagree on generation.
const GENERATION_RETRIES: u32 = 3;
const GENERATION_RETRY_DELAY: Duration = Duration::from_millis(20);

/// A loaded index entry.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub index: FlatIndex,
    pub chunks: Vec<String>,
    pub generation: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunkEnvelope {
    format_version: u32,
    generation: Uuid,
    vector_sha256: String,
    created_at: DateTime<Utc>,
    chunks: Vec<String>,
}

struct IndexHeader {
    generation: Uuid,
    dimensions: usize,
    count: usize,
}

/// Filesystem-backed store keyed by document id.
///
/// Cloning is cheap and clones share the per-document locks.
#[derive(Clone)]
pub struct IndexStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("root", &self.inner.root)
            .finish()
    }
}

impl IndexStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root: root.into(),
                locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    fn artifact_path(&self, doc_id: &str, ext: &str) -> PathBuf {
        self.inner.root.join(format!("{}.{}", doc_id, ext))
    }

    fn lock_for(&self, doc_id: &str) -> Arc<RwLock<()>> {
        let mut locks = self
            .inner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(doc_id.to_string()).or_default())
    }

    /// Persist an index and its chunk texts, replacing any previous entry.
    ///
    /// Returns the generation id of the new entry.
    pub fn save(&self, doc_id: &str, index: &FlatIndex, chunks: &[String]) -> AppResult<Uuid> {
        validate_doc_id(doc_id)?;

        if chunks.is_empty() {
            return Err(AppError::EmptyInput(format!(
                "no chunks to store for document '{}'",
                doc_id
            )));
        }
        if index.len() != chunks.len() {
            return Err(AppError::Validation(format!(
                "index has {} vectors but document '{}' has {} chunks",
                index.len(),
                doc_id,
                chunks.len()
            )));
        }

        fs::create_dir_all(&self.inner.root)?;

        let generation = Uuid::new_v4();
        let index_bytes = encode_index(index, generation);
        let envelope = ChunkEnvelope {
            format_version: FORMAT_VERSION,
            generation,
            vector_sha256: vector_digest(&index_bytes[HEADER_LEN..]),
            created_at: Utc::now(),
            chunks: chunks.to_vec(),
        };
        let chunk_bytes = serde_json::to_vec(&envelope)?;

        let index_path = self.artifact_path(doc_id, INDEX_EXT);
        let chunks_path = self.artifact_path(doc_id, CHUNKS_EXT);
        let index_tmp = tmp_path(&index_path, generation);
        let chunks_tmp = tmp_path(&chunks_path, generation);

        let lock = self.lock_for(doc_id);
        let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);

        let written = write_synced(&index_tmp, &index_bytes)
            .and_then(|_| write_synced(&chunks_tmp, &chunk_bytes))
            .and_then(|_| fs::rename(&index_tmp, &index_path))
            .and_then(|_| fs::rename(&chunks_tmp, &chunks_path));

        if let Err(e) = written {
            let _ = fs::remove_file(&index_tmp);
            let _ = fs::remove_file(&chunks_tmp);
            return Err(AppError::Io(e));
        }
        sync_dir(&self.inner.root);

        tracing::debug!(
            doc_id = %doc_id,
            chunks = chunks.len(),
            dimensions = index.dimensions(),
            generation = %generation,
            "Committed index entry"
        );

        Ok(generation)
    }

    /// Load a committed entry.
    ///
    /// # Errors
    /// `NotFound` when the entry was never committed; `Corrupt` when the
    /// artifacts are unreadable or disagree with each other.
    pub fn load(&self, doc_id: &str) -> AppResult<StoredEntry> {
        validate_doc_id(doc_id)?;

        let lock = self.lock_for(doc_id);
        let _guard = lock.read().unwrap_or_else(PoisonError::into_inner);

        let mut attempt = 1;
        loop {
            match self.read_entry(doc_id)? {
                ReadOutcome::Entry(entry) => return Ok(entry),
                ReadOutcome::GenerationMismatch { index, chunks } => {
                    if attempt >= GENERATION_RETRIES {
                        return Err(AppError::Corrupt(format!(
                            "document '{}': index generation {} does not match chunks generation {}",
                            doc_id, index, chunks
                        )));
                    }
                    tracing::debug!(
                        doc_id = %doc_id,
                        attempt,
                        "Artifacts disagree on generation, re-reading"
                    );
                    attempt += 1;
                    std::thread::sleep(GENERATION_RETRY_DELAY);
                }
            }
        }
    }

    fn read_entry(&self, doc_id: &str) -> AppResult<ReadOutcome> {
        let index_path = self.artifact_path(doc_id, INDEX_EXT);
        let chunks_path = self.artifact_path(doc_id, CHUNKS_EXT);

        // Chunks first: it is renamed last by writers.
        let chunk_bytes = match fs::read(&chunks_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let reason = if index_path.exists() {
                    "ingest not committed"
                } else {
                    "no index entry"
                };
                return Err(AppError::NotFound(format!(
                    "document '{}': {}",
                    doc_id, reason
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let index_bytes = match fs::read(&index_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AppError::Corrupt(format!(
                    "document '{}': chunk list present without index",
                    doc_id
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let envelope: ChunkEnvelope = serde_json::from_slice(&chunk_bytes).map_err(|e| {
            AppError::Corrupt(format!("document '{}': unreadable chunk list: {}", doc_id, e))
        })?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(AppError::Corrupt(format!(
                "document '{}': unsupported chunk list version {}",
                doc_id, envelope.format_version
            )));
        }

        let header = decode_header(doc_id, &index_bytes)?;
        if header.generation != envelope.generation {
            return Ok(ReadOutcome::GenerationMismatch {
                index: header.generation,
                chunks: envelope.generation,
            });
        }

        let payload = &index_bytes[HEADER_LEN..];
        let expected_len = header
            .count
            .checked_mul(header.dimensions)
            .and_then(|floats| floats.checked_mul(4))
            .ok_or_else(|| {
                AppError::Corrupt(format!("document '{}': index header overflows", doc_id))
            })?;
        if payload.len() != expected_len {
            return Err(AppError::Corrupt(format!(
                "document '{}': index payload is {} bytes, header declares {}",
                doc_id,
                payload.len(),
                expected_len
            )));
        }

        if vector_digest(payload) != envelope.vector_sha256 {
            return Err(AppError::Corrupt(format!(
                "document '{}': vector checksum mismatch",
                doc_id
            )));
        }

        if header.count != envelope.chunks.len() {
            return Err(AppError::Corrupt(format!(
                "document '{}': index has {} vectors but {} chunks",
                doc_id,
                header.count,
                envelope.chunks.len()
            )));
        }

        let data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let index = FlatIndex::from_raw(header.dimensions, data)?;

        Ok(ReadOutcome::Entry(StoredEntry {
            index,
            chunks: envelope.chunks,
            generation: envelope.generation,
            created_at: envelope.created_at,
        }))
    }

    /// Whether a committed entry exists for `doc_id`.
    pub fn exists(&self, doc_id: &str) -> bool {
        if validate_doc_id(doc_id).is_err() {
            return false;
        }
        self.artifact_path(doc_id, CHUNKS_EXT).is_file()
            && self.artifact_path(doc_id, INDEX_EXT).is_file()
    }

    /// Ids of all committed entries, sorted.
    pub fn list(&self) -> AppResult<Vec<String>> {
        let entries = match fs::read_dir(&self.inner.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CHUNKS_EXT) {
                continue;
            }
            if let Some(doc_id) = path.file_stem().and_then(|stem| stem.to_str()) {
                if self.exists(doc_id) {
                    ids.push(doc_id.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Delete an entry. Returns whether anything was removed.
    ///
    /// The chunk list goes first so a concurrent reader sees `NotFound`
    /// rather than a chunk list without its index.
    pub fn remove(&self, doc_id: &str) -> AppResult<bool> {
        validate_doc_id(doc_id)?;

        let lock = self.lock_for(doc_id);
        let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);

        let mut removed = false;
        for ext in [CHUNKS_EXT, INDEX_EXT] {
            match fs::remove_file(self.artifact_path(doc_id, ext)) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::Io(e)),
            }
        }

        if removed {
            tracing::debug!(doc_id = %doc_id, "Removed index entry");
        }
        Ok(removed)
    }
}

enum ReadOutcome {
    Entry(StoredEntry),
    GenerationMismatch { index: Uuid, chunks: Uuid },
}

/// Reject ids that are not a single safe path component.
pub fn validate_doc_id(doc_id: &str) -> AppResult<()> {
    let invalid = doc_id.is_empty()
        || doc_id.starts_with('.')
        || doc_id.contains("..")
        || doc_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());

    if invalid {
        return Err(AppError::Validation(format!(
            "invalid document id '{}'",
            doc_id.escape_debug()
        )));
    }
    Ok(())
}

fn tmp_path(path: &Path, generation: Uuid) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".tmp-{}", generation.simple()));
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Flush the directory entry after renames. Not every platform supports
/// opening a directory, so failures are ignored.
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

fn encode_index(index: &FlatIndex, generation: Uuid) -> Vec<u8> {
    let raw = index.as_raw();
    let mut bytes = Vec::with_capacity(HEADER_LEN + raw.len() * 4);
    bytes.extend_from_slice(INDEX_MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(generation.as_bytes());
    bytes.extend_from_slice(&(index.dimensions() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u32).to_le_bytes());
    for value in raw {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_header(doc_id: &str, bytes: &[u8]) -> AppResult<IndexHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(AppError::Corrupt(format!(
            "document '{}': index truncated ({} bytes)",
            doc_id,
            bytes.len()
        )));
    }
    if &bytes[0..4] != INDEX_MAGIC {
        return Err(AppError::Corrupt(format!(
            "document '{}': not an index file",
            doc_id
        )));
    }

    let read_u32 = |offset: usize| {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    };

    let version = read_u32(4);
    if version != FORMAT_VERSION {
        return Err(AppError::Corrupt(format!(
            "document '{}': unsupported index version {}",
            doc_id, version
        )));
    }

    let mut generation = [0u8; 16];
    generation.copy_from_slice(&bytes[8..24]);

    Ok(IndexHeader {
        generation: Uuid::from_bytes(generation),
        dimensions: read_u32(24) as usize,
        count: read_u32(28) as usize,
    })
}

fn vector_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> (FlatIndex, Vec<String>) {
        let index = FlatIndex::build(vec![
            vec![0.1, 0.2, 0.3],
            vec![-1.5, 2.25, 0.0],
            vec![f32::MIN_POSITIVE, 1e9, -0.0],
        ])
        .unwrap();
        let chunks = vec![
            "First chunk.".to_string(),
            "Second chunk with ünïcode.".to_string(),
            "كيف حالك؟".to_string(),
        ];
        (index, chunks)
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path().join("vectors"));
        let (index, chunks) = sample();

        let generation = store.save("doc-1", &index, &chunks).unwrap();
        let entry = store.load("doc-1").unwrap();

        assert_eq!(entry.index, index);
        assert_eq!(entry.chunks, chunks);
        assert_eq!(entry.generation, generation);
        assert!(store.exists("doc-1"));
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();

        let replacement = FlatIndex::build(vec![vec![9.0, 9.0]]).unwrap();
        store
            .save("doc", &replacement, &["Only chunk.".to_string()])
            .unwrap();

        let entry = store.load("doc").unwrap();
        assert_eq!(entry.chunks, vec!["Only chunk."]);
        assert_eq!(entry.index.dimensions(), 2);
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        assert!(store.load("absent").unwrap_err().is_not_found());
        assert!(!store.exists("absent"));
    }

    #[test]
    fn test_index_without_chunks_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();
        fs::remove_file(temp.path().join("doc.chunks")).unwrap();

        assert!(store.load("doc").unwrap_err().is_not_found());
        assert!(!store.exists("doc"));
    }

    #[test]
    fn test_chunks_without_index_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();
        fs::remove_file(temp.path().join("doc.index")).unwrap();

        assert!(store.load("doc").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();

        let path = temp.path().join("doc.chunks");
        let mut envelope: ChunkEnvelope =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        envelope.chunks.pop();
        fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        let err = store.load("doc").unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("3 vectors but 2 chunks"));
    }

    #[test]
    fn test_flipped_vector_byte_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();

        let path = temp.path().join("doc.index");
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(store.load("doc").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_truncated_index_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();

        fs::write(temp.path().join("doc.index"), b"DQIX").unwrap();
        assert!(store.load("doc").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_generation_mismatch_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("a", &index, &chunks).unwrap();
        store.save("b", &index, &chunks).unwrap();

        // Pair a's chunk list with b's index.
        fs::copy(temp.path().join("b.index"), temp.path().join("a.index")).unwrap();
        let err = store.load("a").unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("generation"));
    }

    #[test]
    fn test_save_rejects_mismatched_pair() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, _) = sample();
        let result = store.save("doc", &index, &["one".to_string()]);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!store.exists("doc"));
    }

    #[test]
    fn test_invalid_doc_ids() {
        for id in ["", "../escape", "a/b", "a\\b", ".hidden"] {
            assert!(
                matches!(validate_doc_id(id), Err(AppError::Validation(_))),
                "{:?} should be rejected",
                id
            );
        }
        assert!(validate_doc_id("6f1c2e9a-0b1d-4c4e-9a51-2f7c1d3e4b5a").is_ok());
    }

    #[test]
    fn test_list_and_remove() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        assert!(store.list().unwrap().is_empty());

        let (index, chunks) = sample();
        store.save("zeta", &index, &chunks).unwrap();
        store.save("alpha", &index, &chunks).unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);

        assert!(store.remove("zeta").unwrap());
        assert!(!store.remove("zeta").unwrap());
        assert_eq!(store.list().unwrap(), vec!["alpha"]);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.contains(".tmp-")));
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_pair() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let (index, chunks) = sample();
        store.save("doc", &index, &chunks).unwrap();

        let small = FlatIndex::build(vec![vec![1.0, 0.0]]).unwrap();
        let small_chunks = vec!["Small.".to_string()];

        std::thread::scope(|scope| {
            let writer = store.clone();
            scope.spawn(move || {
                for i in 0..20 {
                    if i % 2 == 0 {
                        writer.save("doc", &small, &small_chunks).unwrap();
                    } else {
                        writer.save("doc", &index, &chunks).unwrap();
                    }
                }
            });

            for _ in 0..20 {
                let entry = store.load("doc").unwrap();
                assert_eq!(entry.index.len(), entry.chunks.len());
            }
        });
    }
}
