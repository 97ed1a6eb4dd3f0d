// ABOUTME: In-memory catalog index cache with TTL freshness, disk persistence, and full rebuild.
// ABOUTME: The index is never authoritative; it always self-heals from the shoot documents on disk.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use darkroom_core::{IndexEntry, Shoot};
use thiserror::Error;
use ulid::Ulid;

use crate::atomic::write_atomic;

/// Default freshness window before a read falls through to a full rebuild.
const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Filename of the persisted index snapshot inside the documents directory.
pub const INDEX_FILE: &str = "_index.json";

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Time-bounded cache of one IndexEntry per Shoot, owned by a single store
/// instance. Rebuilt from the shoot documents on cold start and kept
/// incrementally updated on every write.
pub struct IndexCache {
    docs_dir: PathBuf,
    entries: Vec<IndexEntry>,
    refreshed_at: Option<Instant>,
    ttl: Duration,
}

impl IndexCache {
    /// Open the index for a documents directory. If the persisted snapshot
    /// is present and parseable it seeds the table; otherwise a full
    /// rebuild runs before the first read is served. This is the
    /// crash-recovery path: the durable source of truth is the set of
    /// shoot documents, never the snapshot.
    pub fn open(docs_dir: PathBuf) -> Result<Self, IndexError> {
        Self::open_with_ttl(docs_dir, DEFAULT_TTL)
    }

    /// Open with an explicit freshness window. Tests use a zero TTL to
    /// force the stale path.
    pub fn open_with_ttl(docs_dir: PathBuf, ttl: Duration) -> Result<Self, IndexError> {
        let mut cache = Self {
            docs_dir,
            entries: Vec::new(),
            refreshed_at: None,
            ttl,
        };

        match cache.load_persisted() {
            Ok(entries) => {
                cache.entries = entries;
                cache.refreshed_at = Some(Instant::now());
            }
            Err(e) => {
                tracing::info!("index snapshot unusable ({}), rebuilding from documents", e);
                cache.rebuild()?;
            }
        }

        Ok(cache)
    }

    /// Return the current entries, rebuilding first if the table has aged
    /// past the freshness window.
    pub fn read(&mut self) -> Result<Vec<IndexEntry>, IndexError> {
        let fresh = self
            .refreshed_at
            .is_some_and(|at| at.elapsed() < self.ttl);
        if !fresh {
            self.rebuild()?;
        }
        Ok(self.entries.clone())
    }

    /// Enumerate every shoot document on disk and rebuild the table from
    /// scratch. A document that fails to parse is logged and skipped;
    /// corruption in one shoot must never hide the rest of the catalog.
    pub fn rebuild(&mut self) -> Result<Vec<IndexEntry>, IndexError> {
        let mut entries = Vec::new();

        let dir_entries = match fs::read_dir(&self.docs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entries.clear();
                self.refreshed_at = Some(Instant::now());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        for entry in dir_entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            if stem.parse::<Ulid>().is_err() {
                // _index.json and any foreign files land here
                continue;
            }

            match fs::read_to_string(&path)
                .map_err(IndexError::from)
                .and_then(|c| serde_json::from_str::<Shoot>(&c).map_err(IndexError::from))
            {
                Ok(shoot) => entries.push(IndexEntry::from_shoot(&shoot)),
                Err(e) => {
                    tracing::warn!("skipping unreadable shoot document {}: {}", path.display(), e);
                }
            }
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.entries = entries;
        self.persist()?;
        self.refreshed_at = Some(Instant::now());

        Ok(self.entries.clone())
    }

    /// Replace or insert the row for one shoot, keeping the table sorted by
    /// `updated_at` descending. This is the steady-state fast path after a
    /// successful mutation; no directory scan happens here.
    pub fn upsert(&mut self, entry: IndexEntry) -> Result<(), IndexError> {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.insert(0, entry);
        self.entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.persist()?;
        self.refreshed_at = Some(Instant::now());
        Ok(())
    }

    /// Drop the row for a deleted shoot.
    pub fn remove(&mut self, id: Ulid) -> Result<(), IndexError> {
        self.entries.retain(|e| e.id != id);
        self.persist()?;
        self.refreshed_at = Some(Instant::now());
        Ok(())
    }

    fn index_path(&self) -> PathBuf {
        self.docs_dir.join(INDEX_FILE)
    }

    fn load_persisted(&self) -> Result<Vec<IndexEntry>, IndexError> {
        let contents = fs::read_to_string(self.index_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self) -> Result<(), IndexError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.index_path(), json.as_bytes())?;
        Ok(())
    }
}
