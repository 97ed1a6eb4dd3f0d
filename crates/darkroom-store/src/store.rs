// ABOUTME: Actor-based shoot store serializing all operations through a single FIFO command queue.
// ABOUTME: Composes atomic document writes, blob storage, and the index cache into the CRUD engine.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use darkroom_core::{Frame, IndexEntry, Shoot, Snapshot};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use ulid::Ulid;

use crate::blobs::{self, BlobError, BlobStore};
use crate::documents::{self, DocumentError};
use crate::index::{IndexCache, IndexError};

/// Smallest snapshot payload accepted. Rejects empty and truncated uploads
/// before any disk write; every real encoded image clears this easily.
pub const MIN_SNAPSHOT_BYTES: usize = 128;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shoot not found: {0}")]
    ShootNotFound(Ulid),

    #[error("frame not found: {0}")]
    FrameNotFound(Ulid),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(Ulid),

    #[error("blob missing for storage ref: {0}")]
    BlobMissing(String),

    #[error("shoot document corrupt: {0}")]
    CorruptDocument(String),

    #[error("snapshot payload too small: {got} bytes (minimum {min})")]
    InvalidPayload { got: usize, min: usize },

    #[error("shoot id collision: {0}")]
    IdCollision(Ulid),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store channel closed")]
    ChannelClosed,
}

impl StoreError {
    /// True for the 404-equivalent variants callers handle as a normal
    /// negative result rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ShootNotFound(_)
                | Self::FrameNotFound(_)
                | Self::SnapshotNotFound(_)
                | Self::BlobMissing(_)
        )
    }
}

impl From<DocumentError> for StoreError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::NotFound(id) => Self::ShootNotFound(id),
            DocumentError::Corrupt { path, source } => {
                Self::CorruptDocument(format!("{}: {}", path.display(), source))
            }
            DocumentError::Io(e) => Self::Io(e),
        }
    }
}

impl From<BlobError> for StoreError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound(storage_ref) => Self::BlobMissing(storage_ref),
            BlobError::Io(e) => Self::Io(e),
        }
    }
}

/// Partial update for a Shoot. Only `label` is patchable; `id` and
/// `created_at` are immutable by construction, and `updated_at` is stamped
/// by the store on every persist.
#[derive(Debug, Clone, Default)]
pub struct ShootPatch {
    pub label: Option<String>,
}

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// Commands processed sequentially by the store worker. Every operation,
/// reads included, flows through this queue, so operations against the
/// store are totally ordered within the process.
enum StoreCommand {
    CreateShoot {
        label: String,
        reply: Reply<Shoot>,
    },
    GetShoot {
        id: Ulid,
        reply: Reply<Shoot>,
    },
    UpdateShoot {
        id: Ulid,
        patch: ShootPatch,
        reply: Reply<Shoot>,
    },
    DeleteShoot {
        id: Ulid,
        reply: Reply<()>,
    },
    AddFrame {
        shoot_id: Ulid,
        params: Map<String, Value>,
        reply: Reply<Frame>,
    },
    DeleteFrame {
        shoot_id: Ulid,
        frame_id: Ulid,
        reply: Reply<()>,
    },
    AddSnapshot {
        shoot_id: Ulid,
        frame_id: Ulid,
        bytes: Vec<u8>,
        meta: Map<String, Value>,
        reply: Reply<Snapshot>,
    },
    DeleteSnapshot {
        shoot_id: Ulid,
        frame_id: Ulid,
        snapshot_id: Ulid,
        reply: Reply<()>,
    },
    ListShoots {
        reply: Reply<Vec<IndexEntry>>,
    },
    GetBlob {
        shoot_id: Ulid,
        snapshot_id: Ulid,
        reply: Reply<(Vec<u8>, &'static str)>,
    },
    ReconcileBlobs {
        reply: Reply<usize>,
    },
}

/// Public handle for the shoot store. Cheap to clone; all clones feed the
/// same FIFO queue.
#[derive(Clone)]
pub struct ShootStoreHandle {
    cmd_tx: mpsc::Sender<StoreCommand>,
}

impl ShootStoreHandle {
    async fn send<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> StoreCommand,
    ) -> Result<T, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| StoreError::ChannelClosed)?;
        rx.await.map_err(|_| StoreError::ChannelClosed)?
    }

    /// Create a new empty shoot with the given label.
    pub async fn create_shoot(&self, label: String) -> Result<Shoot, StoreError> {
        self.send(|reply| StoreCommand::CreateShoot { label, reply })
            .await
    }

    /// Load a full shoot document.
    pub async fn get_shoot(&self, id: Ulid) -> Result<Shoot, StoreError> {
        self.send(|reply| StoreCommand::GetShoot { id, reply }).await
    }

    /// Apply a partial update and return the updated document.
    pub async fn update_shoot(&self, id: Ulid, patch: ShootPatch) -> Result<Shoot, StoreError> {
        self.send(|reply| StoreCommand::UpdateShoot { id, patch, reply })
            .await
    }

    /// Delete a shoot and everything under it.
    pub async fn delete_shoot(&self, id: Ulid) -> Result<(), StoreError> {
        self.send(|reply| StoreCommand::DeleteShoot { id, reply })
            .await
    }

    /// Add a frame to a shoot. Frames are kept most-recent-first.
    pub async fn add_frame(
        &self,
        shoot_id: Ulid,
        params: Map<String, Value>,
    ) -> Result<Frame, StoreError> {
        self.send(|reply| StoreCommand::AddFrame {
            shoot_id,
            params,
            reply,
        })
        .await
    }

    /// Delete a frame and its snapshots' blobs.
    pub async fn delete_frame(&self, shoot_id: Ulid, frame_id: Ulid) -> Result<(), StoreError> {
        self.send(|reply| StoreCommand::DeleteFrame {
            shoot_id,
            frame_id,
            reply,
        })
        .await
    }

    /// Store an image payload as a new snapshot on a frame. Snapshots are
    /// kept oldest-first within their frame.
    pub async fn add_snapshot(
        &self,
        shoot_id: Ulid,
        frame_id: Ulid,
        bytes: Vec<u8>,
        meta: Map<String, Value>,
    ) -> Result<Snapshot, StoreError> {
        self.send(|reply| StoreCommand::AddSnapshot {
            shoot_id,
            frame_id,
            bytes,
            meta,
            reply,
        })
        .await
    }

    /// Delete a single snapshot and its blob.
    pub async fn delete_snapshot(
        &self,
        shoot_id: Ulid,
        frame_id: Ulid,
        snapshot_id: Ulid,
    ) -> Result<(), StoreError> {
        self.send(|reply| StoreCommand::DeleteSnapshot {
            shoot_id,
            frame_id,
            snapshot_id,
            reply,
        })
        .await
    }

    /// List catalog entries for all shoots, served from the index cache.
    pub async fn list_shoots(&self) -> Result<Vec<IndexEntry>, StoreError> {
        self.send(|reply| StoreCommand::ListShoots { reply }).await
    }

    /// Fetch a snapshot's image bytes plus their content type.
    pub async fn get_blob(
        &self,
        shoot_id: Ulid,
        snapshot_id: Ulid,
    ) -> Result<(Vec<u8>, &'static str), StoreError> {
        self.send(|reply| StoreCommand::GetBlob {
            shoot_id,
            snapshot_id,
            reply,
        })
        .await
    }

    /// Disk-hygiene pass: reclaim blob directories whose shoot document no
    /// longer exists (crash between delete steps). Returns the count of
    /// directories removed.
    pub async fn reconcile_blobs(&self) -> Result<usize, StoreError> {
        self.send(|reply| StoreCommand::ReconcileBlobs { reply })
            .await
    }
}

/// Spawn the store worker task for the given store root and return its
/// handle. Creates the documents directory and recovers the catalog index
/// (rebuilding it from the documents when the persisted snapshot is missing
/// or unreadable) before the first command is accepted.
pub fn spawn(root: PathBuf) -> Result<ShootStoreHandle, StoreError> {
    let docs_dir = root.join("shoots");
    fs::create_dir_all(&docs_dir)?;

    let index = IndexCache::open(docs_dir.clone())?;
    let blobs = BlobStore::new(root.join("shoots-images"));

    let (cmd_tx, cmd_rx) = mpsc::channel::<StoreCommand>(64);
    let worker = StoreWorker {
        docs_dir,
        blobs,
        index,
        cmd_rx,
    };
    tokio::spawn(worker.run());

    Ok(ShootStoreHandle { cmd_tx })
}

/// The internal worker that processes commands in a loop, one at a time.
struct StoreWorker {
    docs_dir: PathBuf,
    blobs: BlobStore,
    index: IndexCache,
    cmd_rx: mpsc::Receiver<StoreCommand>,
}

impl StoreWorker {
    async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            // Ignore send errors — the caller may have dropped their receiver
            match cmd {
                StoreCommand::CreateShoot { label, reply } => {
                    let _ = reply.send(self.create_shoot(label));
                }
                StoreCommand::GetShoot { id, reply } => {
                    let _ = reply.send(self.load(id));
                }
                StoreCommand::UpdateShoot { id, patch, reply } => {
                    let _ = reply.send(self.update_shoot(id, patch));
                }
                StoreCommand::DeleteShoot { id, reply } => {
                    let _ = reply.send(self.delete_shoot(id));
                }
                StoreCommand::AddFrame {
                    shoot_id,
                    params,
                    reply,
                } => {
                    let _ = reply.send(self.add_frame(shoot_id, params));
                }
                StoreCommand::DeleteFrame {
                    shoot_id,
                    frame_id,
                    reply,
                } => {
                    let _ = reply.send(self.delete_frame(shoot_id, frame_id));
                }
                StoreCommand::AddSnapshot {
                    shoot_id,
                    frame_id,
                    bytes,
                    meta,
                    reply,
                } => {
                    let _ = reply.send(self.add_snapshot(shoot_id, frame_id, bytes, meta));
                }
                StoreCommand::DeleteSnapshot {
                    shoot_id,
                    frame_id,
                    snapshot_id,
                    reply,
                } => {
                    let _ = reply.send(self.delete_snapshot(shoot_id, frame_id, snapshot_id));
                }
                StoreCommand::ListShoots { reply } => {
                    let _ = reply.send(self.index.read().map_err(StoreError::from));
                }
                StoreCommand::GetBlob {
                    shoot_id,
                    snapshot_id,
                    reply,
                } => {
                    let _ = reply.send(self.get_blob(shoot_id, snapshot_id));
                }
                StoreCommand::ReconcileBlobs { reply } => {
                    let _ = reply.send(self.reconcile_blobs());
                }
            }
        }
    }

    fn load(&self, id: Ulid) -> Result<Shoot, StoreError> {
        Ok(documents::load_shoot(&self.docs_dir, id)?)
    }

    /// Stamp `updated_at`, write the document atomically, and refresh the
    /// index row. An index failure is logged, never propagated: the index
    /// is a cache and self-heals on the next rebuild.
    fn persist(&mut self, shoot: &mut Shoot) -> Result<(), StoreError> {
        shoot.updated_at = Utc::now();
        documents::save_shoot(&self.docs_dir, shoot)?;
        if let Err(e) = self.index.upsert(IndexEntry::from_shoot(shoot)) {
            tracing::warn!("index upsert failed for shoot {}: {}", shoot.id, e);
        }
        Ok(())
    }

    fn create_shoot(&mut self, label: String) -> Result<Shoot, StoreError> {
        let mut shoot = Shoot::new(label);
        if documents::shoot_path(&self.docs_dir, shoot.id).exists() {
            return Err(StoreError::IdCollision(shoot.id));
        }
        self.persist(&mut shoot)?;
        Ok(shoot)
    }

    fn update_shoot(&mut self, id: Ulid, patch: ShootPatch) -> Result<Shoot, StoreError> {
        let mut shoot = self.load(id)?;
        if let Some(label) = patch.label {
            shoot.label = label;
        }
        self.persist(&mut shoot)?;
        Ok(shoot)
    }

    fn delete_shoot(&mut self, id: Ulid) -> Result<(), StoreError> {
        let path = documents::shoot_path(&self.docs_dir, id);
        if !path.exists() {
            return Err(StoreError::ShootNotFound(id));
        }

        // Blobs go first: a crash mid-delete leaves an orphaned document
        // that a re-run of delete cleans up, never a catalog entry whose
        // frames reference missing blobs.
        self.blobs.delete_all(id)?;
        fs::remove_file(&path)?;
        if let Err(e) = self.index.remove(id) {
            tracing::warn!("index remove failed for shoot {}: {}", id, e);
        }

        Ok(())
    }

    fn add_frame(&mut self, shoot_id: Ulid, params: Map<String, Value>) -> Result<Frame, StoreError> {
        let mut shoot = self.load(shoot_id)?;
        let frame = Frame::new(params);
        shoot.frames.insert(0, frame.clone());
        self.persist(&mut shoot)?;
        Ok(frame)
    }

    fn delete_frame(&mut self, shoot_id: Ulid, frame_id: Ulid) -> Result<(), StoreError> {
        let mut shoot = self.load(shoot_id)?;
        let pos = shoot
            .frames
            .iter()
            .position(|f| f.id == frame_id)
            .ok_or(StoreError::FrameNotFound(frame_id))?;

        for snapshot in &shoot.frames[pos].snapshots {
            self.blobs.delete(shoot_id, snapshot.id)?;
        }
        shoot.frames.remove(pos);
        self.persist(&mut shoot)?;
        Ok(())
    }

    fn add_snapshot(
        &mut self,
        shoot_id: Ulid,
        frame_id: Ulid,
        bytes: Vec<u8>,
        meta: Map<String, Value>,
    ) -> Result<Snapshot, StoreError> {
        if bytes.len() < MIN_SNAPSHOT_BYTES {
            return Err(StoreError::InvalidPayload {
                got: bytes.len(),
                min: MIN_SNAPSHOT_BYTES,
            });
        }

        let mut shoot = self.load(shoot_id)?;
        let frame = shoot
            .frame_mut(frame_id)
            .ok_or(StoreError::FrameNotFound(frame_id))?;

        let snapshot_id = Ulid::new();
        let storage_ref = self.blobs.put(shoot_id, snapshot_id, &bytes)?;
        let mut snapshot = Snapshot::new(storage_ref, meta);
        snapshot.id = snapshot_id;
        frame.snapshots.push(snapshot.clone());

        self.persist(&mut shoot)?;
        Ok(snapshot)
    }

    fn delete_snapshot(
        &mut self,
        shoot_id: Ulid,
        frame_id: Ulid,
        snapshot_id: Ulid,
    ) -> Result<(), StoreError> {
        let mut shoot = self.load(shoot_id)?;
        let frame = shoot
            .frame_mut(frame_id)
            .ok_or(StoreError::FrameNotFound(frame_id))?;
        let pos = frame
            .snapshots
            .iter()
            .position(|s| s.id == snapshot_id)
            .ok_or(StoreError::SnapshotNotFound(snapshot_id))?;

        self.blobs.delete(shoot_id, snapshot_id)?;
        frame.snapshots.remove(pos);
        self.persist(&mut shoot)?;
        Ok(())
    }

    fn get_blob(
        &self,
        shoot_id: Ulid,
        snapshot_id: Ulid,
    ) -> Result<(Vec<u8>, &'static str), StoreError> {
        let shoot = self.load(shoot_id)?;
        let snapshot = shoot
            .find_snapshot(snapshot_id)
            .ok_or(StoreError::SnapshotNotFound(snapshot_id))?;
        let bytes = self.blobs.get(&snapshot.storage_ref)?;
        Ok((bytes, blobs::content_type(&snapshot.storage_ref)))
    }

    fn reconcile_blobs(&mut self) -> Result<usize, StoreError> {
        let mut reclaimed = 0;
        for shoot_id in self.blobs.list_shoot_dirs()? {
            if !documents::shoot_path(&self.docs_dir, shoot_id).exists() {
                self.blobs.delete_all(shoot_id)?;
                tracing::info!("reclaimed orphaned blob directory for shoot {}", shoot_id);
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }
}
