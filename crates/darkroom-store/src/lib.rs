// ABOUTME: Persistence layer for darkroom, handling shoot documents, image blobs, and the catalog index.
// ABOUTME: Provides atomic file writes, blob storage, an index cache, and the actor-based shoot store.

pub mod atomic;
pub mod blobs;
pub mod documents;
pub mod index;
pub mod store;

pub use atomic::write_atomic;
pub use blobs::{BlobError, BlobStore};
pub use documents::{DocumentError, load_shoot, save_shoot, shoot_path};
pub use index::{IndexCache, IndexError};
pub use store::{ShootPatch, ShootStoreHandle, StoreError, spawn};
