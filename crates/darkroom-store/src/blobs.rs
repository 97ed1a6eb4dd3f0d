// ABOUTME: Blob storage for generated images, one file per (shoot, snapshot) pair.
// ABOUTME: Payloads live outside the JSON documents so large images never bloat the catalog.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use ulid::Ulid;

use crate::atomic::write_atomic;

/// Errors that can occur during blob operations.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Stores one binary payload per (shoot id, snapshot id) pair under a root
/// directory. Returned storage references are opaque to callers; only this
/// module understands their structure.
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a BlobStore rooted at the given directory. The directory is
    /// created lazily on first write, not here.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a payload, creating the shoot's blob directory if needed.
    /// The filename extension is sniffed from the payload's magic bytes.
    /// Overwriting an existing blob id is allowed; the atomic write keeps a
    /// concurrent reader from observing a partial image.
    pub fn put(&self, shoot_id: Ulid, snapshot_id: Ulid, bytes: &[u8]) -> Result<String, BlobError> {
        let dir = self.root.join(shoot_id.to_string());
        fs::create_dir_all(&dir)?;

        let file_name = format!("{}.{}", snapshot_id, sniff_extension(bytes));
        write_atomic(&dir.join(&file_name), bytes)?;

        Ok(format!("{}/{}", shoot_id, file_name))
    }

    /// Retrieve a payload by its storage reference.
    pub fn get(&self, storage_ref: &str) -> Result<Vec<u8>, BlobError> {
        match fs::read(self.root.join(storage_ref)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(storage_ref.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a single blob, whatever extension it was stored under.
    /// Absence is success; repeated deletes are idempotent.
    pub fn delete(&self, shoot_id: Ulid, snapshot_id: Ulid) -> Result<(), BlobError> {
        let dir = self.root.join(shoot_id.to_string());
        let stem = snapshot_id.to_string();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.file_stem().is_some_and(|s| s.to_string_lossy() == stem) {
                fs::remove_file(path)?;
            }
        }

        Ok(())
    }

    /// Remove every blob under a shoot's directory. Absence is success.
    pub fn delete_all(&self, shoot_id: Ulid) -> Result<(), BlobError> {
        match fs::remove_dir_all(self.root.join(shoot_id.to_string())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List the shoot ids that currently have a blob directory. Non-ULID
    /// directory names are skipped with a warning.
    pub fn list_shoot_dirs(&self) -> Result<Vec<Ulid>, BlobError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            match name_str.parse::<Ulid>() {
                Ok(id) => ids.push(id),
                Err(_) => {
                    tracing::warn!("skipping non-ULID directory in blob root: {}", name_str);
                }
            }
        }

        Ok(ids)
    }
}

/// Pick a filename extension from the payload's magic bytes.
fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "png"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "gif"
    } else {
        "bin"
    }
}

/// MIME type for a storage reference, derived from its extension. Used by
/// the HTTP layer when streaming an image response.
pub fn content_type(storage_ref: &str) -> &'static str {
    match storage_ref.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn jpeg_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend(std::iter::repeat_n(0u8, 200));
        bytes
    }

    #[test]
    fn put_and_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let shoot_id = Ulid::new();
        let snap_id = Ulid::new();
        let payload = jpeg_bytes();

        let storage_ref = store.put(shoot_id, snap_id, &payload).unwrap();
        let loaded = store.get(&storage_ref).unwrap();

        assert_eq!(loaded, payload);
    }

    #[test]
    fn put_sniffs_jpeg_extension() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let storage_ref = store.put(Ulid::new(), Ulid::new(), &jpeg_bytes()).unwrap();

        assert!(storage_ref.ends_with(".jpg"), "got: {}", storage_ref);
        assert_eq!(content_type(&storage_ref), "image/jpeg");
    }

    #[test]
    fn put_sniffs_png_extension() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let mut payload = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        payload.extend(std::iter::repeat_n(0u8, 64));
        let storage_ref = store.put(Ulid::new(), Ulid::new(), &payload).unwrap();

        assert!(storage_ref.ends_with(".png"));
        assert_eq!(content_type(&storage_ref), "image/png");
    }

    #[test]
    fn unknown_payload_gets_generic_extension() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let storage_ref = store.put(Ulid::new(), Ulid::new(), b"not an image").unwrap();

        assert!(storage_ref.ends_with(".bin"));
        assert_eq!(content_type(&storage_ref), "application/octet-stream");
    }

    #[test]
    fn get_missing_blob_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let result = store.get("nope/missing.jpg");

        assert!(matches!(result, Err(BlobError::NotFound(_))));
    }

    #[test]
    fn delete_removes_blob_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let shoot_id = Ulid::new();
        let snap_id = Ulid::new();
        let storage_ref = store.put(shoot_id, snap_id, &jpeg_bytes()).unwrap();

        store.delete(shoot_id, snap_id).unwrap();
        assert!(matches!(store.get(&storage_ref), Err(BlobError::NotFound(_))));

        // Second delete is still success
        store.delete(shoot_id, snap_id).unwrap();
    }

    #[test]
    fn delete_all_tolerates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        store.delete_all(Ulid::new()).unwrap();
        store.delete_all(Ulid::new()).unwrap();
    }

    #[test]
    fn delete_all_removes_every_blob() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let shoot_id = Ulid::new();
        store.put(shoot_id, Ulid::new(), &jpeg_bytes()).unwrap();
        store.put(shoot_id, Ulid::new(), &jpeg_bytes()).unwrap();

        store.delete_all(shoot_id).unwrap();

        assert!(!dir.path().join(shoot_id.to_string()).exists());
    }

    #[test]
    fn overwrite_by_id_replaces_payload() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let shoot_id = Ulid::new();
        let snap_id = Ulid::new();
        store.put(shoot_id, snap_id, &jpeg_bytes()).unwrap();

        let mut second = jpeg_bytes();
        second.push(0x77);
        let storage_ref = store.put(shoot_id, snap_id, &second).unwrap();

        assert_eq!(store.get(&storage_ref).unwrap(), second);
    }

    #[test]
    fn list_shoot_dirs_skips_foreign_names() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let shoot_id = Ulid::new();
        store.put(shoot_id, Ulid::new(), &jpeg_bytes()).unwrap();
        fs::create_dir_all(dir.path().join("not-a-ulid")).unwrap();

        let ids = store.list_shoot_dirs().unwrap();

        assert_eq!(ids, vec![shoot_id]);
    }
}
