// ABOUTME: Shoot document load and save with schema validation at the read boundary.
// ABOUTME: Distinguishes a missing document from one that exists but fails to parse.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use darkroom_core::Shoot;
use thiserror::Error;
use ulid::Ulid;

use crate::atomic::write_atomic;

/// Errors that can occur reading or writing a Shoot document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("shoot document not found: {0}")]
    NotFound(Ulid),

    #[error("shoot document corrupt at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Filename for a shoot id within the documents directory. ULIDs are
/// Crockford base32, so the mapping is injective and filesystem-safe
/// without sanitization.
pub fn shoot_path(docs_dir: &Path, id: Ulid) -> PathBuf {
    docs_dir.join(format!("{}.json", id))
}

/// Load and validate a Shoot document. A missing file is NotFound; a file
/// that exists but fails the typed parse is surfaced as Corrupt, never
/// silently conflated with NotFound.
pub fn load_shoot(docs_dir: &Path, id: Ulid) -> Result<Shoot, DocumentError> {
    let path = shoot_path(docs_dir, id);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DocumentError::NotFound(id));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&contents).map_err(|source| DocumentError::Corrupt { path, source })
}

/// Persist a Shoot document atomically as pretty-printed JSON.
pub fn save_shoot(docs_dir: &Path, shoot: &Shoot) -> Result<(), DocumentError> {
    let json = serde_json::to_string_pretty(shoot).map_err(|source| DocumentError::Corrupt {
        path: shoot_path(docs_dir, shoot.id),
        source,
    })?;
    write_atomic(&shoot_path(docs_dir, shoot.id), json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let shoot = Shoot::new("Round trip".to_string());

        save_shoot(dir.path(), &shoot).unwrap();
        let loaded = load_shoot(dir.path(), shoot.id).unwrap();

        assert_eq!(loaded.id, shoot.id);
        assert_eq!(loaded.label, "Round trip");
        assert!(loaded.frames.is_empty());
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let id = Ulid::new();

        let result = load_shoot(dir.path(), id);

        assert!(matches!(result, Err(DocumentError::NotFound(got)) if got == id));
    }

    #[test]
    fn load_unparseable_is_corrupt_not_not_found() {
        let dir = TempDir::new().unwrap();
        let id = Ulid::new();
        fs::write(shoot_path(dir.path(), id), b"{ this is not json").unwrap();

        let result = load_shoot(dir.path(), id);

        assert!(matches!(result, Err(DocumentError::Corrupt { .. })));
    }

    #[test]
    fn load_wrong_shape_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let id = Ulid::new();
        // Valid JSON, invalid document shape (missing required timestamps)
        fs::write(shoot_path(dir.path(), id), br#"{"id": 12, "label": true}"#).unwrap();

        let result = load_shoot(dir.path(), id);

        assert!(matches!(result, Err(DocumentError::Corrupt { .. })));
    }

    #[test]
    fn document_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let shoot = Shoot::new("Pretty".to_string());

        save_shoot(dir.path(), &shoot).unwrap();
        let raw = fs::read_to_string(shoot_path(dir.path(), shoot.id)).unwrap();

        assert!(raw.contains('\n'), "document should be human-readable");
    }
}
