// ABOUTME: Defines the Frame and Snapshot structs nested inside a Shoot document.
// ABOUTME: Frames carry an opaque generation parameter bag; snapshots reference stored image blobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

/// A single generation "take" within a Shoot. The `params` bag is passed
/// through verbatim to the external prompt builder; the store never
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: Ulid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl Frame {
    /// Create a new Frame with a fresh ULID, the given parameter bag, and
    /// no snapshots.
    pub fn new(params: Map<String, Value>) -> Self {
        Self {
            id: Ulid::new(),
            created_at: Utc::now(),
            params,
            snapshots: Vec::new(),
        }
    }

    /// Look up a snapshot by id.
    pub fn snapshot(&self, id: Ulid) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }
}

/// Keys of the Snapshot struct itself. Stripped from the caller-supplied
/// meta bag so the flattened serialization stays unambiguous.
const RESERVED_META_KEYS: [&str; 3] = ["id", "createdAt", "storageRef"];

/// One concrete generated image: caller-supplied metadata plus an opaque
/// reference to the binary payload held by the blob store. Serializes as
/// `{ id, createdAt, ...meta, storageRef }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Ulid,
    pub created_at: DateTime<Utc>,
    pub storage_ref: String,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl Snapshot {
    /// Create a new Snapshot with a fresh ULID. Reserved keys in the meta
    /// bag are dropped rather than allowed to shadow struct fields.
    pub fn new(storage_ref: String, mut meta: Map<String, Value>) -> Self {
        for key in RESERVED_META_KEYS {
            meta.remove(key);
        }
        Self {
            id: Ulid::new(),
            created_at: Utc::now(),
            storage_ref,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params_with(key: &str, value: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert(key.to_string(), json!(value));
        params
    }

    #[test]
    fn frame_new_starts_empty() {
        let frame = Frame::new(params_with("style", "noir"));

        assert!(frame.snapshots.is_empty());
        assert_eq!(frame.params["style"], json!("noir"));
        assert!(frame.created_at <= Utc::now());
    }

    #[test]
    fn frame_defaults_missing_fields() {
        // A document written before snapshots existed still round-trips
        let json = format!(r#"{{"id":"{}","createdAt":"2024-03-01T10:00:00Z"}}"#, Ulid::new());
        let frame: Frame = serde_json::from_str(&json).expect("deserialize");

        assert!(frame.params.is_empty());
        assert!(frame.snapshots.is_empty());
    }

    #[test]
    fn snapshot_flattens_meta_into_document() {
        let mut meta = Map::new();
        meta.insert("seed".to_string(), json!(42));
        meta.insert("upscaled".to_string(), json!(true));

        let snap = Snapshot::new("abc/def.jpg".to_string(), meta);
        let value = serde_json::to_value(&snap).expect("serialize");

        assert_eq!(value["storageRef"], json!("abc/def.jpg"));
        assert_eq!(value["seed"], json!(42));
        assert_eq!(value["upscaled"], json!(true));
        assert!(value.get("meta").is_none(), "meta bag must be flattened");
    }

    #[test]
    fn snapshot_strips_reserved_meta_keys() {
        let mut meta = Map::new();
        meta.insert("id".to_string(), json!("spoofed"));
        meta.insert("storageRef".to_string(), json!("spoofed/ref.png"));
        meta.insert("seed".to_string(), json!(7));

        let snap = Snapshot::new("real/ref.jpg".to_string(), meta);

        assert_eq!(snap.storage_ref, "real/ref.jpg");
        assert!(!snap.meta.contains_key("id"));
        assert!(!snap.meta.contains_key("storageRef"));
        assert_eq!(snap.meta["seed"], json!(7));
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let mut meta = Map::new();
        meta.insert("variant".to_string(), json!("warm"));
        let snap = Snapshot::new("p/q.png".to_string(), meta);

        let json = serde_json::to_string(&snap).expect("serialize");
        let back: Snapshot = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.id, snap.id);
        assert_eq!(back.storage_ref, snap.storage_ref);
        assert_eq!(back.meta["variant"], json!("warm"));
    }
}
