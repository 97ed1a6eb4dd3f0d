// ABOUTME: Defines the Shoot struct, the top-level persisted creative session document.
// ABOUTME: A Shoot owns an ordered list of Frames and tracks creation/update timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::frame::{Frame, Snapshot};

/// A top-level creative session. The `id` is minted at creation and never
/// changes; `updated_at` is bumped by the store on every mutation. Frames
/// are held most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    pub id: Ulid,
    #[serde(default)]
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl Shoot {
    /// Create a new empty Shoot with a fresh ULID and both timestamps set
    /// to now.
    pub fn new(label: String) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            label,
            created_at: now,
            updated_at: now,
            frames: Vec::new(),
        }
    }

    /// Look up a frame by id.
    pub fn frame(&self, id: Ulid) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    /// Look up a frame by id, mutably.
    pub fn frame_mut(&mut self, id: Ulid) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    /// Find a snapshot by id anywhere in the frame tree.
    pub fn find_snapshot(&self, id: Ulid) -> Option<&Snapshot> {
        self.frames.iter().find_map(|f| f.snapshot(id))
    }

    /// Total snapshot count across all frames.
    pub fn snapshot_count(&self) -> usize {
        self.frames.iter().map(|f| f.snapshots.len()).sum()
    }

    /// Storage reference of the first snapshot of the first frame, used as
    /// the catalog preview.
    pub fn preview_ref(&self) -> Option<&str> {
        self.frames
            .first()
            .and_then(|f| f.snapshots.first())
            .map(|s| s.storage_ref.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn shoot_new_sets_fields() {
        let shoot = Shoot::new("Spring lookbook".to_string());

        assert_eq!(shoot.label, "Spring lookbook");
        assert!(shoot.frames.is_empty());
        assert_eq!(shoot.created_at, shoot.updated_at);
        assert!(shoot.created_at <= Utc::now());
    }

    #[test]
    fn shoot_new_generates_unique_ids() {
        let a = Shoot::new("A".to_string());
        let b = Shoot::new("B".to_string());

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn shoot_defaults_missing_optional_fields() {
        let json = format!(
            r#"{{"id":"{}","createdAt":"2024-03-01T10:00:00Z","updatedAt":"2024-03-01T10:00:00Z"}}"#,
            Ulid::new()
        );
        let shoot: Shoot = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(shoot.label, "");
        assert!(shoot.frames.is_empty());
    }

    #[test]
    fn shoot_uses_camel_case_field_names() {
        let shoot = Shoot::new("Names".to_string());
        let value = serde_json::to_value(&shoot).expect("serialize");

        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn preview_ref_is_first_snapshot_of_first_frame() {
        let mut shoot = Shoot::new("Preview".to_string());
        assert!(shoot.preview_ref().is_none());

        let mut older = Frame::new(Map::new());
        older
            .snapshots
            .push(Snapshot::new("x/old.jpg".to_string(), Map::new()));

        let mut newer = Frame::new(Map::new());
        newer
            .snapshots
            .push(Snapshot::new("x/new-1.jpg".to_string(), Map::new()));
        newer
            .snapshots
            .push(Snapshot::new("x/new-2.jpg".to_string(), Map::new()));

        // Frames are held most-recent-first
        shoot.frames.push(older);
        shoot.frames.insert(0, newer);

        assert_eq!(shoot.preview_ref(), Some("x/new-1.jpg"));
        assert_eq!(shoot.snapshot_count(), 3);
    }

    #[test]
    fn find_snapshot_searches_all_frames() {
        let mut shoot = Shoot::new("Find".to_string());
        let mut frame = Frame::new(Map::new());
        let snap = Snapshot::new("a/b.png".to_string(), Map::new());
        let snap_id = snap.id;
        frame.snapshots.push(snap);
        shoot.frames.push(Frame::new(Map::new()));
        shoot.frames.push(frame);

        assert!(shoot.find_snapshot(snap_id).is_some());
        assert!(shoot.find_snapshot(Ulid::new()).is_none());
    }
}
