// ABOUTME: Defines the IndexEntry summary row derived from a Shoot document.
// ABOUTME: Entries power the catalog list view without opening full documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::shoot::Shoot;

/// Denormalized summary of one Shoot. Never authoritative; always
/// reconstructable from the Shoot document it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: Ulid,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub frame_count: usize,
    pub snapshot_count: usize,
    pub preview_ref: Option<String>,
}

impl IndexEntry {
    /// Derive the summary row for a Shoot.
    pub fn from_shoot(shoot: &Shoot) -> Self {
        Self {
            id: shoot.id,
            label: shoot.label.clone(),
            created_at: shoot.created_at,
            updated_at: shoot.updated_at,
            frame_count: shoot.frames.len(),
            snapshot_count: shoot.snapshot_count(),
            preview_ref: shoot.preview_ref().map(str::to_string),
        }
    }
}
