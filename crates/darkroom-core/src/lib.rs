// ABOUTME: Core library for darkroom, containing the Shoot/Frame/Snapshot domain types.
// ABOUTME: This crate defines the shared data model used across all darkroom components.

pub mod frame;
pub mod index;
pub mod shoot;

pub use frame::{Frame, Snapshot};
pub use index::IndexEntry;
pub use shoot::Shoot;
