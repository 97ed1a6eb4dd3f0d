// ABOUTME: Shared application state for the darkroom HTTP server.
// ABOUTME: Holds the store handle and the prompt/generation provider seams for all handlers.

use std::sync::Arc;

use darkroom_store::ShootStoreHandle;

use crate::providers::{GenerationProvider, PromptBuilder};

/// Shared application state accessible by all Axum handlers. The store
/// handle is cheap to clone; every clone feeds the same write queue.
pub struct AppState {
    pub store: ShootStoreHandle,
    pub prompt_builder: Arc<dyn PromptBuilder>,
    /// None when no generation provider is configured; the generate
    /// endpoint answers 503 in that case.
    pub provider: Option<Arc<dyn GenerationProvider>>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create a new AppState from its parts.
    pub fn new(
        store: ShootStoreHandle,
        prompt_builder: Arc<dyn PromptBuilder>,
        provider: Option<Arc<dyn GenerationProvider>>,
    ) -> Self {
        Self {
            store,
            prompt_builder,
            provider,
        }
    }
}
