// ABOUTME: HTTP server library for darkroom, assembling the shoot API over the store actor.
// ABOUTME: Exposes shared state, configuration, provider seams, and the router constructor.

pub mod api;
pub mod app_state;
pub mod config;
pub mod providers;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::DarkroomConfig;
pub use routes::create_router;
