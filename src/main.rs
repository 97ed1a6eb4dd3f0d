// ABOUTME: Entry point for the darkroom binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and starts the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use darkroom_server::providers::{
    GenerationProvider, OpenAiImageProvider, TemplatePromptBuilder,
};
use darkroom_server::{AppState, DarkroomConfig, create_router};

/// Command-line overrides for the environment configuration.
#[derive(Debug, Parser)]
#[command(name = "darkroom", about = "Creative shoot session store and generation API")]
struct Cli {
    /// Data directory (overrides DARKROOM_HOME)
    #[arg(long)]
    home: Option<PathBuf>,

    /// Socket address to bind (overrides DARKROOM_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darkroom=debug,tower_http=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = DarkroomConfig::from_env()?;
    if let Some(home) = cli.home {
        config.home = home;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    tracing::info!("darkroom starting up, home = {}", config.home.display());

    let store = darkroom_store::spawn(config.home.clone())?;

    let provider: Option<Arc<dyn GenerationProvider>> = match OpenAiImageProvider::from_env() {
        Ok(p) => Some(Arc::new(p)),
        Err(e) => {
            tracing::warn!("image generation disabled: {}", e);
            None
        }
    };

    let state = Arc::new(AppState::new(
        store,
        Arc::new(TemplatePromptBuilder),
        provider,
    ));
    let app = create_router(state);

    tracing::info!("darkroom listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
