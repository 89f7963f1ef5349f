use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let persona_dir = std::env::var("SPRINTD_PERSONA_DIR").ok().map(PathBuf::from);
    if let Some(dir) = &persona_dir {
        tracing::info!("Loading agent personas from {}", dir.display());
    }

    let state = AppState::new(persona_dir);
    let app = server::create_router(state);

    let addr = std::env::var("SPRINTD_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
