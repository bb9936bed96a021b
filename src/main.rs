use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use docuchat_backend::core::config::server_settings;
use docuchat_backend::core::logging;
use docuchat_backend::server::router;
use docuchat_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    logging::init(&state.paths);

    let config = state.config.load_config()?;
    let server = server_settings(&config);
    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(server.port);
    let bind_addr = format!("{}:{}", server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app: Router = router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
