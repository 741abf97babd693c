use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

// ri-utilizziamo le funzioni e strutture definite in lib.rs
use salotto_server::{build_log_from_env, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Costruisci il log messaggi (in memoria, o SQLite se DATABASE_URL è impostata)
    let log = build_log_from_env().await.context("build message log")?;
    // Crea lo stato dell'applicazione condiviso e le rotte
    let state = Arc::new(AppState { log });
    let app = routes::router(state);

    // Ottieni l'indirizzo di binding dal env o usa il default
    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    // converte la stringa bind in un SocketAddr -> il tipo della libreria standard che rappresenta host + porta
    let addr: SocketAddr = bind.parse().context("parse BIND_ADDR")?;
    tracing::info!("listening on http://{}", addr);

    // Crea il listener TCP e avvia il server Axum
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind tcp listener")?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server shutdown")?;

    Ok(())
}
