use anyhow::Context;
use axum::http::StatusCode;
use salotto_core::MessageLog;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod controllers;
pub mod routes;
pub mod store;

/// Stato condiviso dell'applicazione: il log messaggi è una capability
/// iniettata, gli handler non sanno se dietro c'è memoria o SQLite.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<dyn MessageLog>,
}

// Dato un percorso di file, restituisce un URL SQLite valido. Crea le directory genitrici se non esistono.
pub fn sqlite_url_for_path(p: &Path) -> anyhow::Result<String> {
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if let Some(parent) = abs.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dirs for {:?}", parent))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&abs)
        .with_context(|| format!("create/open sqlite file {:?}", abs))?;
    let s = abs.to_string_lossy().replace('\\', "/");
    Ok(format!("sqlite:///{}", s))
}

/// Normalizza il valore di DATABASE_URL in un URL SQLite utilizzabile.
/// Accetta "sqlite::memory:", un URL "sqlite://..." o un semplice percorso file.
pub fn normalize_sqlite_url(raw: &str) -> anyhow::Result<String> {
    if raw == "sqlite::memory:" {
        return Ok(raw.to_string());
    }
    // Rimuovi il prefisso "sqlite://" se presente, per ottenere il percorso del file.
    let path_part = if raw.starts_with("sqlite://") {
        raw.trim_start_matches("sqlite:///")
            .trim_start_matches("sqlite://")
            .to_string()
    } else {
        raw.to_string()
    };
    sqlite_url_for_path(&PathBuf::from(path_part))
}

// Connect to the database and return a connection pool.
pub async fn connect_pool(db_url: &str) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePool::connect(db_url)
        .await
        .with_context(|| format!("connect to sqlite via {}", db_url))?;
    Ok(pool)
}

// Esegue le migrazioni del database. Crea la tabella se non esiste.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    /* Il log è append-only: la tabella non ha UPDATE né DELETE nel suo futuro,
       e la rowid fa da ordine di inserzione per list(). */
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            text       TEXT NOT NULL,
            sender     TEXT NOT NULL,
            created_at TEXT NOT NULL
        );"#,
    )
    .execute(pool)
    .await
    .context("apply migration: create messages")?;
    Ok(())
}

/// Costruisce il log dal DATABASE_URL: se la variabile manca si usa il log in
/// memoria (vita del processo, il comportamento di riferimento); se c'è,
/// subentra lo store SQLite senza che handler o client se ne accorgano.
pub async fn build_log_from_env() -> anyhow::Result<Arc<dyn MessageLog>> {
    match std::env::var("DATABASE_URL") {
        Ok(raw) => {
            let url = normalize_sqlite_url(&raw).context("normalize DATABASE_URL")?;
            tracing::info!("using sqlite store at {}", url);
            let pool = connect_pool(&url).await?;
            run_migrations(&pool).await.context("run migrations")?;
            Ok(Arc::new(store::SqliteStore::new(pool)))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(store::MemoryStore::new()))
        }
    }
}

/// Controlla lo stato di salute del log tentando una lettura.
pub async fn health_with_log(log: &dyn MessageLog) -> StatusCode {
    match log.list().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
