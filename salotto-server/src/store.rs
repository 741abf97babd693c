use async_trait::async_trait;
use salotto_core::models::message::validate_new;
use salotto_core::{now_timestamp, LogError, Message, MessageLog};
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;

/// Log in memoria: vive quanto il processo, nessuna persistenza oltre il
/// restart. Gli append concorrenti dei vari partecipanti sono serializzati
/// dal lock di scrittura; il loro ordine relativo è l'ordine d'arrivo al lock.
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageLog for MemoryStore {
    async fn append(&self, text: &str, sender: &str) -> Result<Message, LogError> {
        // la validazione precede ogni mutazione: un append rifiutato non tocca il log
        validate_new(text, sender)?;
        let msg = Message {
            text: text.to_string(),
            sender: sender.to_string(),
            timestamp: now_timestamp(),
        };
        self.messages.write().await.push(msg.clone());
        Ok(msg)
    }

    async fn list(&self) -> Result<Vec<Message>, LogError> {
        Ok(self.messages.read().await.clone())
    }
}

/// Variante su SQLite della stessa capability: stesso contratto append-only,
/// l'ordine di inserzione è la rowid. Dimostra che uno store durevole può
/// subentrare a quello in memoria senza toccare Synchronizer o handler.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageLog for SqliteStore {
    async fn append(&self, text: &str, sender: &str) -> Result<Message, LogError> {
        validate_new(text, sender)?;
        let created_at = now_timestamp();
        /* un solo INSERT: o entra tutto o non entra niente, quindi un append
           fallito non lascia mutazioni parziali */
        sqlx::query("INSERT INTO messages (text, sender, created_at) VALUES (?, ?, ?)")
            .bind(text)
            .bind(sender)
            .bind(&created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| LogError::Transient(format!("db insert error: {}", e)))?;
        Ok(Message {
            text: text.to_string(),
            sender: sender.to_string(),
            timestamp: created_at,
        })
    }

    async fn list(&self) -> Result<Vec<Message>, LogError> {
        let rows = sqlx::query("SELECT text, sender, created_at FROM messages ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LogError::Transient(format!("db error: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                Ok(Message {
                    text: row
                        .try_get("text")
                        .map_err(|e| LogError::Transient(format!("db get error: {}", e)))?,
                    sender: row
                        .try_get("sender")
                        .map_err(|e| LogError::Transient(format!("db get error: {}", e)))?,
                    timestamp: row
                        .try_get("created_at")
                        .map_err(|e| LogError::Transient(format!("db get error: {}", e)))?,
                })
            })
            .collect()
    }
}
