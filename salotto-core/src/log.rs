use async_trait::async_trait;

use crate::{error::LogError, models::Message};

/// Capability di storage iniettata: append-only più lettura integrale.
/// La implementano in-process gli store del server e via HTTP il client,
/// così il Synchronizer non sa (né deve sapere) quale delle due ha in mano
/// e uno store durevole può subentrare senza toccarlo.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Valida, assegna il timestamp corrente e memorizza. Il messaggio
    /// ritornato è esattamente quello che ogni lettore successivo vedrà.
    async fn append(&self, text: &str, sender: &str) -> Result<Message, LogError>;

    /// Tutti i messaggi in ordine di inserzione; vuoto prima del primo append.
    async fn list(&self) -> Result<Vec<Message>, LogError>;
}
