use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Tetto (in byte) sul testo accettato in append. Il limite non era imposto
/// dal comportamento di riferimento, ma un log append-only senza cancellazioni
/// ha bisogno di un massimo sensato.
pub const MAX_TEXT_LEN: usize = 4096;

/// Messaggio accettato dal log e consegnato via broadcast o polling.
/// L'uguaglianza struct coincide con la tupla identità (text, sender,
/// timestamp): due letture bit-identiche sono lo stesso messaggio e devono
/// collassare in un'unica bolla.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub sender: String,
    pub timestamp: String, // RFC3339 UTC, assegnato una volta sola all'append
}

/// Validazione condivisa da ogni implementazione di `MessageLog::append`.
/// Un append rifiutato non deve mutare il log, nemmeno parzialmente.
pub fn validate_new(text: &str, sender: &str) -> Result<(), LogError> {
    if text.is_empty() {
        return Err(LogError::Validation("text must not be empty".to_string()));
    }
    if sender.is_empty() {
        return Err(LogError::Validation("sender must not be empty".to_string()));
    }
    if text.len() > MAX_TEXT_LEN {
        return Err(LogError::Validation(format!(
            "text exceeds {} bytes",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}
