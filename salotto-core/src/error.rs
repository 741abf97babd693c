use serde::{Deserialize, Serialize};

/// Errore condiviso sul wire (corpo delle risposte 4xx/5xx).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    /// Codice stabile (es. "validation_error")
    pub code: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/*
    Tassonomia degli errori del log messaggi:
    Validation -> campo mancante/vuoto o testo oltre il limite; definitivo, non si ritenta
    Transient -> rete o I/O falliti; si salta l'operazione e il prossimo poll fa da retry
    MalformedResponse -> forma inattesa nella risposta a list/append; trattato come transitorio
    Nessuna variante è fatale per il ciclo di vita del Synchronizer.
*/
#[derive(Debug, Clone, thiserror::Error)]
pub enum LogError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("transient i/o: {0}")]
    Transient(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl LogError {
    /// Converte nella forma serializzabile usata come corpo HTTP.
    pub fn to_wire(&self) -> Error {
        let (code, message) = match self {
            LogError::Validation(m) => ("validation_error", m),
            LogError::Transient(m) => ("transient_io_error", m),
            LogError::MalformedResponse(m) => ("malformed_response", m),
        };
        Error {
            code: code.to_string(),
            message: message.clone(),
            details: None,
        }
    }
}
