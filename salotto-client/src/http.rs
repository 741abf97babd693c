use async_trait::async_trait;
use salotto_core::{
    protocol::http::AppendMessageRequest, Error as WireError, LogError, Message, MessageLog,
};
use std::time::Duration;

/// Client HTTP del Message Log: la stessa capability che gli store del server
/// offrono in-process, raggiunta però attraverso la superficie REST. Il
/// Synchronizer riceve un `dyn MessageLog` e non distingue le due.
pub struct HttpMessageLog {
    /// Base URL del server (es. "http://127.0.0.1:3000"), senza slash finale.
    base_url: String,
    client: reqwest::Client,
}

impl HttpMessageLog {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LogError> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LogError::Validation(format!(
                "server url must start with http:// or https://, got: {}",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LogError::Transient(format!("build http client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/*
    Mapping degli esiti HTTP nella tassonomia LogError:
    400 -> Validation (il corpo porta l'errore wire)
    errore di rete o status inatteso -> Transient (il prossimo poll ritenta)
    corpo non decodificabile -> MalformedResponse (trattato come transitorio)
*/
#[async_trait]
impl MessageLog for HttpMessageLog {
    async fn append(&self, text: &str, sender: &str) -> Result<Message, LogError> {
        let req = AppendMessageRequest {
            text: Some(text.to_string()),
            sender: Some(sender.to_string()),
        };
        let resp = self
            .client
            .post(self.url("/messages"))
            .json(&req)
            .send()
            .await
            .map_err(|e| LogError::Transient(format!("append request: {}", e)))?;

        let status = resp.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            // se il corpo 400 non si decodifica resta comunque un rifiuto definitivo
            let reason = match resp.json::<WireError>().await {
                Ok(wire) => wire.message,
                Err(_) => "rejected by server".to_string(),
            };
            return Err(LogError::Validation(reason));
        }
        if !status.is_success() {
            return Err(LogError::Transient(format!("append returned {}", status)));
        }

        resp.json::<Message>()
            .await
            .map_err(|e| LogError::MalformedResponse(format!("decode appended message: {}", e)))
    }

    async fn list(&self) -> Result<Vec<Message>, LogError> {
        let resp = self
            .client
            .get(self.url("/messages"))
            .send()
            .await
            .map_err(|e| LogError::Transient(format!("list request: {}", e)))?;

        if !resp.status().is_success() {
            return Err(LogError::Transient(format!(
                "list returned {}",
                resp.status()
            )));
        }

        resp.json::<Vec<Message>>()
            .await
            .map_err(|e| LogError::MalformedResponse(format!("decode message list: {}", e)))
    }
}
