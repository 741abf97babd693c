use axum::{extract::Extension, http::StatusCode, Json};
use salotto_core::{protocol::http::AppendMessageRequest, Error, LogError, Message};
use std::sync::Arc;

use crate::AppState;

/// Handler per GET /messages: tutto il log in ordine di inserzione, come
/// array nudo. Non fallisce mai in condizioni normali; con lo store SQLite
/// un errore di I/O diventa un 500 con l'errore wire nel corpo.
pub async fn list_messages(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Message>>, (StatusCode, Json<Error>)> {
    match state.log.list().await {
        Ok(messages) => Ok(Json(messages)),
        Err(e) => {
            tracing::warn!("list failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(e.to_wire())))
        }
    }
}

/// Handler per POST /messages: valida, assegna il timestamp e risponde 201
/// con il messaggio creato; 400 con l'errore wire se text o sender mancano.
/// Un corpo non parseabile viene respinto a monte dall'estrattore Json.
pub async fn append_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<AppendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), (StatusCode, Json<Error>)> {
    /* i campi del DTO sono Option: la loro assenza arriva fin qui e diventa
       un rifiuto di validazione nostro, non un rigetto del framework */
    let text = req.text.unwrap_or_default();
    let sender = req.sender.unwrap_or_default();

    match state.log.append(&text, &sender).await {
        Ok(msg) => {
            tracing::info!("append from {}: {} bytes", msg.sender, msg.text.len());
            Ok((StatusCode::CREATED, Json(msg)))
        }
        Err(e @ LogError::Validation(_)) => Err((StatusCode::BAD_REQUEST, Json(e.to_wire()))),
        Err(e) => {
            tracing::warn!("append failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(e.to_wire())))
        }
    }
}
