use axum::{routing::get, Extension, Router};
use std::sync::Arc;

use crate::controllers;
use crate::{health_with_log, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|Extension(state): Extension<Arc<AppState>>| async move {
            health_with_log(state.log.as_ref()).await
        }))
        .route(
            "/messages",
            get(controllers::list_messages).post(controllers::append_message),
        )
        .layer(Extension(state))
}
