use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub mod api;
pub mod redirect;
pub mod web;

/// Run a store operation on the blocking pool. Mutations rewrite the link
/// file while holding the store lock, which must not stall a runtime worker.
pub(crate) async fn on_store<T, F>(state: &Arc<AppState>, op: F) -> Result<T, Response>
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state))
        .await
        .map_err(|e| {
            tracing::error!("Store task failed: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        })
}
