use crate::{handlers::on_store, AppState};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /:code
///
/// Resolve the short code (counting the click) and answer with a temporary
/// redirect to the original URL, or a plain-text 404.
pub async fn redirect(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    let lookup = code.clone();
    let resolved = match on_store(&state, move |s| s.store.resolve(&lookup)).await {
        Ok(r) => r,
        Err(response) => return response,
    };

    match resolved {
        // A stored target is not necessarily a valid header value.
        Ok(Some(long_url)) => match HeaderValue::try_from(long_url.as_str()) {
            Ok(location) => {
                (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
            }
            Err(_) => {
                tracing::error!("Stored URL for '{}' is not a valid Location: {:?}", code, long_url);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored URL cannot be redirected to",
                )
                    .into_response()
            }
        },
        Ok(None) => (StatusCode::NOT_FOUND, "Short link not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to record click for '{}': {:?}", code, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
