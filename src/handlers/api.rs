use crate::{error::StoreError, handlers::on_store, url::is_redirectable, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ShortenRequest {
    long_url: Option<String>,
    custom_code: Option<String>,
}

#[derive(Serialize)]
struct ShortenResponse {
    short_code: String,
    short_url: String,
    long_url: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// POST /api/shorten
///
/// JSON counterpart of the form handler. The URL is stored exactly as sent.
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let Some(long_url) = request.long_url.filter(|u| !u.is_empty()) else {
        return bad_request("long_url is required".into());
    };
    if !is_redirectable(&long_url) {
        return bad_request("long_url contains characters that cannot be redirected to".into());
    }

    let target = long_url.clone();
    let custom_code = request.custom_code;
    let created = match on_store(&state, move |s| {
        s.store.shorten(&target, custom_code.as_deref())
    })
    .await
    {
        Ok(r) => r,
        Err(response) => return response,
    };

    match created {
        Ok(short_code) => Json(ShortenResponse {
            short_url: state.config.short_url(&short_code),
            short_code,
            long_url,
        })
        .into_response(),
        Err(e @ StoreError::DuplicateCode(_)) => bad_request(e.to_string()),
        Err(e) => {
            tracing::error!("Failed to create link via API: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "failed to save link".into(),
                }),
            )
                .into_response()
        }
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
}
