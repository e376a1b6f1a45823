use crate::{
    error::StoreError,
    handlers::on_store,
    models::Link,
    url::{is_redirectable, with_scheme},
    AppState,
};
use askama::Template;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

const PREVIEW_CHARS: usize = 50;

// ── Template structs ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    links: Vec<LinkRow>,
    short_url: Option<String>,
    error: Option<String>,
}

/// One row of the link table, pre-formatted for display.
struct LinkRow {
    short_code: String,
    long_url: String,
    preview: String,
    clicks: u64,
    created: String,
}

impl From<Link> for LinkRow {
    fn from(link: Link) -> Self {
        let mut preview: String = link.record.long_url.chars().take(PREVIEW_CHARS).collect();
        if link.record.long_url.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        Self {
            short_code: link.short_code,
            preview,
            long_url: link.record.long_url,
            clicks: link.record.clicks,
            created: link.record.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

// ── Form types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ShortenForm {
    #[serde(default)]
    long_url: String,
    custom_code: Option<String>,
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    render(&state, None, None).await
}

/// POST /shorten
pub async fn shorten(State(state): State<Arc<AppState>>, Form(form): Form<ShortenForm>) -> Response {
    let long_url = form.long_url.trim();
    if long_url.is_empty() {
        return render(&state, None, Some("URL must not be empty.".into())).await;
    }
    let long_url = with_scheme(long_url);
    if !is_redirectable(&long_url) {
        return render(
            &state,
            None,
            Some("URL contains characters that cannot be redirected to.".into()),
        )
        .await;
    }

    let custom_code = form
        .custom_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    let created = match on_store(&state, move |s| {
        s.store.shorten(&long_url, custom_code.as_deref())
    })
    .await
    {
        Ok(r) => r,
        Err(response) => return response,
    };

    match created {
        Ok(code) => render(&state, Some(state.config.short_url(&code)), None).await,
        Err(e @ StoreError::DuplicateCode(_)) => render(&state, None, Some(e.to_string())).await,
        Err(e) => {
            tracing::error!("Failed to create link: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save link").into_response()
        }
    }
}

// ── Private helpers ────────────────────────────────────────────────────────

async fn render(
    state: &Arc<AppState>,
    short_url: Option<String>,
    error: Option<String>,
) -> Response {
    let links = match on_store(state, |s| s.store.list()).await {
        Ok(links) => links,
        Err(response) => return response,
    };

    IndexTemplate {
        links: links.into_iter().map(LinkRow::from).collect(),
        short_url,
        error,
    }
    .into_response()
}
