use std::{io, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod code;
mod config;
mod console;
mod error;
mod handlers;
mod models;
mod store;
mod table;
mod url;

use cli::{Cli, Command};
use store::LinkStore;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub store: LinkStore,
    pub config: config::AppConfig,
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::web::index))
        .route("/shorten", post(handlers::web::shorten))
        .route("/api/shorten", post(handlers::api::shorten))
        // Short-link redirect; static routes above take priority
        .route("/:code", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env (ignore error if file is absent; env vars may already be set)
    dotenvy::dotenv().ok();

    // Logs go to stderr so the console menu owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snip=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = config::AppConfig::from_env()?;
    let store = LinkStore::open(&config.store_path);

    let state = Arc::new(AppState { store, config });

    match cli.command() {
        Command::Serve => serve(state).await,
        Command::Console => {
            tokio::task::spawn_blocking(move || {
                console::run(
                    &state.store,
                    &state.config,
                    io::stdin().lock(),
                    io::stdout().lock(),
                )
            })
            .await?
            .context("console session failed")
        }
    }
}

async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    tracing::info!(
        "Starting snip on {}:{}",
        state.config.host,
        state.config.port
    );
    tracing::info!("Base URL: {}", state.config.base_url);
    tracing::info!(
        "Link table: {} ({} link(s))",
        state.store.path().display(),
        state.store.len()
    );

    let listener = tokio::net::TcpListener::bind(state.config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", state.config.bind_addr()))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(dir: &TempDir) -> Arc<AppState> {
        Arc::new(AppState {
            store: LinkStore::open(dir.path().join("urls.json")),
            config: config::AppConfig {
                store_path: dir.path().join("urls.json"),
                host: "127.0.0.1".into(),
                port: 5000,
                base_url: "http://localhost:5000".into(),
            },
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn redirect_hit_counts_click() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state
            .store
            .shorten("https://github.com", Some("gh"))
            .unwrap();

        let response = router(state.clone())
            .oneshot(Request::get("/gh").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://github.com"
        );
        assert_eq!(state.store.info("gh").unwrap().clicks, 1);
    }

    #[tokio::test]
    async fn redirect_miss_is_plain_404() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "Short link not found");
    }

    #[tokio::test]
    async fn redirect_to_invalid_header_value_is_500() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state
            .store
            .shorten("https://example.com/a\nb", Some("broken"))
            .unwrap();

        let response = router(state)
            .oneshot(Request::get("/broken").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[tokio::test]
    async fn api_shorten_rejects_control_characters() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(json_post(
                "/api/shorten",
                r#"{"long_url": "https://example.com/a\nb"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("cannot be redirected"));
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn form_shorten_rejects_control_characters() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(form_post("/shorten", "long_url=example.com%2Fa%0Ab"))
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(html.contains("cannot be redirected to"));
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn index_shows_truncated_preview() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let long = format!("https://example.com/{}", "y".repeat(80));
        state.store.shorten(&long, Some("long")).unwrap();

        let response = router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let html = body_string(response).await;
        // 20 characters of prefix leave 30 of the path in the preview
        assert!(html.contains(&format!("{}...</a>", "y".repeat(30))));
        assert!(!html.contains(&format!("{}...</a>", "y".repeat(31))));
    }

    #[tokio::test]
    async fn api_shorten_returns_code_and_url() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(json_post(
                "/api/shorten",
                r#"{"long_url": "https://example.com/page", "custom_code": "page"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "short_code": "page",
                "short_url": "http://localhost:5000/page",
                "long_url": "https://example.com/page",
            })
        );
        assert_eq!(state.store.len(), 1);
    }

    #[tokio::test]
    async fn api_shorten_keeps_url_without_scheme() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(json_post("/api/shorten", r#"{"long_url": "example.com"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let code = body["short_code"].as_str().unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(state.store.info(code).unwrap().long_url, "example.com");
    }

    #[tokio::test]
    async fn api_shorten_missing_url_is_400() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(json_post("/api/shorten", r#"{"custom_code": "x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "long_url is required");
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn api_shorten_duplicate_code_is_400() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state
            .store
            .shorten("https://one.example", Some("dup"))
            .unwrap();

        let response = router(state)
            .oneshot(json_post(
                "/api/shorten",
                r#"{"long_url": "https://two.example", "custom_code": "dup"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "code 'dup' is already in use");
    }

    #[tokio::test]
    async fn api_shorten_invalid_json_is_400() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state)
            .oneshot(json_post("/api/shorten", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn form_shorten_adds_scheme_and_renders_short_url() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(form_post("/shorten", "long_url=github.com&custom_code=gh"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Short link created!"));
        assert!(html.contains("localhost:5000"));
        assert_eq!(state.store.info("gh").unwrap().long_url, "https://github.com");
    }

    #[tokio::test]
    async fn form_shorten_duplicate_renders_error() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state
            .store
            .shorten("https://one.example", Some("dup"))
            .unwrap();

        let response = router(state.clone())
            .oneshot(form_post("/shorten", "long_url=two.example&custom_code=dup"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("is already in use"));
        assert_eq!(state.store.len(), 1);
    }

    #[tokio::test]
    async fn form_shorten_empty_url_renders_error() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state.clone())
            .oneshot(form_post("/shorten", "long_url=++&custom_code="))
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(html.contains("URL must not be empty."));
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn index_lists_links() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state
            .store
            .shorten("https://one.example", Some("first-code"))
            .unwrap();
        state
            .store
            .shorten("https://two.example", Some("second-code"))
            .unwrap();

        let response = router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        let first = html.find("first-code").unwrap();
        let second = html.find("second-code").unwrap();
        assert!(first < second);
        assert!(html.contains("Clicks: 0"));
    }

    #[tokio::test]
    async fn index_empty_table() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(body_string(response).await.contains("No short links yet"));
    }
}
