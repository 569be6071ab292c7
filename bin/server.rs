// Life Timeline - Web Server
// JSON API + browser page over the shared library

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use clap::Parser;
use life_timeline::{
    load_config, resolve_timeline, resolve_year, share_url, today, Configuration, ErrorKind,
    TimelineError, TimelineState, EXPORT_FILE_NAME,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

#[derive(Parser, Debug)]
#[command(name = "life-timeline-server")]
#[command(about = "Serve the life timeline page and JSON API")]
struct Args {
    /// Configuration file loaded at startup (default: built-in template)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "3000")]
    port: u16,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    timeline: Arc<Mutex<TimelineState>>,
    /// Base used for share links when the request names none
    public_url: String,
}

impl AppState {
    fn new(config: Configuration, public_url: impl Into<String>) -> Self {
        Self {
            timeline: Arc::new(Mutex::new(TimelineState::new(config))),
            public_url: public_url.into(),
        }
    }

    /// A poisoned lock still holds a consistent state: every mutation
    /// either completes or leaves the configuration untouched.
    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.timeline.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` on the shared configuration when the request carries one,
    /// on the server's configuration otherwise. The server's state is not
    /// replaced either way.
    fn with_config<T>(
        &self,
        shared: Option<&str>,
        f: impl FnOnce(&Configuration) -> T,
    ) -> Result<T, TimelineError> {
        match shared {
            Some(json) => Configuration::from_json(json).map(|config| f(&config)),
            None => Ok(f(self.lock().config())),
        }
    }
}

/// Query of the read endpoints: `?config=<share link value>&as_of=YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
struct ViewParams {
    /// Configuration JSON, already form-decoded
    config: Option<String>,
    as_of: Option<NaiveDate>,
}

impl ViewParams {
    fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(today)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ShareParams {
    base: Option<String>,
    config: Option<String>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct ShareResponse {
    url: String,
}

fn ok_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn error_response(err: TimelineError) -> Response {
    let status = match err.kind() {
        ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    log::warn!("request failed ({:?}): {}", err.kind(), err);
    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

fn rejection_response(rejection: QueryRejection) -> Response {
    log::warn!("bad query string: {}", rejection.body_text());
    (
        rejection.status(),
        Json(ApiResponse::<()>::err(rejection.body_text())),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/config - Configuration in interchange form
///
/// With `?config=...` this decodes a share link instead.
async fn get_config(
    State(state): State<AppState>,
    params: Result<Query<ViewParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejection_response(rejection),
    };
    match state.with_config(params.config.as_deref(), Configuration::to_document) {
        Ok(document) => ok_response(document),
        Err(e) => error_response(e),
    }
}

/// PUT /api/config - Replace the configuration from a JSON body
async fn put_config(State(state): State<AppState>, body: String) -> Response {
    match Configuration::from_json(&body) {
        Ok(config) => {
            let document = config.to_document();
            state.lock().replace(config);
            log::info!("configuration replaced via API");
            ok_response(document)
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/timeline - Resolved month grid
async fn get_timeline(
    State(state): State<AppState>,
    params: Result<Query<ViewParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejection_response(rejection),
    };
    let as_of = params.as_of();
    match state.with_config(params.config.as_deref(), |config| {
        resolve_timeline(config, as_of)
    }) {
        Ok(timeline) => ok_response(timeline),
        Err(e) => error_response(e),
    }
}

/// GET /api/years/:year - Day grid of one year's events
async fn get_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    params: Result<Query<ViewParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejection_response(rejection),
    };
    let as_of = params.as_of();
    match state.with_config(params.config.as_deref(), |config| {
        resolve_year(config, year, as_of)
    }) {
        Ok(view) => ok_response(view),
        Err(e) => error_response(e),
    }
}

/// GET /api/export - Configuration as a YAML download
async fn export_yaml(
    State(state): State<AppState>,
    params: Result<Query<ViewParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejection_response(rejection),
    };
    let yaml = state
        .with_config(params.config.as_deref(), Configuration::to_yaml)
        .and_then(|yaml| yaml);

    match yaml {
        Ok(text) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/yaml".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            text,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/import - Replace the configuration from a YAML body
async fn import_yaml(State(state): State<AppState>, body: String) -> Response {
    match Configuration::from_yaml(&body) {
        Ok(config) => {
            let document = config.to_document();
            state.lock().replace(config);
            log::info!("configuration imported via API");
            ok_response(document)
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/share - Share link for the shared or current configuration
async fn get_share(
    State(state): State<AppState>,
    params: Result<Query<ShareParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejection_response(rejection),
    };
    let base = params.base.unwrap_or_else(|| state.public_url.clone());

    let url = state
        .with_config(params.config.as_deref(), |config| share_url(&base, config))
        .and_then(|url| url);
    match url {
        Ok(url) => ok_response(ShareResponse { url }),
        Err(e) => error_response(e),
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn app(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/config", get(get_config).put(put_config))
        .route("/timeline", get(get_timeline))
        .route("/years/:year", get(get_year))
        .route("/export", get(export_yaml))
        .route("/import", post(import_yaml))
        .route("/share", get(get_share))
        .with_state(state);

    // Build main router
    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("🌐 Life Timeline - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = match &args.config {
        Some(path) => {
            let config = load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            println!("✓ Configuration loaded: {}", path.display());
            config
        }
        None => {
            println!("✓ Using the default template");
            Configuration::template()
        }
    };

    let public_url = format!("http://localhost:{}/", args.port);
    let state = AppState::new(config, public_url.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    println!("\n🚀 Server running on {}", public_url);
    println!("   API: {}api/timeline", public_url);
    println!("   UI:  {}", public_url);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use life_timeline::config_from_query;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(Configuration::template(), "http://localhost:3000/")
    }

    /// Query string of a share link for `config`.
    fn shared_query(config: &Configuration) -> String {
        let url = share_url("http://localhost:3000/", config).unwrap();
        url.split_once('?').unwrap().1.to_string()
    }

    async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn get_json(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        send(state, Method::GET, uri, "").await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(&state(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_timeline_uses_as_of() {
        let (status, body) = get_json(&state(), "/api/timeline?as_of=2005-06-15").await;
        assert_eq!(status, StatusCode::OK);

        let cells = body["data"]["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 960);
        assert_eq!(cells[65]["color"], "#FFB3BA"); // 2005-06
        assert!(cells[66]["color"].is_null());
        assert_eq!(body["data"]["legend"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_timeline_bad_as_of_is_400() {
        let (status, body) = get_json(&state(), "/api/timeline?as_of=June").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_timeline_from_shared_config() {
        let mut config = Configuration::template();
        config.name = "Shared".to_string();
        config.life_expectancy_years = 1;
        let uri = format!("/api/timeline?{}", shared_query(&config));

        let state = state();
        let (_, body) = get_json(&state, &uri).await;
        assert_eq!(body["data"]["name"], "Shared");
        assert_eq!(body["data"]["cells"].as_array().unwrap().len(), 12);

        // Server configuration is untouched
        let (_, body) = get_json(&state, "/api/config").await;
        assert_eq!(body["data"]["name"], "John Doe");
    }

    #[tokio::test]
    async fn test_config_decodes_shared_config() {
        let mut config = Configuration::template();
        config.name = "Ana Lúcia".to_string();
        config.life_expectancy_years = 0;
        let uri = format!("/api/config?{}", shared_query(&config));

        let (status, body) = get_json(&state(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Ana Lúcia");
        assert_eq!(body["data"]["life_expectancy"], 0);
    }

    #[tokio::test]
    async fn test_shared_config_malformed_is_400() {
        let (status, body) = get_json(&state(), "/api/config?config=%7Bnope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_import_replaces_configuration() {
        let state = state();
        let yaml = "name: Jane\ndate_of_birth: 1990-05\nlife_periods:\n  - name: Work\n    start: 2012-09\n    color: \"#123456\"\n";

        let (status, body) = send(&state, Method::POST, "/api/import", yaml).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["life_expectancy"], 80);

        let (_, body) = get_json(&state, "/api/config").await;
        assert_eq!(body["data"]["name"], "Jane");
        assert_eq!(body["data"]["life_periods"][0]["color"], "#123456");
    }

    #[tokio::test]
    async fn test_import_invalid_color_is_400() {
        let state = state();
        let yaml = "name: Jane\ndate_of_birth: 1990-05\nlife_periods:\n  - name: Work\n    start: 2012-09\n    color: blue\n";

        let (status, body) = send(&state, Method::POST, "/api/import", yaml).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("blue"));

        let (_, body) = get_json(&state, "/api/config").await;
        assert_eq!(body["data"]["name"], "John Doe");
    }

    #[tokio::test]
    async fn test_put_config_json() {
        let state = state();
        let mut config = Configuration::template();
        config.periods.truncate(1);
        let json = config.to_json().unwrap();

        let (status, _) = send(&state, Method::PUT, "/api/config", &json).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get_json(&state, "/api/config").await;
        assert_eq!(body["data"]["life_periods"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_year_view() {
        let (status, body) = get_json(&state(), "/api/years/2023?as_of=2024-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["year"], 2023);
        assert_eq!(body["data"]["days"].as_array().unwrap().len(), 365);
    }

    #[tokio::test]
    async fn test_export_is_yaml_attachment() {
        let request = Request::builder()
            .uri("/api/export")
            .body(Body::empty())
            .unwrap();
        let response = app(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains(EXPORT_FILE_NAME));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let config = Configuration::from_yaml(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(config, Configuration::template());
    }

    #[tokio::test]
    async fn test_export_shared_config() {
        let mut config = Configuration::template();
        config.name = "Shared".to_string();
        let request = Request::builder()
            .uri(format!("/api/export?{}", shared_query(&config)))
            .body(Body::empty())
            .unwrap();
        let response = app(state()).oneshot(request).await.unwrap();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().contains("name: Shared"));
    }

    #[tokio::test]
    async fn test_share_round_trip() {
        let (_, body) = get_json(&state(), "/api/share?base=https%3A%2F%2Fexample.org%2F").await;
        let url = body["data"]["url"].as_str().unwrap();

        assert!(url.starts_with("https://example.org/?config="));
        assert_eq!(
            config_from_query(url).unwrap(),
            Some(Configuration::template())
        );
    }

    #[tokio::test]
    async fn test_share_of_shared_config() {
        let mut config = Configuration::template();
        config.periods.truncate(2);
        let uri = format!("/api/share?{}", shared_query(&config));

        let (_, body) = get_json(&state(), &uri).await;
        let url = body["data"]["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:3000/?config="));
        assert_eq!(config_from_query(url).unwrap(), Some(config));
    }
}
