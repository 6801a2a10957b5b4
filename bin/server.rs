// TP Value - Web Server
// Serves the ranked price-per-TP table as HTML and JSON

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use dotenv::dotenv;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tp_value::config::bind_addr;
use tp_value::render::{render_error_html, render_html, DisplayRow};
use tp_value::{ComputedRow, HttpFetcher, Pipeline, PipelineConfig};

/// Shared application state
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline<HttpFetcher>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn api_error(message: String) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

/// One player row, raw numbers plus the fixed-precision display strings
#[derive(Serialize)]
struct PlayerResponse {
    #[serde(flatten)]
    row: ComputedRow,
    display: DisplayRow,
}

impl From<ComputedRow> for PlayerResponse {
    fn from(row: ComputedRow) -> Self {
        let display = DisplayRow::from(&row);
        Self { row, display }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET / - Ranked table page
async fn serve_index(State(state): State<AppState>) -> Response {
    match state.pipeline.run().await {
        Ok(report) => Html(render_html(&report)).into_response(),
        Err(e) => {
            error!("Error building ranking: {}", e);
            (StatusCode::BAD_GATEWAY, Html(render_error_html(&e.to_string()))).into_response()
        }
    }
}

/// GET /api/players - Ranked rows
async fn get_players(State(state): State<AppState>) -> Response {
    match state.pipeline.run().await {
        Ok(report) => {
            let players: Vec<PlayerResponse> = report.rows.into_iter().map(Into::into).collect();
            ApiResponse::ok(players)
        }
        Err(e) => {
            error!("Error building ranking: {}", e);
            api_error(e.to_string())
        }
    }
}

/// GET /api/unmatched - Display names with no TP reference match
async fn get_unmatched(State(state): State<AppState>) -> Response {
    match state.pipeline.run().await {
        Ok(report) => ApiResponse::ok(report.unmatched),
        Err(e) => {
            error!("Error building ranking: {}", e);
            api_error(e.to_string())
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PipelineConfig::from_env()?;
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;

    info!(
        main = %config.main_pool_url,
        market = %config.market_pool_url,
        reference = %config.tp_reference_path.display(),
        total_supply = config.total_supply,
        "configuration loaded"
    );

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(config, fetcher)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/players", get(get_players))
        .route("/unmatched", get(get_unmatched))
        .with_state(state.clone());

    // Build main router
    let app = Router::new()
        .route("/", get(serve_index))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    println!("🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/players", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
