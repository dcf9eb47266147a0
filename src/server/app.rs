use axum::body::Body;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{extract::FromRef, http::StatusCode, routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use routes::{category_router, questions_router, quizzes_router};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;

#[derive(FromRef, Clone)]
pub struct AppState {
    pool: SqlitePool,
}

/// Every route of the API, with fallbacks, CORS and request tracing.
pub fn build_router(pool: SqlitePool) -> Router {
    let state = AppState { pool };

    Router::new()
        .route("/metrics", get(metrics))
        .merge(category_router(state.clone()))
        .merge(questions_router(state.clone()))
        .merge(quizzes_router(state))
        .fallback(|| async {
            tracing::info!("Fallback");
            ApiError::NotFound("no such route".to_owned())
        })
        .layer(middleware::map_response(render_method_not_allowed))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(pool: SqlitePool, addr: &str) -> anyhow::Result<()> {
    let app = build_router(pool);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// axum answers a known path with an unknown verb with an empty 405; keep its
// `Allow` header on the JSON replacement
async fn render_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let mut rendered = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        rendered.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rendered
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = vec![];
    if let Err(err) = encoder.encode(&metrics, &mut buf) {
        tracing::error!("Failed to encode metrics: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let content_type = HeaderValue::from_str(encoder.format_type())
        .unwrap_or(HeaderValue::from_static("text/plain"));
    ([(header::CONTENT_TYPE, content_type)], Body::from(buf)).into_response()
}
