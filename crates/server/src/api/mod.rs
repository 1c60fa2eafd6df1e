//! API 路由模块。
//!
//! 将沙箱文件系统能力暴露为 HTTP 接口。

pub mod error;
pub mod filesystem;
pub mod state;
pub mod transfer;

use std::sync::Arc;

use axum::{Json, Router, extract::DefaultBodyLimit, routing::get};
use filedeck_api_types::HealthResponse;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use filesystem::create_filesystem_router;
pub use state::AppState;
pub use transfer::create_transfer_router;

/// 组装全部路由，附加 CORS、请求追踪与请求体大小限制。
pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .merge(create_filesystem_router())
        .merge(create_transfer_router())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
