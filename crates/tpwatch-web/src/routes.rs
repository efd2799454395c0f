//! API 라우트 정의.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 수집 + 원시 이력
        .route(
            "/monitor",
            get(handlers::monitor::query_raw).post(handlers::monitor::ingest),
        )
        // 차트 시계열
        .route("/monitor/info", get(handlers::monitor::query_chart))
        // 최신 1건
        .route("/monitor/last", get(handlers::monitor::query_latest))
        // 수집 통계
        .route("/monitor/stats", get(handlers::monitor::ingest_stats))
}
