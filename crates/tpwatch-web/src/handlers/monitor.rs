//! 스레드 풀 모니터링 API 핸들러.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tpwatch_core::models::chart::ChartSeries;
use tpwatch_core::models::message::MessageWrapper;
use tpwatch_core::models::metric::{IdentityKey, MetricRecord};
use tpwatch_history::ingest::Ack;
use tpwatch_history::worker_pool::PoolStats;

use crate::error::ApiError;
use crate::AppState;

/// 식별 키 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct MonitorQuery {
    pub tenant_id: Option<String>,
    pub item_id: Option<String>,
    pub tp_id: Option<String>,
    pub instance_id: Option<String>,
}

impl MonitorQuery {
    /// 네 값이 모두 있어야 식별 키가 된다
    pub fn into_identity(self) -> Result<IdentityKey, ApiError> {
        Ok(IdentityKey::new(
            required("tenant_id", self.tenant_id)?,
            required("item_id", self.item_id)?,
            required("tp_id", self.tp_id)?,
            required("instance_id", self.instance_id)?,
        ))
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("필수 파라미터 누락: {name}"))),
    }
}

/// 런타임 메시지 수집
///
/// POST /api/monitor
///
/// 처리 결과와 무관하게 항상 `{"success":true}`.
pub async fn ingest(
    State(state): State<AppState>,
    Json(wrapper): Json<MessageWrapper>,
) -> Json<Ack> {
    Json(state.ingest.submit(wrapper))
}

/// 원시 이력 조회
///
/// GET /api/monitor?tenant_id=&item_id=&tp_id=&instance_id=
pub async fn query_raw(
    State(state): State<AppState>,
    Query(params): Query<MonitorQuery>,
) -> Result<Json<Vec<MetricRecord>>, ApiError> {
    let key = params.into_identity()?;
    let records = state.query.query_raw(&key).await?;
    Ok(Json(records))
}

/// 차트 시계열 조회
///
/// GET /api/monitor/info?tenant_id=&item_id=&tp_id=&instance_id=
pub async fn query_chart(
    State(state): State<AppState>,
    Query(params): Query<MonitorQuery>,
) -> Result<Json<ChartSeries>, ApiError> {
    let key = params.into_identity()?;
    let series = state.query.query_chart_series(&key).await?;
    Ok(Json(series))
}

/// 최신 레코드 조회 (없으면 null)
///
/// GET /api/monitor/last?tenant_id=&item_id=&tp_id=&instance_id=
pub async fn query_latest(
    State(state): State<AppState>,
    Query(params): Query<MonitorQuery>,
) -> Result<Json<Option<MetricRecord>>, ApiError> {
    let key = params.into_identity()?;
    let latest = state.query.query_latest(&key).await?;
    Ok(Json(latest))
}

/// 수집 워커 풀 통계
///
/// GET /api/monitor/stats
pub async fn ingest_stats(State(state): State<AppState>) -> Json<PoolStats> {
    Json(state.ingest.stats())
}
