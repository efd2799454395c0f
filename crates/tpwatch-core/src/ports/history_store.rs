//! 런타임 이력 저장소 포트.
//!
//! 구현: `tpwatch-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metric::{IdentityKey, MetricRecord, TimeWindow};

/// 스레드 풀 런타임 이력 저장소
///
/// (tenant, item, pool, instance, timestamp)로 키잉된 추가 전용 저장소.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 시간 창 안의 레코드를 timestamp 오름차순으로 조회
    async fn range_query(
        &self,
        key: &IdentityKey,
        window: TimeWindow,
    ) -> Result<Vec<MetricRecord>, CoreError>;

    /// 시간 창 안의 최신 레코드 1건 (동일 timestamp면 나중에 저장된 것)
    async fn latest(
        &self,
        key: &IdentityKey,
        window: TimeWindow,
    ) -> Result<Option<MetricRecord>, CoreError>;

    /// 배치 저장 — 전부 성공하거나 전부 롤백
    async fn batch_insert(&self, records: &[MetricRecord]) -> Result<usize, CoreError>;

    /// 보존 기간이 지난 레코드 삭제
    async fn delete_before(&self, before_ms: i64) -> Result<usize, CoreError>;
}
