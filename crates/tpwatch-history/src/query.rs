//! 런타임 이력 조회 서비스.
//!
//! 세 조회 모두 같은 창 계산을 공유한다: `[now − lookback, now]`.
//! lookback은 프로세스 전역 설정값이며 호출마다 새로 계산한다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tpwatch_core::error::CoreError;
use tpwatch_core::models::chart::ChartSeries;
use tpwatch_core::models::metric::{IdentityKey, MetricRecord, TimeWindow};
use tpwatch_core::ports::history_store::HistoryStore;
use tracing::debug;

use crate::aggregator::DeltaAggregator;

/// 조회 서비스
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn HistoryStore>,
    aggregator: DeltaAggregator,
    lookback_minutes: u32,
}

impl QueryService {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        aggregator: DeltaAggregator,
        lookback_minutes: u32,
    ) -> Self {
        Self {
            store,
            aggregator,
            lookback_minutes,
        }
    }

    pub fn lookback_minutes(&self) -> u32 {
        self.lookback_minutes
    }

    /// 현재 시각 기준 조회 창
    pub fn window(&self) -> TimeWindow {
        self.window_at(Utc::now())
    }

    pub fn window_at(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::trailing(now, self.lookback_minutes)
    }

    /// 창 안의 원시 레코드 (timestamp 오름차순, 없으면 빈 목록)
    pub async fn query_raw(&self, key: &IdentityKey) -> Result<Vec<MetricRecord>, CoreError> {
        let window = self.window();
        let mut records = self.store.range_query(key, window).await?;
        // 저장 순서와 무관하게 시각 순으로 (안정 정렬)
        records.sort_by_key(|r| r.timestamp);

        debug!(
            "원시 이력 조회: {} {}건 [{}, {}]",
            key.to_group_key(),
            records.len(),
            window.start_ms,
            window.end_ms
        );
        Ok(records)
    }

    /// 창 안의 레코드를 증가량 차트 시계열로 변환
    pub async fn query_chart_series(&self, key: &IdentityKey) -> Result<ChartSeries, CoreError> {
        let records = self.query_raw(key).await?;
        Ok(self.aggregator.aggregate(&records))
    }

    /// 창 안의 최신 레코드 1건
    pub async fn query_latest(
        &self,
        key: &IdentityKey,
    ) -> Result<Option<MetricRecord>, CoreError> {
        self.store.latest(key, self.window()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{key, record, FailingStore, RecordingStore};
    use chrono::{Duration, TimeZone};
    use tpwatch_core::config::CounterResetPolicy;

    fn service(store: Arc<dyn HistoryStore>) -> QueryService {
        QueryService::new(store, DeltaAggregator::default(), 30)
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    #[test]
    fn window_spans_lookback() {
        let service = service(Arc::new(RecordingStore::new()));
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let window = service.window_at(now);
        assert_eq!(window.end_ms, now.timestamp_millis());
        assert_eq!(
            window.start_ms,
            (now - Duration::minutes(30)).timestamp_millis()
        );
    }

    #[tokio::test]
    async fn raw_is_sorted_even_if_store_is_not() {
        let key = key();
        let base = now_ms() - 10 * 60_000;
        let store = RecordingStore::with_records(vec![
            record(&key, base + 120_000, 142),
            record(&key, base, 100),
            record(&key, base + 60_000, 140),
        ]);

        let records = service(Arc::new(store)).query_raw(&key).await.unwrap();
        let counts: Vec<u64> = records.iter().map(|r| r.completed_task_count).collect();
        assert_eq!(counts, vec![100, 140, 142]);
    }

    #[tokio::test]
    async fn chart_series_from_unsorted_store() {
        let key = key();
        let base = now_ms() - 10 * 60_000;
        let store = RecordingStore::with_records(vec![
            record(&key, base + 60_000, 140),
            record(&key, base + 120_000, 142),
            record(&key, base, 100),
        ]);

        let series = service(Arc::new(store))
            .query_chart_series(&key)
            .await
            .unwrap();
        assert_eq!(series.completed_task_delta, vec![0, 40, 2]);
        assert_eq!(series.len(), 3);
    }

    #[tokio::test]
    async fn records_outside_window_are_excluded() {
        let key = key();
        let now = now_ms();
        let store = RecordingStore::with_records(vec![
            record(&key, now - 31 * 60_000, 1),
            record(&key, now - 60_000, 2),
        ]);

        let records = service(Arc::new(store)).query_raw(&key).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].completed_task_count, 2);
    }

    #[tokio::test]
    async fn empty_window_is_not_error() {
        let service = service(Arc::new(RecordingStore::new()));
        let key = key();

        assert!(service.query_raw(&key).await.unwrap().is_empty());
        assert!(service.query_chart_series(&key).await.unwrap().is_empty());
        assert!(service.query_latest(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_returns_max_timestamp() {
        let key = key();
        let now = now_ms();
        let store = RecordingStore::with_records(vec![
            record(&key, now - 120_000, 1),
            record(&key, now - 30_000, 3),
            record(&key, now - 60_000, 2),
        ]);

        let latest = service(Arc::new(store))
            .query_latest(&key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.completed_task_count, 3);
    }

    #[tokio::test]
    async fn store_failure_propagates_to_reader() {
        let service = service(Arc::new(FailingStore));
        let key = key();

        assert!(matches!(
            service.query_raw(&key).await,
            Err(CoreError::Storage(_))
        ));
        assert!(service.query_chart_series(&key).await.is_err());
        assert!(service.query_latest(&key).await.is_err());
    }

    #[tokio::test]
    async fn reset_policy_flows_through_chart() {
        let key = key();
        let base = now_ms() - 10 * 60_000;
        let store = RecordingStore::with_records(vec![
            record(&key, base, 50),
            record(&key, base + 60_000, 5),
        ]);
        let service = QueryService::new(
            Arc::new(store),
            DeltaAggregator::new(CounterResetPolicy::ClampZero, 0),
            30,
        );

        let series = service.query_chart_series(&key).await.unwrap();
        assert_eq!(series.completed_task_delta, vec![0, 0]);
    }
}
