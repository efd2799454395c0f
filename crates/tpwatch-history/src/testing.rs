//! 테스트용 가짜 `HistoryStore` 구현과 로그 캡처.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tpwatch_core::error::CoreError;
use tpwatch_core::models::metric::{IdentityKey, MetricRecord, TimeWindow};
use tpwatch_core::ports::history_store::HistoryStore;

/// 배치 호출을 그대로 기록하는 인메모리 저장소
///
/// `gate`가 있으면 배치 저장마다 허가 1개를 소비한다 (느린 저장소 흉내).
#[derive(Default)]
pub struct RecordingStore {
    pub batches: Mutex<Vec<Vec<MetricRecord>>>,
    pub deleted_before: Mutex<Vec<i64>>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn with_records(records: Vec<MetricRecord>) -> Self {
        let store = Self::default();
        store.batches.lock().push(records);
        store
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn all_records(&self) -> Vec<MetricRecord> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl HistoryStore for RecordingStore {
    async fn range_query(
        &self,
        key: &IdentityKey,
        window: TimeWindow,
    ) -> Result<Vec<MetricRecord>, CoreError> {
        // 삽입 순서 그대로 반환 (정렬은 호출자 책임인지 확인용)
        Ok(self
            .all_records()
            .into_iter()
            .filter(|r| r.identity() == *key && window.contains(r.timestamp))
            .collect())
    }

    async fn latest(
        &self,
        key: &IdentityKey,
        window: TimeWindow,
    ) -> Result<Option<MetricRecord>, CoreError> {
        Ok(self
            .range_query(key, window)
            .await?
            .into_iter()
            .max_by_key(|r| r.timestamp))
    }

    async fn batch_insert(&self, records: &[MetricRecord]) -> Result<usize, CoreError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))?;
            permit.forget();
        }
        self.batches.lock().push(records.to_vec());
        Ok(records.len())
    }

    async fn delete_before(&self, before_ms: i64) -> Result<usize, CoreError> {
        self.deleted_before.lock().push(before_ms);
        let mut batches = self.batches.lock();
        let before: usize = batches.iter().map(Vec::len).sum();
        for batch in batches.iter_mut() {
            batch.retain(|r| r.timestamp >= before_ms);
        }
        let after: usize = batches.iter().map(Vec::len).sum();
        Ok(before - after)
    }
}

/// 모든 호출이 저장소 에러로 실패하는 저장소
pub struct FailingStore;

#[async_trait]
impl HistoryStore for FailingStore {
    async fn range_query(
        &self,
        _key: &IdentityKey,
        _window: TimeWindow,
    ) -> Result<Vec<MetricRecord>, CoreError> {
        Err(CoreError::Storage("저장소 연결 실패".to_string()))
    }

    async fn latest(
        &self,
        _key: &IdentityKey,
        _window: TimeWindow,
    ) -> Result<Option<MetricRecord>, CoreError> {
        Err(CoreError::Storage("저장소 연결 실패".to_string()))
    }

    async fn batch_insert(&self, _records: &[MetricRecord]) -> Result<usize, CoreError> {
        Err(CoreError::Storage("제약 조건 위반".to_string()))
    }

    async fn delete_before(&self, _before_ms: i64) -> Result<usize, CoreError> {
        Err(CoreError::Storage("저장소 연결 실패".to_string()))
    }
}

/// 테스트 레코드 생성
pub fn record(key: &IdentityKey, timestamp: i64, completed: u64) -> MetricRecord {
    MetricRecord {
        tenant_id: key.tenant_id.clone(),
        item_id: key.item_id.clone(),
        thread_pool_id: key.thread_pool_id.clone(),
        instance_id: key.instance_id.clone(),
        timestamp,
        pool_size: 8,
        active_size: 3,
        queue_size: 2,
        queue_capacity: 128,
        queue_remaining_capacity: 126,
        completed_task_count: completed,
        reject_count: 1,
        current_load: 0.375,
    }
}

pub fn key() -> IdentityKey {
    IdentityKey::new("t1", "i1", "p1", "inst1")
}

/// 로그 출력을 메모리에 모으는 writer
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// 이 버퍼로 쓰는 구독자 (`tracing::subscriber::set_default`와 함께 사용)
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
