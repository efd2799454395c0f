//! 런타임 메시지 이력 기록기.
//!
//! 그룹 키를 식별 키로 디코딩하고, 페이로드마다 레코드 1개를 만들어
//! 저장소에 한 번의 배치로 저장한다.

use async_trait::async_trait;
use std::sync::Arc;
use tpwatch_core::error::CoreError;
use tpwatch_core::models::message::{Message, MessageType};
use tpwatch_core::models::metric::{IdentityKey, MetricRecord};
use tpwatch_core::ports::history_store::HistoryStore;
use tpwatch_core::ports::message_handler::MessageHandler;
use tracing::{debug, error};

/// `RUNTIME` 메시지 처리기
pub struct RuntimeHistoryRecorder {
    store: Arc<dyn HistoryStore>,
}

impl RuntimeHistoryRecorder {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    fn build_records(message: Message) -> Result<Vec<MetricRecord>, CoreError> {
        let key = IdentityKey::from_group_key(&message.group_key)?;
        Ok(message
            .messages
            .into_iter()
            .map(|payload| payload.into_record(&key))
            .collect())
    }
}

#[async_trait]
impl MessageHandler for RuntimeHistoryRecorder {
    fn message_type(&self) -> MessageType {
        MessageType::Runtime
    }

    async fn handle(&self, message: Message) -> Result<(), CoreError> {
        let group_key = message.group_key.clone();
        let records = Self::build_records(message).map_err(|e| {
            error!("런타임 메시지 그룹 키 디코딩 실패: {e}");
            e
        })?;

        if records.is_empty() {
            debug!("빈 런타임 메시지: {group_key}");
            return Ok(());
        }

        match self.store.batch_insert(&records).await {
            Ok(saved) => {
                debug!("런타임 이력 저장: {group_key} {saved}건");
                Ok(())
            }
            Err(e) => {
                error!(
                    "런타임 이력 배치 저장 실패 (롤백됨): {group_key} {}건: {e}",
                    records.len()
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingStore, RecordingStore};
    use tpwatch_core::models::message::RuntimeMessage;

    fn payload(timestamp: i64, completed: u64) -> RuntimeMessage {
        RuntimeMessage {
            timestamp,
            pool_size: 4,
            active_size: 1,
            queue_size: 0,
            queue_capacity: 64,
            queue_remaining_capacity: 64,
            completed_task_count: completed,
            reject_count: 0,
            current_load: 0.25,
        }
    }

    fn runtime_message(group_key: &str, payloads: Vec<RuntimeMessage>) -> Message {
        Message {
            message_type: MessageType::Runtime,
            group_key: group_key.to_string(),
            messages: payloads,
        }
    }

    #[tokio::test]
    async fn two_payloads_become_one_batch() {
        let store = Arc::new(RecordingStore::new());
        let recorder = RuntimeHistoryRecorder::new(store.clone());

        recorder
            .handle(runtime_message(
                "p1+i1+t1+inst1",
                vec![payload(1_000, 10), payload(2_000, 12)],
            ))
            .await
            .unwrap();

        assert_eq!(store.batch_count(), 1);
        let records = store.all_records();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.tenant_id, "t1");
            assert_eq!(record.item_id, "i1");
            assert_eq!(record.thread_pool_id, "p1");
            assert_eq!(record.instance_id, "inst1");
        }
        assert_eq!(records[1].completed_task_count, 12);
    }

    #[tokio::test]
    async fn malformed_group_key_fails_without_write() {
        let store = Arc::new(RecordingStore::new());
        let recorder = RuntimeHistoryRecorder::new(store.clone());

        let result = recorder
            .handle(runtime_message("p1+i1+t1", vec![payload(1_000, 1)]))
            .await;

        assert!(matches!(
            result,
            Err(CoreError::MalformedGroupKey { parts: 3, .. })
        ));
        assert_eq!(store.batch_count(), 0);
    }

    #[tokio::test]
    async fn empty_message_skips_write() {
        let store = Arc::new(RecordingStore::new());
        let recorder = RuntimeHistoryRecorder::new(store.clone());

        recorder
            .handle(runtime_message("p1+i1+t1+inst1", Vec::new()))
            .await
            .unwrap();
        assert_eq!(store.batch_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let recorder = RuntimeHistoryRecorder::new(Arc::new(FailingStore));

        let result = recorder
            .handle(runtime_message("p1+i1+t1+inst1", vec![payload(1_000, 1)]))
            .await;
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }
}
