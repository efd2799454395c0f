//! 런타임 메시지 수집 큐.
//!
//! 호출자는 제출 즉시 수락 응답을 받는다. 디코딩과 저장은 워커 풀에서
//! 비동기로 처리되며, 풀이 포화되면 제출은 경고 로그만 남기고 버려진다.
//! 수락 응답은 "처리 대기열에 들어감"이 아니라 "받았음"을 뜻한다.

use serde::Serialize;
use std::sync::Arc;
use tpwatch_core::error::CoreError;
use tpwatch_core::models::message::MessageWrapper;
use tpwatch_core::models::metric::IdentityKey;
use tracing::{error, warn};

use crate::dispatch::HandlerRegistry;
use crate::worker_pool::{PoolStats, SubmitError, WorkerPool};

/// 제출 응답 (항상 수락)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const ACCEPTED: Ack = Ack { success: true };
}

/// 수집 큐
#[derive(Clone)]
pub struct IngestionQueue {
    pool: Arc<WorkerPool>,
    registry: Arc<HandlerRegistry>,
}

impl IngestionQueue {
    pub fn new(pool: Arc<WorkerPool>, registry: Arc<HandlerRegistry>) -> Self {
        Self { pool, registry }
    }

    /// 워커 풀에 처리 작업 제출 시도
    ///
    /// 대기하지 않는다. 포화/종료 시 결과로 알려줄 뿐 로그는 남기지 않는다.
    pub fn try_submit(&self, wrapper: MessageWrapper) -> Result<(), SubmitError> {
        let registry = self.registry.clone();
        self.pool.try_submit(process(registry, wrapper))
    }

    /// fire-and-drop 제출
    ///
    /// 거부된 제출은 그룹 키와 함께 경고 로그로 남기고, 호출자에게는
    /// 언제나 [`Ack::ACCEPTED`]를 돌려준다.
    pub fn submit(&self, wrapper: MessageWrapper) -> Ack {
        let group_key = wrapper.group_key.clone();
        if let Err(e) = self.try_submit(wrapper) {
            log_drop(&group_key, &e);
        }
        Ack::ACCEPTED
    }

    /// 워커 풀 통계
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

fn log_drop(group_key: &str, err: &SubmitError) {
    match IdentityKey::from_group_key(group_key) {
        Ok(key) => warn!(
            "런타임 메시지 폐기: {err} (group_key={group_key}, tenant={}, pool={})",
            key.tenant_id, key.thread_pool_id
        ),
        Err(_) => warn!("런타임 메시지 폐기: {err} (group_key={group_key})"),
    }
}

/// 워커에서 실행되는 처리 작업
///
/// 페이로드 디코딩 실패만 여기서 기록한다. 처리기 실패는 처리기가 기록한다.
async fn process(
    registry: Arc<HandlerRegistry>,
    wrapper: MessageWrapper,
) -> Result<(), CoreError> {
    let group_key = wrapper.group_key.clone();
    let message = wrapper.convert().map_err(|e| {
        error!("런타임 메시지 디코딩 실패 (group_key={group_key}): {e}");
        e
    })?;
    registry.dispatch(message).await
}
