//! 스레드 풀 런타임 메트릭 모델.
//!
//! 단일 스레드 풀 인스턴스의 한 시점 관측값과 식별 키, 조회 시간 창.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::group_key;

/// 스레드 풀 인스턴스 식별 키 (tenant, item, pool, instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    /// 테넌트 ID
    pub tenant_id: String,
    /// 아이템(애플리케이션) ID
    pub item_id: String,
    /// 스레드 풀 ID
    pub thread_pool_id: String,
    /// 인스턴스 ID
    pub instance_id: String,
}

impl IdentityKey {
    pub fn new(
        tenant_id: impl Into<String>,
        item_id: impl Into<String>,
        thread_pool_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            item_id: item_id.into(),
            thread_pool_id: thread_pool_id.into(),
            instance_id: instance_id.into(),
        }
    }

    /// 복합 그룹 키 디코딩 (순서: threadPoolId, itemId, tenantId, instanceId)
    pub fn from_group_key(key: &str) -> Result<Self, CoreError> {
        let [thread_pool_id, item_id, tenant_id, instance_id] = group_key::parse_key(key)?;
        Ok(Self {
            tenant_id,
            item_id,
            thread_pool_id,
            instance_id,
        })
    }

    /// 복합 그룹 키 인코딩
    pub fn to_group_key(&self) -> String {
        group_key::format_key(&[
            &self.thread_pool_id,
            &self.item_id,
            &self.tenant_id,
            &self.instance_id,
        ])
    }
}

/// 스레드 풀 런타임 메트릭 레코드
///
/// 저장 후에는 불변. 같은 식별 키 스트림 안에서 `completed_task_count`,
/// `reject_count`는 단조 증가하며, 감소는 인스턴스 재시작(카운터 리셋)을 뜻한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// 테넌트 ID
    pub tenant_id: String,
    /// 아이템 ID
    pub item_id: String,
    /// 스레드 풀 ID
    pub thread_pool_id: String,
    /// 인스턴스 ID
    pub instance_id: String,
    /// 수집 시각 (epoch 밀리초)
    pub timestamp: i64,
    /// 현재 풀 크기
    pub pool_size: u64,
    /// 활성 스레드 수
    pub active_size: u64,
    /// 큐 적재 수
    pub queue_size: u64,
    /// 큐 용량
    pub queue_capacity: u64,
    /// 큐 잔여 용량
    pub queue_remaining_capacity: u64,
    /// 누적 완료 작업 수
    pub completed_task_count: u64,
    /// 누적 거부 수
    pub reject_count: u64,
    /// 현재 부하 (활성/최대 비율)
    pub current_load: f64,
}

impl MetricRecord {
    /// 레코드의 식별 키
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(
            &self.tenant_id,
            &self.item_id,
            &self.thread_pool_id,
            &self.instance_id,
        )
    }
}

/// 조회 시간 창 [start_ms, end_ms] (양 끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// 시작 시각 (epoch 밀리초)
    pub start_ms: i64,
    /// 종료 시각 (epoch 밀리초)
    pub end_ms: i64,
}

impl TimeWindow {
    /// `now`에서 `lookback_minutes`분 거슬러 올라간 시간 창
    pub fn trailing(now: DateTime<Utc>, lookback_minutes: u32) -> Self {
        let start = now - Duration::minutes(i64::from(lookback_minutes));
        Self {
            start_ms: start.timestamp_millis(),
            end_ms: now.timestamp_millis(),
        }
    }

    /// 시각이 창 안에 있는지
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }
}
