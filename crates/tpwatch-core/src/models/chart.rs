//! 차트용 시계열 모델.

use serde::{Deserialize, Serialize};

/// 차트 렌더링용 병렬 시계열
///
/// 모든 배열은 인덱스 정렬되어 있으며 길이가 같다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// 시각 라벨 (HH:MM:SS)
    pub times: Vec<String>,
    pub pool_size: Vec<u64>,
    pub active_size: Vec<u64>,
    pub queue_size: Vec<u64>,
    /// 구간별 완료 작업 증가량 (첫 샘플은 0)
    pub completed_task_delta: Vec<i64>,
    /// 누적 거부 수 (원시값)
    pub reject_count: Vec<u64>,
    pub queue_remaining_capacity: Vec<u64>,
    pub current_load: Vec<f64>,
    pub queue_capacity: Vec<u64>,
}

impl ChartSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            times: Vec::with_capacity(capacity),
            pool_size: Vec::with_capacity(capacity),
            active_size: Vec::with_capacity(capacity),
            queue_size: Vec::with_capacity(capacity),
            completed_task_delta: Vec::with_capacity(capacity),
            reject_count: Vec::with_capacity(capacity),
            queue_remaining_capacity: Vec::with_capacity(capacity),
            current_load: Vec::with_capacity(capacity),
            queue_capacity: Vec::with_capacity(capacity),
        }
    }

    /// 샘플 수
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
