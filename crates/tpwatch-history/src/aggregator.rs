//! 누적 카운터 → 구간 증가량 차트 시계열 변환.
//!
//! 같은 식별 키의 레코드를 timestamp 오름차순으로 받아 필드별 병렬 시계열을
//! 만든다. `completed_task_count`만 이전 원시값과의 차이로 바뀌고 나머지
//! 필드는 그대로 전달된다. 첫 레코드의 증가량은 0이다.

use chrono::{FixedOffset, Offset, TimeZone, Utc};
use tpwatch_core::config::CounterResetPolicy;
use tpwatch_core::models::chart::ChartSeries;
use tpwatch_core::models::metric::MetricRecord;

/// 차트 시각 라벨 형식
const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

/// 증가량 집계기
#[derive(Debug, Clone, Copy)]
pub struct DeltaAggregator {
    reset_policy: CounterResetPolicy,
    label_offset: FixedOffset,
}

impl Default for DeltaAggregator {
    fn default() -> Self {
        Self::new(CounterResetPolicy::default(), 0)
    }
}

impl DeltaAggregator {
    /// 범위를 벗어난 오프셋은 UTC로 대체
    pub fn new(reset_policy: CounterResetPolicy, label_offset_secs: i32) -> Self {
        let label_offset = FixedOffset::east_opt(label_offset_secs).unwrap_or(Utc.fix());
        Self {
            reset_policy,
            label_offset,
        }
    }

    /// 정렬된 레코드 → 차트 시계열 (모든 배열 길이 = 입력 길이)
    pub fn aggregate(&self, records: &[MetricRecord]) -> ChartSeries {
        let mut series = ChartSeries::with_capacity(records.len());
        let mut previous: Option<u64> = None;

        for record in records {
            let delta = match previous {
                None => 0,
                Some(prev) => self.delta(prev, record.completed_task_count),
            };
            previous = Some(record.completed_task_count);

            series.times.push(self.time_label(record.timestamp));
            series.pool_size.push(record.pool_size);
            series.active_size.push(record.active_size);
            series.queue_size.push(record.queue_size);
            series.completed_task_delta.push(delta);
            series.reject_count.push(record.reject_count);
            series
                .queue_remaining_capacity
                .push(record.queue_remaining_capacity);
            series.current_load.push(record.current_load);
            series.queue_capacity.push(record.queue_capacity);
        }

        series
    }

    /// 연속된 두 원시 카운터 값의 증가량
    pub fn delta(&self, previous: u64, current: u64) -> i64 {
        let raw = current as i128 - previous as i128;
        if raw >= 0 {
            return saturate(raw);
        }

        // 감소 = 인스턴스 재시작
        match self.reset_policy {
            CounterResetPolicy::PassThrough => saturate(raw),
            CounterResetPolicy::ClampZero => 0,
            CounterResetPolicy::Rebaseline => saturate(current as i128),
        }
    }

    fn time_label(&self, timestamp_ms: i64) -> String {
        match self.label_offset.timestamp_millis_opt(timestamp_ms).single() {
            Some(at) => at.format(TIME_LABEL_FORMAT).to_string(),
            None => String::new(),
        }
    }
}

fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
