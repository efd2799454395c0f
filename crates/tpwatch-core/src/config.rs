//! 애플리케이션 설정 구조체.
//!
//! 이력 조회 창, 보존 정책, 수집 워커 풀 크기, 저장소 경로, 웹 서버 등
//! 런타임 설정을 정의한다. `ConfigFile`을 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 이력 조회/보존 설정
    #[serde(default)]
    pub history: HistoryConfig,
    /// 수집 워커 풀 설정
    #[serde(default)]
    pub ingest: IngestConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 웹 API 설정
    #[serde(default)]
    pub web: WebConfig,
}

// ============================================================
// 이력 설정
// ============================================================

/// 카운터 리셋(인스턴스 재시작) 시 증가량 계산 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterResetPolicy {
    /// 음수 증가량을 그대로 노출
    #[default]
    PassThrough,
    /// 음수 증가량을 0으로 보정
    ClampZero,
    /// 리셋 이후 원시값을 증가량으로 사용 (0부터 다시 센 것으로 간주)
    Rebaseline,
}

/// 이력 조회/보존 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// 조회 가능한 이력 범위 (분) — 보존 기간과 동일
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u32,
    /// 보존 기간 초과 데이터 자동 삭제 여부
    #[serde(default = "default_true")]
    pub clean_enabled: bool,
    /// 자동 삭제 주기 (초)
    #[serde(default = "default_clean_interval_secs")]
    pub clean_interval_secs: u64,
    /// 카운터 리셋 처리 정책
    #[serde(default)]
    pub counter_reset_policy: CounterResetPolicy,
    /// 차트 시각 라벨의 UTC 오프셋 (초)
    #[serde(default)]
    pub time_label_offset_secs: i32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: default_lookback_minutes(),
            clean_enabled: true,
            clean_interval_secs: default_clean_interval_secs(),
            counter_reset_policy: CounterResetPolicy::default(),
            time_label_offset_secs: 0,
        }
    }
}

// ============================================================
// 수집 설정
// ============================================================

/// 수집 워커 풀 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 동시 처리 워커 수
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// 대기 큐 용량 (초과 시 드롭)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ============================================================
// 저장소 / 웹 설정
// ============================================================

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// 웹 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 웹 서버 포트 (기본: 6691)
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부 접근 허용 여부 (false: 127.0.0.1 only)
    #[serde(default)]
    pub allow_external: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            allow_external: false,
        }
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_lookback_minutes() -> u32 {
    30
}

fn default_clean_interval_secs() -> u64 {
    300
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_web_port() -> u16 {
    6691
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            history: HistoryConfig::default(),
            ingest: IngestConfig::default(),
            storage: StorageConfig::default(),
            web: WebConfig::default(),
        }
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.history.lookback_minutes == 0 {
            return Err(CoreError::Validation {
                field: "history.lookback_minutes".to_string(),
                message: "1 이상이어야 합니다".to_string(),
            });
        }
        if self.ingest.workers == 0 {
            return Err(CoreError::Validation {
                field: "ingest.workers".to_string(),
                message: "1 이상이어야 합니다".to_string(),
            });
        }
        if self.ingest.queue_capacity == 0 {
            return Err(CoreError::Validation {
                field: "ingest.queue_capacity".to_string(),
                message: "1 이상이어야 합니다".to_string(),
            });
        }
        if self.history.clean_enabled && self.history.clean_interval_secs == 0 {
            return Err(CoreError::Validation {
                field: "history.clean_interval_secs".to_string(),
                message: "자동 삭제 활성화 시 1 이상이어야 합니다".to_string(),
            });
        }
        Ok(())
    }

    /// 자동 삭제 주기
    pub fn clean_interval(&self) -> Duration {
        Duration::from_secs(self.history.clean_interval_secs)
    }
}
