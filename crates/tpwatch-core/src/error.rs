//! tpwatch 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 타입에서 `From<CoreError>`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증, 저장소, 수집 큐 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 그룹 키를 4개 구성요소로 분리할 수 없음
    #[error("잘못된 그룹 키 '{key}': 구성요소 {parts}개 (4개 필요)")]
    MalformedGroupKey {
        /// 원본 그룹 키
        key: String,
        /// 분리된 구성요소 수
        parts: usize,
    },

    /// 저장소 에러 (쿼리 실패, 트랜잭션 롤백 등)
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 워커 풀 큐 포화
    #[error("워커 풀 큐 포화 (용량 {capacity})")]
    QueueFull {
        /// 큐 용량
        capacity: usize,
    },

    /// 워커 풀 종료됨
    #[error("워커 풀이 이미 종료됨")]
    PoolShutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_group_key_display() {
        let err = CoreError::MalformedGroupKey {
            key: "a+b".to_string(),
            parts: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("a+b"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn serde_error_converts() {
        let err: CoreError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
