//! 인바운드 모니터링 메시지 모델.
//!
//! 리포팅 에이전트가 보내는 래핑된 메시지(`MessageWrapper`)와
//! 디코딩된 도메인 메시지(`Message`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::models::metric::{IdentityKey, MetricRecord};

/// 메시지 유형
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// 스레드 풀 런타임 스냅샷
    Runtime,
    /// 처리기가 없는 유형 (원본 이름 보존)
    Other(String),
}

impl MessageType {
    /// 와이어 이름에서 유형 결정 (대소문자 무시)
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("RUNTIME") {
            Self::Runtime
        } else {
            Self::Other(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Runtime => "RUNTIME",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 인스턴스별 런타임 페이로드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    /// 수집 시각 (epoch 밀리초)
    pub timestamp: i64,
    /// 현재 풀 크기
    #[serde(default)]
    pub pool_size: u64,
    /// 활성 스레드 수
    #[serde(default)]
    pub active_size: u64,
    /// 큐 적재 수
    #[serde(default)]
    pub queue_size: u64,
    /// 큐 용량
    #[serde(default)]
    pub queue_capacity: u64,
    /// 큐 잔여 용량
    #[serde(default)]
    pub queue_remaining_capacity: u64,
    /// 누적 완료 작업 수
    #[serde(default)]
    pub completed_task_count: u64,
    /// 누적 거부 수
    #[serde(default)]
    pub reject_count: u64,
    /// 현재 부하
    #[serde(default)]
    pub current_load: f64,
}

impl RuntimeMessage {
    /// 누적/용량 카운터가 저장 가능한 범위(`i64`)인지 확인
    pub fn check_counters(&self) -> Result<(), CoreError> {
        let counters = [
            ("pool_size", self.pool_size),
            ("active_size", self.active_size),
            ("queue_size", self.queue_size),
            ("queue_capacity", self.queue_capacity),
            ("queue_remaining_capacity", self.queue_remaining_capacity),
            ("completed_task_count", self.completed_task_count),
            ("reject_count", self.reject_count),
        ];
        match counters.iter().find(|(_, v)| i64::try_from(*v).is_err()) {
            Some((field, value)) => Err(CoreError::Validation {
                field: (*field).to_string(),
                message: format!("i64 범위 초과: {value}"),
            }),
            None => Ok(()),
        }
    }

    /// 식별 키를 붙여 저장 레코드로 변환
    pub fn into_record(self, key: &IdentityKey) -> MetricRecord {
        MetricRecord {
            tenant_id: key.tenant_id.clone(),
            item_id: key.item_id.clone(),
            thread_pool_id: key.thread_pool_id.clone(),
            instance_id: key.instance_id.clone(),
            timestamp: self.timestamp,
            pool_size: self.pool_size,
            active_size: self.active_size,
            queue_size: self.queue_size,
            queue_capacity: self.queue_capacity,
            queue_remaining_capacity: self.queue_remaining_capacity,
            completed_task_count: self.completed_task_count,
            reject_count: self.reject_count,
            current_load: self.current_load,
        }
    }
}

/// 래핑된 인바운드 메시지 (와이어 형식)
///
/// 페이로드는 디코딩 전 JSON 값으로 보관되며, 비동기 경계 뒤에서
/// [`MessageWrapper::convert`]로 디코딩된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWrapper {
    /// 메시지 유형 이름 (예: "RUNTIME")
    #[serde(default)]
    pub message_type: String,
    /// 복합 그룹 키 (tpId+itemId+tenantId+instanceId)
    ///
    /// 누락되면 빈 문자열로 받고, 워커에서 키 디코딩 실패로 처리된다.
    #[serde(default)]
    pub group_key: String,
    /// 인스턴스별 페이로드 목록
    #[serde(default)]
    pub content_params: Vec<serde_json::Value>,
}

impl MessageWrapper {
    /// 도메인 메시지로 디코딩
    pub fn convert(self) -> Result<Message, CoreError> {
        let message_type = MessageType::parse(&self.message_type);
        let messages = self
            .content_params
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<RuntimeMessage>, _>>()?;
        for payload in &messages {
            payload.check_counters()?;
        }

        Ok(Message {
            message_type,
            group_key: self.group_key,
            messages,
        })
    }
}

/// 디코딩된 도메인 메시지
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// 메시지 유형
    pub message_type: MessageType,
    /// 복합 그룹 키
    pub group_key: String,
    /// 인스턴스별 페이로드
    pub messages: Vec<RuntimeMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_type_parse() {
        assert_eq!(MessageType::parse("RUNTIME"), MessageType::Runtime);
        assert_eq!(MessageType::parse("runtime"), MessageType::Runtime);
        assert_eq!(
            MessageType::parse("DEPTH"),
            MessageType::Other("DEPTH".to_string())
        );
        assert_eq!(MessageType::Runtime.to_string(), "RUNTIME");
    }

    #[test]
    fn wrapper_converts_payloads() {
        let wrapper: MessageWrapper = serde_json::from_value(json!({
            "message_type": "RUNTIME",
            "group_key": "p1+i1+t1+inst1",
            "content_params": [
                {"timestamp": 1000, "pool_size": 4, "completed_task_count": 10, "current_load": 0.5},
                {"timestamp": 2000, "pool_size": 4, "completed_task_count": 12}
            ]
        }))
        .unwrap();

        let message = wrapper.convert().unwrap();
        assert_eq!(message.message_type, MessageType::Runtime);
        assert_eq!(message.messages.len(), 2);
        assert_eq!(message.messages[1].completed_task_count, 12);
        assert_eq!(message.messages[1].current_load, 0.0);
    }

    #[test]
    fn wrapper_rejects_bad_payload() {
        let wrapper = MessageWrapper {
            message_type: "RUNTIME".to_string(),
            group_key: "p1+i1+t1+inst1".to_string(),
            content_params: vec![json!({"pool_size": "many"})],
        };
        assert!(matches!(
            wrapper.convert(),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn wrapper_rejects_counter_beyond_i64() {
        let wrapper: MessageWrapper = serde_json::from_value(json!({
            "message_type": "RUNTIME",
            "group_key": "p1+i1+t1+inst1",
            "content_params": [
                {"timestamp": 1000, "completed_task_count": 10},
                {"timestamp": 2000, "completed_task_count": u64::MAX}
            ]
        }))
        .unwrap();

        match wrapper.convert() {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field, "completed_task_count"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn wrapper_fields_default_when_missing() {
        let wrapper: MessageWrapper =
            serde_json::from_value(json!({"message_type": "RUNTIME"})).unwrap();
        assert!(wrapper.group_key.is_empty());
        assert!(wrapper.content_params.is_empty());

        let wrapper: MessageWrapper = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            wrapper.convert().unwrap().message_type,
            MessageType::Other(String::new())
        );
    }

    #[test]
    fn runtime_message_into_record() {
        let key = IdentityKey::new("t1", "i1", "p1", "inst1");
        let record = RuntimeMessage {
            timestamp: 42,
            pool_size: 8,
            active_size: 3,
            queue_size: 1,
            queue_capacity: 100,
            queue_remaining_capacity: 99,
            completed_task_count: 500,
            reject_count: 2,
            current_load: 0.375,
        }
        .into_record(&key);

        assert_eq!(record.identity(), key);
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.completed_task_count, 500);
    }
}
