//! 인바운드 메시지 처리기 포트.
//!
//! 구현: `tpwatch-history` crate (`RuntimeHistoryRecorder`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::message::{Message, MessageType};

/// 메시지 유형별 처리기
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// 처리 대상 메시지 유형
    fn message_type(&self) -> MessageType;

    /// 디코딩된 메시지 처리
    async fn handle(&self, message: Message) -> Result<(), CoreError>;
}
