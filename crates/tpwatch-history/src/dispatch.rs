//! 메시지 유형별 처리기 라우팅.

use std::collections::HashMap;
use std::sync::Arc;
use tpwatch_core::error::CoreError;
use tpwatch_core::models::message::{Message, MessageType};
use tpwatch_core::ports::message_handler::MessageHandler;
use tracing::{debug, warn};

/// 메시지 유형 → 처리기 레지스트리
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageType, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 처리기 등록 (같은 유형이 있으면 교체)
    pub fn with_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handlers.insert(handler.message_type(), handler);
        self
    }

    /// 유형에 맞는 처리기로 전달
    ///
    /// 처리기가 없는 유형은 경고 로그 후 버린다.
    pub async fn dispatch(&self, message: Message) -> Result<(), CoreError> {
        let Some(handler) = self.handlers.get(&message.message_type) else {
            warn!(
                "지원하지 않는 메시지 유형 무시: {} (group_key={})",
                message.message_type, message.group_key
            );
            return Ok(());
        };

        debug!(
            "메시지 처리: {} (group_key={}, 페이로드 {}개)",
            message.message_type,
            message.group_key,
            message.messages.len()
        );
        handler.handle(message).await
    }
}
