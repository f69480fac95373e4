//! 登出处理器
//!
//! 无会话表：登出是无状态确认，不做任何服务端令牌失效。
//! 吊销集合（TokenRevocationStore）刻意不在这里接线。

use async_trait::async_trait;
use kard_cqrs_core::CommandHandler;
use kard_errors::AppResult;

use crate::application::commands::auth::LogoutCommand;
use crate::application::dto::auth::MessageResponse;

/// 登出处理器
#[derive(Default)]
pub struct LogoutHandler;

impl LogoutHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler<LogoutCommand> for LogoutHandler {
    async fn handle(&self, _command: LogoutCommand) -> AppResult<MessageResponse> {
        Ok(MessageResponse::new("Logged out successfully"))
    }
}
