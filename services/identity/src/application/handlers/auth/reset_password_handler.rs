//! 重置密码处理器

use std::sync::Arc;

use async_trait::async_trait;
use kard_common::Clock;
use kard_cqrs_core::CommandHandler;
use kard_errors::{AppError, AppResult};
use tracing::info;

use crate::application::commands::auth::ResetPasswordCommand;
use crate::application::dto::auth::MessageResponse;
use crate::domain::repositories::UserRepository;
use crate::domain::services::PasswordService;
use crate::domain::value_objects::Password;
use crate::error::AuthError;

/// 重置密码处理器
///
/// 消费是单条原子更新：写入新哈希和清除凭据要么同时发生，要么都不发生。
pub struct ResetPasswordHandler {
    user_repo: Arc<dyn UserRepository>,
    password_service: Arc<PasswordService>,
    clock: Arc<dyn Clock>,
}

impl ResetPasswordHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_service: Arc<PasswordService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            password_service,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<ResetPasswordCommand> for ResetPasswordHandler {
    async fn handle(&self, command: ResetPasswordCommand) -> AppResult<MessageResponse> {
        if command.new_password != command.confirm_password {
            return Err(AuthError::PasswordMismatch.into());
        }

        Password::validate(&command.new_password).map_err(AppError::from)?;

        let new_hash = self.password_service.hash(&command.new_password).await?;

        // 凭据不存在、不匹配或已过期走同一条失败路径；失败不触碰凭据
        let consumed = self
            .user_repo
            .consume_reset_ticket(&command.token, &new_hash, self.clock.now())
            .await?;

        if !consumed {
            return Err(AuthError::InvalidResetToken.into());
        }

        info!("Password reset completed");

        Ok(MessageResponse::new("Password has been reset successfully"))
    }
}
