//! 请求密码重置处理器

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use kard_adapter_email::EmailSender;
use kard_common::Clock;
use kard_cqrs_core::CommandHandler;
use kard_errors::AppResult;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::commands::auth::RequestPasswordResetCommand;
use crate::application::dto::auth::MessageResponse;
use crate::domain::repositories::UserRepository;
use crate::domain::value_objects::Email;

/// 统一确认消息：无论邮箱是否注册都逐字节相同，防止账号枚举
pub const RESET_ACK_MESSAGE: &str =
    "If that email address is registered, a password reset link has been sent";

/// 请求密码重置处理器
pub struct RequestPasswordResetHandler {
    user_repo: Arc<dyn UserRepository>,
    email_sender: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    expires_in_minutes: i64,
    reset_link_base_url: String,
}

impl RequestPasswordResetHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        email_sender: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        expires_in_minutes: i64,
        reset_link_base_url: impl Into<String>,
    ) -> Self {
        Self {
            user_repo,
            email_sender,
            clock,
            expires_in_minutes,
            reset_link_base_url: reset_link_base_url.into(),
        }
    }
}

#[async_trait]
impl CommandHandler<RequestPasswordResetCommand> for RequestPasswordResetHandler {
    async fn handle(&self, command: RequestPasswordResetCommand) -> AppResult<MessageResponse> {
        // 非法邮箱与未注册邮箱同路径：返回统一确认
        let email = match Email::new(&command.email) {
            Ok(email) => email,
            Err(_) => {
                info!("Password reset requested with malformed email");
                return Ok(MessageResponse::new(RESET_ACK_MESSAGE));
            }
        };

        let user = match self.user_repo.find_by_email(email.as_str()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!("Password reset requested for unknown email");
                return Ok(MessageResponse::new(RESET_ACK_MESSAGE));
            }
            Err(e) => {
                // 存储故障也不改变对外响应
                warn!(error = %e, "Password reset lookup failed");
                return Ok(MessageResponse::new(RESET_ACK_MESSAGE));
            }
        };

        // 新凭据覆盖任何未消费的旧凭据
        let now = self.clock.now();
        let token = Uuid::new_v4().to_string();
        let expires_at = now + Duration::minutes(self.expires_in_minutes);

        if let Err(e) = self
            .user_repo
            .store_reset_ticket(&user.id, &token, expires_at)
            .await
        {
            warn!(user_id = %user.id, error = %e, "Failed to store reset ticket");
            return Ok(MessageResponse::new(RESET_ACK_MESSAGE));
        }

        // 投递失败不回滚成功响应
        let reset_link = format!("{}?token={}", self.reset_link_base_url, token);
        let body = format!(
            "Hello,\n\n\
             We received a request to reset the password for your account.\n\
             Follow this link to choose a new password:\n\n\
             {}\n\n\
             The link expires in {} minutes. If you did not request a reset,\n\
             you can safely ignore this email.\n",
            reset_link, self.expires_in_minutes
        );

        if let Err(e) = self
            .email_sender
            .send_text_email(user.email.as_str(), "Password reset request", &body)
            .await
        {
            warn!(user_id = %user.id, error = %e, "Failed to send password reset email");
        } else {
            info!(user_id = %user.id, "Password reset email sent");
        }

        Ok(MessageResponse::new(RESET_ACK_MESSAGE))
    }
}
