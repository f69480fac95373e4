//! 注销账号处理器
//!
//! 软删除：匿名化 PII 并停用。行保留，账号拥有的名片等资源的引用
//! 不悬空。

use std::sync::Arc;

use async_trait::async_trait;
use kard_common::Clock;
use kard_cqrs_core::CommandHandler;
use kard_errors::AppResult;
use tracing::info;

use crate::application::commands::auth::CloseAccountCommand;
use crate::application::dto::auth::MessageResponse;
use crate::domain::repositories::UserRepository;
use crate::error::AuthError;

/// 注销账号处理器
pub struct CloseAccountHandler {
    user_repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl CloseAccountHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { user_repo, clock }
    }
}

#[async_trait]
impl CommandHandler<CloseAccountCommand> for CloseAccountHandler {
    async fn handle(&self, command: CloseAccountCommand) -> AppResult<MessageResponse> {
        let mut user = self
            .user_repo
            .find_by_id(&command.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.anonymize(self.clock.now());
        self.user_repo.update(&user).await?;

        info!(user_id = %user.id, "Account closed");

        Ok(MessageResponse::new("Account closed successfully"))
    }
}
