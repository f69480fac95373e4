//! 登录处理器

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use kard_auth_core::TokenService;
use kard_common::Clock;
use kard_cqrs_core::CommandHandler;
use kard_errors::AppResult;
use tracing::info;

use crate::application::commands::auth::LoginCommand;
use crate::application::dto::auth::AuthResponse;
use crate::domain::repositories::UserRepository;
use crate::domain::services::PasswordService;
use crate::domain::value_objects::HashedPassword;
use crate::error::AuthError;

// 未知标识符也烧一次 verify，让两条 Unauthorized 路径的耗时接近
fn dummy_hash() -> Option<&'static HashedPassword> {
    static DUMMY: OnceLock<Option<HashedPassword>> = OnceLock::new();
    DUMMY
        .get_or_init(|| HashedPassword::from_plain("Timing-Pad-0").ok())
        .as_ref()
}

/// 登录处理器
pub struct LoginHandler {
    user_repo: Arc<dyn UserRepository>,
    password_service: Arc<PasswordService>,
    token_service: Arc<TokenService>,
    clock: Arc<dyn Clock>,
}

impl LoginHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_service: Arc<PasswordService>,
        token_service: Arc<TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            password_service,
            token_service,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<LoginCommand> for LoginHandler {
    async fn handle(&self, command: LoginCommand) -> AppResult<AuthResponse> {
        // 标识符可以是邮箱或用户名
        let user = self
            .user_repo
            .find_by_identifier(&command.identifier)
            .await?;

        let mut user = match user {
            Some(user) => user,
            None => {
                if let Some(hash) = dummy_hash() {
                    let _ = self.password_service.verify(&command.password, hash).await;
                }
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        // 「账号不存在」与「密码错误」对调用方不可区分
        if !self
            .password_service
            .verify(&command.password, &user.password_hash)
            .await?
        {
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.is_active {
            return Err(kard_errors::AppError::unauthorized("Account disabled"));
        }

        let now = self.clock.now();
        user.record_login(now);
        self.user_repo.record_login(&user.id, now).await?;

        let tokens = self.token_service.issue_pair(
            &user.id,
            user.email.as_str(),
            user.username.as_str(),
            user.role.as_str(),
        )?;

        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse::new(&user, tokens))
    }
}
