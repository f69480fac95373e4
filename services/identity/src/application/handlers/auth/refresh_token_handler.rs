//! 刷新令牌处理器
//!
//! refresh token 不轮换：同一令牌在自身过期前持续有效。吊销集合是
//! 扩展点，默认实现永不命中。

use std::sync::Arc;

use async_trait::async_trait;
use kard_auth_core::TokenService;
use kard_cqrs_core::CommandHandler;
use kard_errors::AppResult;
use tracing::{debug, info};

use crate::application::commands::auth::RefreshTokenCommand;
use crate::application::dto::auth::AuthResponse;
use crate::domain::repositories::{TokenRevocationStore, UserRepository};
use crate::error::AuthError;

/// 刷新令牌处理器
pub struct RefreshTokenHandler {
    user_repo: Arc<dyn UserRepository>,
    token_service: Arc<TokenService>,
    revocation_store: Arc<dyn TokenRevocationStore>,
}

impl RefreshTokenHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        token_service: Arc<TokenService>,
        revocation_store: Arc<dyn TokenRevocationStore>,
    ) -> Self {
        Self {
            user_repo,
            token_service,
            revocation_store,
        }
    }
}

#[async_trait]
impl CommandHandler<RefreshTokenCommand> for RefreshTokenHandler {
    async fn handle(&self, command: RefreshTokenCommand) -> AppResult<AuthResponse> {
        // 签名错误与过期在内部可区分，对调用方统一为一种失败
        let claims = self
            .token_service
            .validate_refresh_token(&command.refresh_token)
            .map_err(|e| {
                debug!(error = %e, "Refresh token rejected");
                AuthError::InvalidRefreshToken
            })?;

        if self.revocation_store.is_revoked(&claims.jti).await? {
            debug!(jti = %claims.jti, "Refresh token revoked");
            return Err(AuthError::InvalidRefreshToken.into());
        }

        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !user.is_active {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        let tokens = self.token_service.issue_pair(
            &user.id,
            user.email.as_str(),
            user.username.as_str(),
            user.role.as_str(),
        )?;

        info!(user_id = %user.id, "Token pair refreshed");

        Ok(AuthResponse::new(&user, tokens))
    }
}
