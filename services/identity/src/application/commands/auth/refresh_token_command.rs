//! 刷新令牌命令

use kard_cqrs_core::Command;

use crate::application::dto::auth::AuthResponse;

/// 刷新令牌命令
#[derive(Debug, Clone)]
pub struct RefreshTokenCommand {
    pub refresh_token: String,
}

impl Command for RefreshTokenCommand {
    type Result = AuthResponse;
}
