//! 登录命令

use kard_cqrs_core::Command;

use crate::application::dto::auth::AuthResponse;

/// 登录命令
///
/// identifier 可以是邮箱或用户名。
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub identifier: String,
    pub password: String,
}

impl Command for LoginCommand {
    type Result = AuthResponse;
}
