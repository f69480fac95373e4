//! 重置密码命令

use kard_cqrs_core::Command;

use crate::application::dto::auth::MessageResponse;

/// 重置密码命令（消费重置凭据）
#[derive(Debug, Clone)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Command for ResetPasswordCommand {
    type Result = MessageResponse;
}
