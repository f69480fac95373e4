//! 请求密码重置命令

use kard_cqrs_core::Command;

use crate::application::dto::auth::MessageResponse;

/// 请求密码重置命令
#[derive(Debug, Clone)]
pub struct RequestPasswordResetCommand {
    pub email: String,
}

impl Command for RequestPasswordResetCommand {
    type Result = MessageResponse;
}
