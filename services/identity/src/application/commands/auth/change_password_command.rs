//! 修改密码命令

use kard_common::UserId;
use kard_cqrs_core::Command;

use crate::application::dto::auth::MessageResponse;

/// 修改密码命令（已认证用户）
#[derive(Debug, Clone)]
pub struct ChangePasswordCommand {
    pub user_id: UserId,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Command for ChangePasswordCommand {
    type Result = MessageResponse;
}
