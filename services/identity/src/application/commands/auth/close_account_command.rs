//! 注销账号命令

use kard_common::UserId;
use kard_cqrs_core::Command;

use crate::application::dto::auth::MessageResponse;

/// 注销账号命令（软删除：匿名化并停用）
#[derive(Debug, Clone)]
pub struct CloseAccountCommand {
    pub user_id: UserId,
}

impl Command for CloseAccountCommand {
    type Result = MessageResponse;
}
