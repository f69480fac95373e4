//! 登出命令

use kard_cqrs_core::Command;

use crate::application::dto::auth::MessageResponse;

/// 登出命令
#[derive(Debug, Clone, Default)]
pub struct LogoutCommand;

impl Command for LogoutCommand {
    type Result = MessageResponse;
}
