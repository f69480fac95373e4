//! 注册命令

use kard_cqrs_core::Command;

use crate::application::dto::auth::AuthResponse;

/// 注册命令
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub accept_terms: bool,
}

impl Command for RegisterCommand {
    type Result = AuthResponse;
}
