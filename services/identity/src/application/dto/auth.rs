//! 认证响应 DTO

use chrono::{DateTime, Utc};
use kard_auth_core::TokenPair;
use serde::{Deserialize, Serialize};

use crate::domain::user::User;

/// 对外用户投影
///
/// 显式字段白名单。密码哈希、重置凭据（token/expires）和邮箱验证令牌
/// 不在投影内，任何出核的表示都经过这里。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.as_str().to_string(),
            username: user.username.as_str().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            company: user.company.clone(),
            position: user.position.clone(),
            phone: user.phone.clone(),
            role: user.role.to_string(),
            is_active: user.is_active,
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            created_at: user.audit_info.created_at,
            updated_at: user.audit_info.updated_at,
        }
    }
}

/// 认证响应：令牌对 + 用户投影
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub jwt: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthResponse {
    pub fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: UserView::from(user),
            jwt: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
        }
    }
}

/// 通用确认响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
