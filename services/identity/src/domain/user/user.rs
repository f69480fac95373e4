//! 用户实体

use chrono::{DateTime, Utc};
use kard_common::{AuditInfo, UserId};
use kard_domain_core::{AggregateRoot, Entity};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Email, HashedPassword, Username};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "moderator" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 用户实体
///
/// 邮箱和用户名在未删除账号中全局唯一。密码哈希从不进入任何对外投影。
/// 重置凭据（token, expires）同一时刻至多一份，重新签发直接覆盖。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: Username,
    pub password_hash: HashedPassword,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    // 邮箱验证
    pub email_verified: bool,
    pub email_verification_token: Option<String>,
    // 密码重置凭据
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub audit_info: AuditInfo,
}

impl User {
    pub fn new(
        email: Email,
        username: Username,
        password_hash: HashedPassword,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::default(),
            email,
            username,
            password_hash,
            first_name: None,
            last_name: None,
            company: None,
            position: None,
            phone: None,
            role: UserRole::default(),
            is_active: true,
            email_verified: false,
            email_verification_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            last_login_at: None,
            audit_info: AuditInfo::new(now),
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.audit_info.touch(now);
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.audit_info.touch(now);
    }

    pub fn update_password(&mut self, password_hash: HashedPassword, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.audit_info.touch(now);
    }

    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) {
        self.email_verified = true;
        self.email_verification_token = None;
        self.audit_info.touch(now);

        tracing::info!(user_id = %self.id, email = %self.email, "Email verified");
    }

    // ========================================================
    // 密码重置凭据
    // ========================================================

    /// 签发重置凭据，覆盖任何未消费的旧凭据
    pub fn issue_reset_ticket(
        &mut self,
        token: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        self.password_reset_token = Some(token);
        self.password_reset_expires = Some(expires_at);
        self.audit_info.touch(now);
    }

    /// 凭据是否匹配且未过期（过期边界：expires_at == now 仍然有效）
    pub fn reset_ticket_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.password_reset_token, self.password_reset_expires) {
            (Some(stored), Some(expires_at)) => stored == token && expires_at >= now,
            _ => false,
        }
    }

    /// 消费成功后清除凭据；失败的尝试不触碰凭据
    pub fn clear_reset_ticket(&mut self, now: DateTime<Utc>) {
        self.password_reset_token = None;
        self.password_reset_expires = None;
        self.audit_info.touch(now);
    }

    // ========================================================
    // 软删除
    // ========================================================

    /// 匿名化账号（硬删除不存在：保留行以维持关联资源的引用完整性）
    pub fn anonymize(&mut self, now: DateTime<Utc>) {
        let stamp = now.timestamp_millis();
        self.email = Email(format!("deleted_{}@deleted.local", stamp));
        self.username = Username(format!("deleted_{}", stamp));
        self.first_name = None;
        self.last_name = None;
        self.company = None;
        self.position = None;
        self.phone = None;
        self.password_reset_token = None;
        self.password_reset_expires = None;
        self.email_verification_token = None;
        self.is_active = false;
        self.audit_info.touch(now);

        tracing::info!(user_id = %self.id, "User account anonymized");
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for User {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

// ============================================================
// 单元测试
// ============================================================
