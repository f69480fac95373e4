//! 用户 Repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kard_common::UserId;
use kard_errors::AppResult;

use crate::domain::user::User;
use crate::domain::value_objects::HashedPassword;

/// 用户仓储接口
///
/// 更新走按操作列出的定向方法，而不是任意字段合并。
/// 唯一性以存储层约束为准：insert 时的约束冲突就是权威的 Conflict 信号。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// 根据邮箱精确查找用户
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 根据邮箱或用户名查找用户（登录标识符，OR 匹配）
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>>;

    /// 检查用户名是否已被占用
    async fn username_exists(&self, username: &str) -> AppResult<bool>;

    /// 插入新用户，返回带存储层分配 ID 的实体
    ///
    /// 邮箱或用户名的唯一约束冲突返回 `Conflict`。
    async fn insert(&self, user: &User) -> AppResult<User>;

    /// 整体更新已验证的实体
    async fn update(&self, user: &User) -> AppResult<()>;

    /// 记录最近一次登录时间
    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// 更新密码哈希
    async fn update_password(&self, id: &UserId, hash: &HashedPassword) -> AppResult<()>;

    /// 写入重置凭据（覆盖任何未消费的旧凭据）
    async fn store_reset_ticket(
        &self,
        id: &UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// 消费重置凭据：单条原子更新
    ///
    /// 精确匹配 token 且未过期时，一次更新写入新哈希并清除凭据两字段，
    /// 返回 true；否则不改动任何行，返回 false。并发消费同一凭据至多
    /// 一个成功。
    async fn consume_reset_ticket(
        &self,
        token: &str,
        new_hash: &HashedPassword,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// 清理已过期的重置凭据，返回清理数量
    async fn clear_expired_reset_tickets(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
