//! 刷新令牌吊销扩展点
//!
//! 观测到的设计不轮换 refresh token：被截获的令牌在自然过期前一直有效。
//! 这里按 jti 暴露吊销集合作为扩展点，Refresh 会查询它；默认实现永不
//! 吊销，也刻意不接入 Logout。

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kard_errors::AppResult;

/// 令牌吊销集合接口
#[async_trait]
pub trait TokenRevocationStore: Send + Sync {
    /// 吊销一个令牌（expires_at 之后条目可以被回收）
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> AppResult<()>;

    /// 查询令牌是否已被吊销
    async fn is_revoked(&self, jti: &str) -> AppResult<bool>;
}

/// 默认实现：不吊销任何令牌
pub struct NoRevocation;

#[async_trait]
impl TokenRevocationStore for NoRevocation {
    async fn revoke(&self, _jti: &str, _expires_at: DateTime<Utc>) -> AppResult<()> {
        Ok(())
    }

    async fn is_revoked(&self, _jti: &str) -> AppResult<bool> {
        Ok(false)
    }
}

/// 进程内吊销集合（测试与单实例部署用）
#[derive(Default)]
pub struct InMemoryRevocationStore {
    revoked: Mutex<HashSet<String>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: &str, _expires_at: DateTime<Utc>) -> AppResult<()> {
        self.revoked.lock().unwrap().insert(jti.to_string());
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AppResult<bool> {
        Ok(self.revoked.lock().unwrap().contains(jti))
    }
}
