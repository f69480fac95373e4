//! 密码服务
//!
//! 哈希是 CPU 密集操作，放到 blocking 线程池执行，不占用调度线程。

use kard_errors::{AppError, AppResult};

use crate::domain::value_objects::HashedPassword;

/// 密码服务
pub struct PasswordService;

impl PasswordService {
    pub fn new() -> Self {
        Self
    }

    /// 哈希密码
    pub async fn hash(&self, password: &str) -> AppResult<HashedPassword> {
        let password = password.to_string();

        tokio::task::spawn_blocking(move || HashedPassword::from_plain(&password))
            .await
            .map_err(|e| AppError::internal(format!("Task join error: {}", e)))?
            .map_err(Into::into)
    }

    /// 验证密码
    pub async fn verify(&self, password: &str, hash: &HashedPassword) -> AppResult<bool> {
        let password = password.to_string();
        let hash = hash.clone();

        tokio::task::spawn_blocking(move || hash.verify(&password))
            .await
            .map_err(|e| AppError::internal(format!("Task join error: {}", e)))?
            .map_err(Into::into)
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}
