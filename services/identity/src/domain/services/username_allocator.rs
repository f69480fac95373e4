//! 用户名分配
//!
//! 用户名从邮箱本地部分派生；冲突时追加递增数字后缀。探测有上界，
//! 超出后返回 ResourceExhausted，而不是无限重试。最终仲裁仍然是
//! 存储层的唯一约束。

use std::sync::Arc;

use kard_errors::{AppError, AppResult};

use crate::domain::repositories::UserRepository;
use crate::domain::value_objects::{Email, Username};

/// 后缀探测上界
pub const MAX_USERNAME_ATTEMPTS: u32 = 100;

// 派生基名截断长度：留出数字后缀空间（64 - 后缀位数）
const MAX_BASE_LENGTH: usize = 60;

/// 用户名分配器
pub struct UsernameAllocator {
    user_repo: Arc<dyn UserRepository>,
}

impl UsernameAllocator {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 为新账号分配唯一用户名
    pub async fn allocate(&self, email: &Email) -> AppResult<Username> {
        let base = Self::derive_base(email);

        for attempt in 0..MAX_USERNAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{}{}", base, attempt)
            };

            if !self.user_repo.username_exists(&candidate).await? {
                return Username::new(candidate).map_err(Into::into);
            }
        }

        Err(AppError::resource_exhausted(
            "Unable to allocate a unique username",
        ))
    }

    /// 从邮箱本地部分派生基名
    ///
    /// 过滤掉用户名字母表以外的字符（如 `+`），空基名回退为 "user"。
    fn derive_base(email: &Email) -> String {
        let local = email.local_part().unwrap_or_default();

        let filtered: String = local
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .collect();

        let base: String = filtered
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .chars()
            .take(MAX_BASE_LENGTH)
            .collect();

        if base.is_empty() {
            "user".to_string()
        } else {
            base
        }
    }
}
