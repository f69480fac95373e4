//! Username 值对象

use serde::{Deserialize, Serialize};
use std::fmt;

/// Username 值对象
///
/// 用户名在注册时从邮箱本地部分派生，因此字母表包含点号。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(pub String);

impl Username {
    /// 创建新的 Username
    pub fn new(username: impl Into<String>) -> Result<Self, UsernameError> {
        let username = username.into();

        Self::validate(&username)?;

        Ok(Self(username))
    }

    /// 验证用户名格式
    fn validate(username: &str) -> Result<(), UsernameError> {
        let length = username.chars().count();

        if length == 0 {
            return Err(UsernameError::Empty);
        }

        if length > 64 {
            return Err(UsernameError::TooLong);
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(UsernameError::InvalidCharacters);
        }

        // 必须以字母或数字开头
        if let Some(first_char) = username.chars().next() {
            if !first_char.is_alphanumeric() {
                return Err(UsernameError::InvalidStart);
            }
        }

        Ok(())
    }

    /// 获取字符串引用
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Username 错误
#[derive(Debug, thiserror::Error)]
pub enum UsernameError {
    #[error("Username must not be empty")]
    Empty,

    #[error("Username is too long (maximum 64 characters)")]
    TooLong,

    #[error(
        "Username contains invalid characters (only alphanumeric, dot, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,

    #[error("Username must start with an alphanumeric character")]
    InvalidStart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(Username::new("jean").is_ok());
        assert!(Username::new("jean.dupont").is_ok());
        assert!(Username::new("jean_dupont-2").is_ok());
        assert!(Username::new("a").is_ok());
        assert!(Username::new("jean1").is_ok());
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(Username::new("").is_err());
        assert!(Username::new("jean dupont").is_err());
        assert!(Username::new("jean@dupont").is_err());
        assert!(Username::new(".jean").is_err());
        assert!(Username::new("x".repeat(65)).is_err());
    }
}
