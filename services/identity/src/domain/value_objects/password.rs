//! Password 值对象
//!
//! 注册口令策略：至少 8 位，包含小写、大写和数字各一。
//! 哈希使用 Argon2，验证走哈希方案自带的 verify 原语。

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 最小口令长度
const MIN_PASSWORD_LENGTH: usize = 8;
/// 最大口令长度
const MAX_PASSWORD_LENGTH: usize = 128;

/// 哈希后的密码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword(pub String);

impl HashedPassword {
    /// 从明文密码创建哈希密码
    pub fn from_plain(plain_password: &str) -> Result<Self, PasswordError> {
        Password::validate(plain_password)?;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(Self(password_hash))
    }

    /// 验证明文密码是否匹配
    pub fn verify(&self, plain_password: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// 从已有的哈希字符串创建
    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    /// 获取字符串引用
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// 明文密码（仅用于验证）
pub struct Password(String);

impl Password {
    /// 创建新的 Password（验证后）
    pub fn new(password: impl Into<String>) -> Result<Self, PasswordError> {
        let password = password.into();
        Self::validate(&password)?;
        Ok(Self(password))
    }

    /// 获取字符串引用
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 验证口令策略
    pub fn validate(password: &str) -> Result<(), PasswordError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
        }

        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong(MAX_PASSWORD_LENGTH));
        }

        let has_lowercase = password.chars().any(|c| c.is_lowercase());
        let has_uppercase = password.chars().any(|c| c.is_uppercase());
        let has_digit = password.chars().any(|c| c.is_numeric());

        if !(has_lowercase && has_uppercase && has_digit) {
            return Err(PasswordError::TooWeak);
        }

        Ok(())
    }
}

/// Password 错误
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password is too short (minimum {0} characters)")]
    TooShort(usize),

    #[error("Password is too long (maximum {0} characters)")]
    TooLong(usize),

    #[error("Password must contain at least one lowercase letter, one uppercase letter, and one digit")]
    TooWeak,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

impl From<PasswordError> for kard_errors::AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailed(msg) => kard_errors::AppError::internal(msg),
            other => kard_errors::AppError::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_valid_password() {
        assert!(Password::validate("Password123").is_ok());
        assert!(Password::new("Sommet2Neige").is_ok());
    }

    #[test]
    fn test_policy_rejects_short_password() {
        assert!(matches!(
            Password::validate("Pw1"),
            Err(PasswordError::TooShort(_))
        ));
    }

    #[test]
    fn test_policy_rejects_missing_character_classes() {
        // 无大写
        assert!(matches!(
            Password::validate("password123"),
            Err(PasswordError::TooWeak)
        ));
        // 无数字
        assert!(matches!(
            Password::validate("PasswordOnly"),
            Err(PasswordError::TooWeak)
        ));
        // 无小写
        assert!(matches!(
            Password::validate("PASSWORD123"),
            Err(PasswordError::TooWeak)
        ));
    }

    #[test]
    fn test_policy_rejects_overlong_password() {
        let long = format!("Aa1{}", "x".repeat(130));
        assert!(matches!(
            Password::validate(&long),
            Err(PasswordError::TooLong(_))
        ));
    }

    #[test]
    fn test_hash_verify_round_trip() {
        let hash = HashedPassword::from_plain("Password123").unwrap();

        assert!(hash.verify("Password123").unwrap());
        assert!(!hash.verify("WrongPassword1").unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let first = HashedPassword::from_plain("Password123").unwrap();
        let second = HashedPassword::from_plain("Password123").unwrap();

        assert_ne!(first.0, second.0);
    }

    #[test]
    fn test_display_is_redacted() {
        let hash = HashedPassword::from_plain("Password123").unwrap();
        assert_eq!(format!("{}", hash), "[REDACTED]");
    }
}
