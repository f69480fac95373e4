//! 服务错误定义

use kard_errors::AppError;
use thiserror::Error;

use crate::domain::value_objects::{EmailError, UsernameError};

/// 认证流程错误
///
/// 安全敏感的失败在这里归一化：调用方拿到的消息不区分
/// 「账号不存在」「密码错误」「账号停用」。
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Terms of use must be accepted")]
    TermsNotAccepted,

    #[error("Registration is disabled")]
    RegistrationDisabled,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::unauthorized("Invalid credentials"),
            AuthError::InvalidRefreshToken => AppError::unauthorized("Invalid refresh token"),
            AuthError::UserNotFound => AppError::not_found("User not found"),
            AuthError::TermsNotAccepted => {
                AppError::validation("Terms of use must be accepted")
            }
            AuthError::RegistrationDisabled => {
                AppError::failed_precondition("Registration is disabled")
            }
            AuthError::PasswordMismatch => AppError::validation("Passwords do not match"),
            AuthError::InvalidResetToken => {
                AppError::validation("Invalid or expired reset token")
            }
            AuthError::WrongCurrentPassword => {
                AppError::validation("Current password is incorrect")
            }
        }
    }
}

impl From<EmailError> for AppError {
    fn from(error: EmailError) -> Self {
        AppError::validation(error.to_string())
    }
}

impl From<UsernameError> for AppError {
    fn from(error: UsernameError) -> Self {
        AppError::validation(error.to_string())
    }
}
