//! 修改密码处理器

use std::sync::Arc;

use async_trait::async_trait;
use kard_cqrs_core::CommandHandler;
use kard_errors::{AppError, AppResult};
use tracing::info;

use crate::application::commands::auth::ChangePasswordCommand;
use crate::application::dto::auth::MessageResponse;
use crate::domain::repositories::UserRepository;
use crate::domain::services::PasswordService;
use crate::domain::value_objects::Password;
use crate::error::AuthError;

/// 修改密码处理器（已认证用户，需提供当前密码）
pub struct ChangePasswordHandler {
    user_repo: Arc<dyn UserRepository>,
    password_service: Arc<PasswordService>,
}

impl ChangePasswordHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>, password_service: Arc<PasswordService>) -> Self {
        Self {
            user_repo,
            password_service,
        }
    }
}

#[async_trait]
impl CommandHandler<ChangePasswordCommand> for ChangePasswordHandler {
    async fn handle(&self, command: ChangePasswordCommand) -> AppResult<MessageResponse> {
        if command.new_password != command.confirm_password {
            return Err(AuthError::PasswordMismatch.into());
        }

        Password::validate(&command.new_password).map_err(AppError::from)?;

        let user = self
            .user_repo
            .find_by_id(&command.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .password_service
            .verify(&command.current_password, &user.password_hash)
            .await?
        {
            return Err(AuthError::WrongCurrentPassword.into());
        }

        let new_hash = self.password_service.hash(&command.new_password).await?;
        self.user_repo
            .update_password(&user.id, &new_hash)
            .await?;

        info!(user_id = %user.id, "Password changed");

        Ok(MessageResponse::new("Password changed successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::User;
    use crate::domain::value_objects::{Email, HashedPassword, Username};
    use crate::infrastructure::persistence::InMemoryUserRepository;
    use chrono::Utc;
    use kard_common::UserId;

    struct Fixture {
        repo: Arc<InMemoryUserRepository>,
        handler: ChangePasswordHandler,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryUserRepository::new());

        Fixture {
            handler: ChangePasswordHandler::new(repo.clone(), Arc::new(PasswordService::new())),
            repo,
        }
    }

    async fn seed_user(fixture: &Fixture) -> UserId {
        let user = User::new(
            Email::new("jean@example.com").unwrap(),
            Username::new("jean").unwrap(),
            HashedPassword::from_plain("CurrentPassword1").unwrap(),
            Utc::now(),
        );
        fixture.repo.insert(&user).await.unwrap().id
    }

    fn command(user_id: UserId) -> ChangePasswordCommand {
        ChangePasswordCommand {
            user_id,
            current_password: "CurrentPassword1".to_string(),
            new_password: "NewPassword1".to_string(),
            confirm_password: "NewPassword1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let fixture = fixture();
        let user_id = seed_user(&fixture).await;

        let response = fixture.handler.handle(command(user_id)).await.unwrap();
        assert_eq!(response.message, "Password changed successfully");

        let user = fixture.repo.find_by_id(&user_id).await.unwrap().unwrap();
        assert!(user.password_hash.verify("NewPassword1").unwrap());
    }

    #[tokio::test]
    async fn test_change_password_unknown_user_is_not_found() {
        let fixture = fixture();

        let err = fixture
            .handler
            .handle(command(UserId(999)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_password() {
        let fixture = fixture();
        let user_id = seed_user(&fixture).await;

        let mut cmd = command(user_id);
        cmd.current_password = "WrongPassword1".to_string();

        let err = fixture.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_change_password_mismatched_confirmation() {
        let fixture = fixture();
        let user_id = seed_user(&fixture).await;

        let mut cmd = command(user_id);
        cmd.confirm_password = "Different1".to_string();

        let err = fixture.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
