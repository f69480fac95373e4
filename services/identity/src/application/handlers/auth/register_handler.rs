//! 注册处理器

use std::sync::Arc;

use async_trait::async_trait;
use kard_auth_core::TokenService;
use kard_common::Clock;
use kard_config::FeaturesConfig;
use kard_cqrs_core::CommandHandler;
use kard_errors::{AppError, AppResult};
use tracing::info;
use uuid::Uuid;

use crate::application::commands::auth::RegisterCommand;
use crate::application::dto::auth::AuthResponse;
use crate::domain::repositories::UserRepository;
use crate::domain::services::{PasswordService, UsernameAllocator};
use crate::domain::user::User;
use crate::domain::value_objects::{Email, Password};
use crate::error::AuthError;

/// 注册处理器
pub struct RegisterHandler {
    user_repo: Arc<dyn UserRepository>,
    username_allocator: UsernameAllocator,
    password_service: Arc<PasswordService>,
    token_service: Arc<TokenService>,
    features: FeaturesConfig,
    clock: Arc<dyn Clock>,
}

impl RegisterHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_service: Arc<PasswordService>,
        token_service: Arc<TokenService>,
        features: FeaturesConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            username_allocator: UsernameAllocator::new(user_repo.clone()),
            user_repo,
            password_service,
            token_service,
            features,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<RegisterCommand> for RegisterHandler {
    async fn handle(&self, command: RegisterCommand) -> AppResult<AuthResponse> {
        if !self.features.registration_enabled {
            return Err(AuthError::RegistrationDisabled.into());
        }

        if !command.accept_terms {
            return Err(AuthError::TermsNotAccepted.into());
        }

        // 1. 输入验证
        let email = Email::new(&command.email)?;
        Password::validate(&command.password).map_err(AppError::from)?;

        if command.first_name.trim().is_empty() {
            return Err(AppError::validation("First name is required"));
        }
        if command.last_name.trim().is_empty() {
            return Err(AppError::validation("Last name is required"));
        }

        // 2. 预检查：邮箱撞到别人的邮箱或用户名都算冲突
        if self
            .user_repo
            .find_by_identifier(email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "An account with this email already exists",
            ));
        }

        // 3. 派生唯一用户名
        let username = self.username_allocator.allocate(&email).await?;

        // 4. 哈希密码
        let password_hash = self.password_service.hash(&command.password).await?;

        // 5. 创建用户
        let now = self.clock.now();
        let mut user = User::new(email, username, password_hash, now);
        user.first_name = Some(command.first_name);
        user.last_name = Some(command.last_name);
        user.company = command.company;
        user.position = command.position;
        user.phone = command.phone;
        user.email_verified = !self.features.email_verification_required;
        user.email_verification_token = if self.features.email_verification_required {
            Some(Uuid::new_v4().to_string())
        } else {
            None
        };

        // 插入时的唯一约束冲突是权威的 Conflict 信号
        let user = self.user_repo.insert(&user).await?;

        // 6. 签发令牌
        let tokens = self.token_service.issue_pair(
            &user.id,
            user.email.as_str(),
            user.username.as_str(),
            user.role.as_str(),
        )?;

        info!(
            user_id = %user.id,
            username = %user.username,
            "User registered"
        );

        Ok(AuthResponse::new(&user, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::InMemoryUserRepository;
    use chrono::Utc;
    use kard_common::FixedClock;

    fn handler_with(
        repo: Arc<InMemoryUserRepository>,
        features: FeaturesConfig,
    ) -> RegisterHandler {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let token_service = Arc::new(TokenService::new(
            "access-secret",
            "refresh-secret",
            "15m",
            "7d",
            clock.clone(),
        ));

        RegisterHandler::new(
            repo,
            Arc::new(PasswordService::new()),
            token_service,
            features,
            clock,
        )
    }

    fn command(email: &str) -> RegisterCommand {
        RegisterCommand {
            email: email.to_string(),
            password: "Password123".to_string(),
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            company: None,
            position: None,
            phone: None,
            accept_terms: true,
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = handler_with(repo.clone(), FeaturesConfig::default());

        let response = handler.handle(command("jean.dupont@example.com")).await.unwrap();

        assert_eq!(response.user.username, "jean.dupont");
        assert_eq!(response.user.email, "jean.dupont@example.com");
        assert!(response.user.email_verified);
        assert!(!response.jwt.is_empty());
        assert!(!response.refresh_token.is_empty());
        assert!(response.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_register_requires_terms() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = handler_with(repo, FeaturesConfig::default());

        let mut cmd = command("jean@example.com");
        cmd.accept_terms = false;

        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = handler_with(repo, FeaturesConfig::default());

        handler.handle(command("jean@example.com")).await.unwrap();
        let err = handler.handle(command("jean@example.com")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_email_colliding_with_username_conflicts() {
        use crate::domain::user::User;
        use crate::domain::value_objects::{Email, HashedPassword, Username};

        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = handler_with(repo.clone(), FeaturesConfig::default());

        // 存量数据里可能有形如邮箱的用户名；冲突检查按 OR 匹配两列
        let legacy = User {
            username: Username("jean@b.com".to_string()),
            ..User::new(
                Email::new("legacy@a.com").unwrap(),
                Username::new("placeholder").unwrap(),
                HashedPassword::from_hash("$argon2id$hash".to_string()),
                Utc::now(),
            )
        };
        repo.insert(&legacy).await.unwrap();

        let err = handler.handle(command("jean@b.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_same_local_part_gets_suffix() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = handler_with(repo, FeaturesConfig::default());

        let first = handler.handle(command("jean@a.com")).await.unwrap();
        let second = handler.handle(command("jean@b.com")).await.unwrap();

        assert_eq!(first.user.username, "jean");
        assert_eq!(second.user.username, "jean1");
    }

    #[tokio::test]
    async fn test_register_weak_password_rejected() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handler = handler_with(repo, FeaturesConfig::default());

        let mut cmd = command("jean@example.com");
        cmd.password = "weakpass".to_string();

        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_disabled_by_feature_flag() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let features = FeaturesConfig {
            registration_enabled: false,
            email_verification_required: false,
        };
        let handler = handler_with(repo, features);

        let err = handler.handle(command("jean@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn test_register_with_verification_required() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let features = FeaturesConfig {
            registration_enabled: true,
            email_verification_required: true,
        };
        let handler = handler_with(repo.clone(), features);

        let response = handler.handle(command("jean@example.com")).await.unwrap();

        assert!(!response.user.email_verified);
        // 验证令牌已生成但不进入对外投影
        let stored = repo.find_by_email("jean@example.com").await.unwrap().unwrap();
        assert!(stored.email_verification_token.is_some());
    }
}
