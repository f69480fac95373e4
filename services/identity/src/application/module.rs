//! 服务装配
//!
//! 把仓储、时钟和配置装配成整套命令处理器。传输层（网关）只依赖
//! 这里暴露的处理器。

use std::sync::Arc;

use kard_adapter_email::EmailSender;
use kard_auth_core::TokenService;
use kard_common::Clock;
use kard_config::AppConfig;
use secrecy::ExposeSecret;

use crate::application::handlers::auth::{
    ChangePasswordHandler, CloseAccountHandler, LoginHandler, LogoutHandler, RefreshTokenHandler,
    RegisterHandler, RequestPasswordResetHandler, ResetPasswordHandler,
};
use crate::domain::repositories::{TokenRevocationStore, UserRepository};
use crate::domain::services::PasswordService;

/// 认证模块：全部对外操作的处理器集合
pub struct AuthModule {
    pub register: RegisterHandler,
    pub login: LoginHandler,
    pub refresh: RefreshTokenHandler,
    pub logout: LogoutHandler,
    pub request_password_reset: RequestPasswordResetHandler,
    pub reset_password: ResetPasswordHandler,
    pub change_password: ChangePasswordHandler,
    pub close_account: CloseAccountHandler,
}

impl AuthModule {
    pub fn new(
        config: &AppConfig,
        user_repo: Arc<dyn UserRepository>,
        email_sender: Arc<dyn EmailSender>,
        revocation_store: Arc<dyn TokenRevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let token_service = Arc::new(TokenService::new(
            config.jwt.secret.expose_secret(),
            config.jwt.refresh_secret.expose_secret(),
            config.jwt.expires_in.clone(),
            config.jwt.refresh_expires_in.clone(),
            clock.clone(),
        ));
        let password_service = Arc::new(PasswordService::new());

        Self {
            register: RegisterHandler::new(
                user_repo.clone(),
                password_service.clone(),
                token_service.clone(),
                config.features.clone(),
                clock.clone(),
            ),
            login: LoginHandler::new(
                user_repo.clone(),
                password_service.clone(),
                token_service.clone(),
                clock.clone(),
            ),
            refresh: RefreshTokenHandler::new(
                user_repo.clone(),
                token_service.clone(),
                revocation_store,
            ),
            logout: LogoutHandler::new(),
            request_password_reset: RequestPasswordResetHandler::new(
                user_repo.clone(),
                email_sender,
                clock.clone(),
                config.password_reset.token_expires_minutes,
                config.password_reset.reset_link_base_url.clone(),
            ),
            reset_password: ResetPasswordHandler::new(
                user_repo.clone(),
                password_service.clone(),
                clock.clone(),
            ),
            change_password: ChangePasswordHandler::new(user_repo.clone(), password_service),
            close_account: CloseAccountHandler::new(user_repo, clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::auth::RegisterCommand;
    use crate::domain::repositories::NoRevocation;
    use crate::infrastructure::persistence::InMemoryUserRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use kard_common::FixedClock;
    use kard_config::{
        AppConfig, DatabaseConfig, EmailConfig, FeaturesConfig, JwtConfig, PasswordResetConfig,
        TelemetryConfig,
    };
    use kard_cqrs_core::CommandHandler;
    use kard_errors::AppResult;
    use secrecy::Secret;

    struct NullEmailSender;

    #[async_trait]
    impl kard_adapter_email::EmailSender for NullEmailSender {
        async fn send_text_email(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
            Ok(())
        }

        async fn send_html_email(
            &self,
            _to: &str,
            _subject: &str,
            _html_body: &str,
            _text_body: Option<&str>,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            app_name: "kard-identity".to_string(),
            app_env: "test".to_string(),
            database: DatabaseConfig {
                url: Secret::new("postgres://localhost/test".to_string()),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: Secret::new("access-secret".to_string()),
                refresh_secret: Secret::new("refresh-secret".to_string()),
                expires_in: "15m".to_string(),
                refresh_expires_in: "7d".to_string(),
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            email: EmailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: 587,
                username: "noreply@kard.app".to_string(),
                password: Secret::new("password".to_string()),
                from_email: "noreply@kard.app".to_string(),
                from_name: "Kard".to_string(),
                use_tls: false,
                timeout_secs: 30,
            },
            password_reset: PasswordResetConfig {
                token_expires_minutes: 60,
                sweep_interval_secs: 3600,
                reset_link_base_url: "https://app.kard.app/reset-password".to_string(),
            },
            features: FeaturesConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_module_wires_a_working_stack() {
        let config = test_config();
        let module = AuthModule::new(
            &config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(NullEmailSender),
            Arc::new(NoRevocation),
            Arc::new(FixedClock::new(Utc::now())),
        );

        let response = module
            .register
            .handle(RegisterCommand {
                email: "jean@example.com".to_string(),
                password: "Password123".to_string(),
                first_name: "Jean".to_string(),
                last_name: "Dupont".to_string(),
                company: None,
                position: None,
                phone: None,
                accept_terms: true,
            })
            .await
            .unwrap();

        assert_eq!(response.user.username, "jean");
    }
}
