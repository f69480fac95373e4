//! Identity Service
//!
//! 装配认证模块并运行周期维护任务。传输层由网关挂载，不在本进程内。

use std::sync::Arc;
use std::time::Duration;

use identity::application::module::AuthModule;
use identity::domain::repositories::NoRevocation;
use identity::infrastructure::cleanup::CleanupTask;
use identity::infrastructure::persistence::PostgresUserRepository;
use kard_adapter_email::EmailClient;
use kard_adapter_postgres::PostgresConfig;
use kard_bootstrap::{init_runtime, shutdown_signal};
use kard_common::{Clock, SystemClock};
use kard_config::AppConfig;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = AppConfig::load("config")?;

    // 初始化运行时
    init_runtime(&config);

    info!("Starting Identity Service");

    let pg_config = PostgresConfig::new(config.database.url.expose_secret().clone())
        .with_max_connections(config.database.max_connections);
    let pool = kard_adapter_postgres::create_pool(&pg_config).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    kard_adapter_postgres::check_connection(&pool).await?;

    let user_repo = Arc::new(PostgresUserRepository::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let email_sender = Arc::new(EmailClient::new(kard_adapter_email::EmailConfig {
        smtp_host: config.email.smtp_host.clone(),
        smtp_port: config.email.smtp_port,
        username: config.email.username.clone(),
        password: config.email.password.clone(),
        from_email: config.email.from_email.clone(),
        from_name: config.email.from_name.clone(),
        use_tls: config.email.use_tls,
        timeout_secs: config.email.timeout_secs,
    }));

    // 装配认证模块（网关通过它调用全部操作）
    let _auth = AuthModule::new(
        &config,
        user_repo.clone(),
        email_sender,
        Arc::new(NoRevocation),
        clock.clone(),
    );

    info!("Auth module wired");

    // 周期清理过期的重置凭据
    let shutdown = CancellationToken::new();
    let cleanup = Arc::new(CleanupTask::new(
        user_repo,
        clock,
        Duration::from_secs(config.password_reset.sweep_interval_secs),
    ));
    let cleanup_handle = cleanup.start(shutdown.clone());

    shutdown_signal().await;

    shutdown.cancel();
    cleanup_handle.await?;

    Ok(())
}
