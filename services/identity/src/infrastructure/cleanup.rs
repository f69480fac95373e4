//! 周期清理任务
//!
//! 定期清理已过期的密码重置凭据。过期凭据本来就无法消费，清理只是
//! 行级卫生，不改变状态机语义。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kard_common::Clock;

use crate::domain::repositories::UserRepository;

pub struct CleanupTask {
    user_repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl CleanupTask {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            user_repo,
            clock,
            interval,
        }
    }

    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("Cleanup task started");
            let mut ticker = interval(self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cleanup().await;
                    }
                    _ = shutdown.cancelled() => {
                        info!("Cleanup task received shutdown signal");
                        break;
                    }
                }
            }
            info!("Cleanup task stopped");
        })
    }

    async fn run_cleanup(&self) {
        match self
            .user_repo
            .clear_expired_reset_tickets(self.clock.now())
            .await
        {
            Ok(0) => {}
            Ok(cleared) => {
                info!(cleared, "Expired password reset tickets cleared");
            }
            Err(e) => {
                error!(error = %e, "Failed to clear expired reset tickets");
            }
        }
    }
}
