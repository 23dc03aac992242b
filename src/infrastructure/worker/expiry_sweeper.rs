//! Expiry Sweeper - 过期会话后台清理

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::application::ports::SessionRegistryPort;

/// Sweeper 配置
#[derive(Debug, Clone)]
pub struct ExpirySweeperConfig {
    /// 扫描间隔（秒）
    pub interval_secs: u64,
}

impl Default for ExpirySweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// 过期会话清理 Worker
///
/// 与请求入口的惰性过期检查并存，兜底没有触发 beacon 的会话
pub struct ExpirySweeper {
    config: ExpirySweeperConfig,
    registry: Arc<dyn SessionRegistryPort>,
    shutdown: watch::Receiver<bool>,
}

impl ExpirySweeper {
    pub fn new(
        config: ExpirySweeperConfig,
        registry: Arc<dyn SessionRegistryPort>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            registry,
            shutdown,
        }
    }

    /// 执行一次扫描，返回淘汰数量
    pub fn sweep_once(&self) -> usize {
        let evicted = self.registry.sweep_expired(Utc::now());
        if evicted > 0 {
            tracing::info!(
                evicted = evicted,
                remaining = self.registry.len(),
                "Expired preview sessions swept"
            );
        } else {
            tracing::trace!(remaining = self.registry.len(), "Sweep tick, nothing expired");
        }
        evicted
    }

    /// 启动 Worker，直到收到关闭信号
    pub async fn run(mut self) {
        let period = Duration::from_secs(self.config.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval 的第一次 tick 立即完成
        ticker.tick().await;

        tracing::info!(interval_secs = period.as_secs(), "ExpirySweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("ExpirySweeper stopped");
    }
}
