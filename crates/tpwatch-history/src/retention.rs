//! 보존 기간이 지난 런타임 이력 주기적 삭제.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tpwatch_core::error::CoreError;
use tpwatch_core::models::metric::TimeWindow;
use tpwatch_core::ports::history_store::HistoryStore;
use tracing::{debug, info, warn};

/// 보존 정책 스위퍼
pub struct RetentionSweeper {
    store: Arc<dyn HistoryStore>,
    lookback_minutes: u32,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn HistoryStore>, lookback_minutes: u32, interval: Duration) -> Self {
        Self {
            store,
            lookback_minutes,
            interval,
        }
    }

    /// `now − lookback` 이전 레코드 삭제
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize, CoreError> {
        let cutoff = TimeWindow::trailing(now, self.lookback_minutes).start_ms;
        let deleted = self.store.delete_before(cutoff).await?;
        debug!("보존 정책 적용: 기준 {cutoff}, {deleted}건 삭제");
        Ok(deleted)
    }

    /// 종료 신호까지 주기적으로 실행
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "보존 정책 루프 시작: {}분 보존, {}초 주기",
            self.lookback_minutes,
            self.interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once(Utc::now()).await {
                        warn!("보존 정책 적용 실패: {e}");
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("보존 정책 루프 종료");
                    break;
                }
            }
        }
    }
}
