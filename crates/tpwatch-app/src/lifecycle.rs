//! 라이프사이클 관리.
//!
//! 시작/종료, 시그널 핸들링, 백그라운드 태스크 정리.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
            tasks: Vec::new(),
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 시 대기할 백그라운드 태스크 등록
    pub fn track(&mut self, name: &'static str, handle: JoinHandle<()>) {
        self.tasks.push((name, handle));
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM) 후 종료 신호 발송
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT 수신");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM 수신");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            info!("Ctrl+C 수신");
        }

        self.shutdown();
        Ok(())
    }

    /// 등록된 태스크 종료 대기 (태스크마다 `timeout`)
    pub async fn join_all(&mut self, timeout: Duration) {
        for (name, handle) in self.tasks.drain(..) {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => info!("{name} 종료 완료"),
                Ok(Err(e)) => warn!("{name} 비정상 종료: {e}"),
                Err(_) => warn!("{name} 종료 대기 시간 초과"),
            }
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_creation() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        assert!(!*rx.borrow());
    }

    #[test]
    fn shutdown_signal() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        lm.shutdown();
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn tracked_tasks_stop_on_shutdown() {
        let mut lm = LifecycleManager::new();
        let mut rx = lm.subscribe();
        lm.track(
            "테스트 루프",
            tokio::spawn(async move {
                let _ = rx.changed().await;
            }),
        );

        lm.shutdown();
        lm.join_all(Duration::from_secs(1)).await;
        assert!(lm.tasks.is_empty());
    }

    #[test]
    fn join_all_without_tasks() {
        let mut lm = LifecycleManager::new();
        tokio_test::block_on(lm.join_all(Duration::from_millis(10)));
    }
}
