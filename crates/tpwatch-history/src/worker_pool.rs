//! 크기 제한 워커 풀.
//!
//! 고정 수의 tokio 워커가 용량 제한 큐에서 작업을 꺼내 실행한다.
//! 제출은 절대 대기하지 않으며, 큐가 가득 차면 즉시 [`SubmitError::Full`]을 반환한다.
//! 프로세스 시작 시 명시적으로 생성하고 종료 시 [`WorkerPool::shutdown`]으로 정리한다.

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tpwatch_core::error::CoreError;
use tracing::{debug, error, info};

/// 워커가 실행하는 작업 단위
pub type Job = Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + 'static>>;

/// 작업 제출 실패
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// 큐 포화
    #[error("워커 풀 큐 포화 (용량 {capacity})")]
    Full {
        /// 큐 용량
        capacity: usize,
    },

    /// 풀 종료됨
    #[error("워커 풀이 종료됨")]
    Closed,
}

impl From<SubmitError> for CoreError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Full { capacity } => CoreError::QueueFull { capacity },
            SubmitError::Closed => CoreError::PoolShutdown,
        }
    }
}

/// 워커 풀 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// 워커 수
    pub workers: usize,
    /// 큐 용량
    pub queue_capacity: usize,
    /// 큐에 들어간 작업 수
    pub accepted: u64,
    /// 포화/종료로 거부된 작업 수
    pub rejected: u64,
    /// 성공 완료된 작업 수
    pub completed: u64,
    /// 에러/패닉으로 끝난 작업 수
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// 크기 제한 워커 풀
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    workers: usize,
    queue_capacity: usize,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// 워커 풀 시작 (tokio 런타임 안에서 호출)
    ///
    /// `workers`, `queue_capacity`는 최소 1로 보정된다.
    pub fn start(workers: usize, queue_capacity: usize) -> Self {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);

        let (tx, rx) = mpsc::channel::<Job>(queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let handles = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, rx.clone(), counters.clone())))
            .collect();

        info!("워커 풀 시작: 워커 {workers}개, 큐 용량 {queue_capacity}");

        Self {
            sender: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
            workers,
            queue_capacity,
            counters,
        }
    }

    /// 작업 제출 시도 — 대기 없이 즉시 수락/거부
    pub fn try_submit<F>(&self, job: F) -> Result<(), SubmitError>
    where
        F: Future<Output = Result<(), CoreError>> + Send + 'static,
    {
        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(SubmitError::Closed);
        };

        match sender.try_send(Box::pin(job)) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(SubmitError::Full {
                    capacity: self.queue_capacity,
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(SubmitError::Closed)
            }
        }
    }

    /// 큐 용량
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// 현재 통계
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// 신규 제출을 막고, 대기 중인 작업을 모두 처리한 뒤 워커 종료
    pub async fn shutdown(&self) {
        // 송신자 drop → 큐가 비면 recv()가 None
        drop(self.sender.lock().take());

        let handles = std::mem::take(&mut *self.handles.lock());
        if handles.is_empty() {
            return;
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("워커 종료 대기 실패: {e}");
            }
        }

        let stats = self.stats();
        info!(
            "워커 풀 종료: 수락 {}, 거부 {}, 완료 {}, 실패 {}",
            stats.accepted, stats.rejected, stats.completed, stats.failed
        );
    }
}

async fn run_worker(
    id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    counters: Arc<Counters>,
) {
    debug!("워커 {id} 시작");

    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            break;
        };

        match AssertUnwindSafe(job).catch_unwind().await {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(_)) => {
                // 에러 로그는 작업 쪽에서 컨텍스트와 함께 남김
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                error!("워커 {id}: 작업 패닉");
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    debug!("워커 {id} 종료");
}
