//! # tpwatch-app
//!
//! tpwatch 서버 바이너리 진입점.
//! DI 와이어링, 라이프사이클 관리, 보존 정책 루프 실행.

mod lifecycle;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tpwatch_core::config::AppConfig;
use tpwatch_core::config_file::{ConfigFile, CONFIG_FILE_NAME};
use tpwatch_core::ports::history_store::HistoryStore;
use tpwatch_history::aggregator::DeltaAggregator;
use tpwatch_history::dispatch::HandlerRegistry;
use tpwatch_history::ingest::IngestionQueue;
use tpwatch_history::query::QueryService;
use tpwatch_history::recorder::RuntimeHistoryRecorder;
use tpwatch_history::retention::RetentionSweeper;
use tpwatch_history::worker_pool::WorkerPool;
use tpwatch_storage::sqlite::SqliteStorage;
use tpwatch_web::{AppState, WebServer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;

/// DB 파일 이름
const DB_FILE_NAME: &str = "tpwatch.db";

/// 종료 시 백그라운드 태스크 대기 시간
const TASK_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// 스레드 풀 런타임 이력 서버
#[derive(Parser, Debug)]
#[command(name = "tpwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 데이터 저장 디렉토리
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 인메모리 DB 사용 (재시작 시 이력 소실)
    #[arg(long)]
    in_memory: bool,

    /// HTTP 포트
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 수집 워커 수
    #[arg(long)]
    workers: Option<usize>,

    /// 수집 큐 용량
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// 조회/보존 기간 (분)
    #[arg(long)]
    lookback_minutes: Option<u32>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

/// 저장소 위치
#[derive(Debug, Clone, PartialEq, Eq)]
enum StorageTarget {
    InMemory,
    File(PathBuf),
}

/// tracing 초기화 (RUST_LOG가 있으면 우선)
fn init_tracing(log_level: &str) {
    let log_filter = [
        "tpwatch",
        "tpwatch_app",
        "tpwatch_core",
        "tpwatch_storage",
        "tpwatch_history",
        "tpwatch_web",
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{target}={log_level}"))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

/// 설정 파일 로드: `--config` > `--data-dir`/config.json > 플랫폼 설정 디렉토리
fn load_config_file(args: &Args) -> Result<ConfigFile> {
    let path = match (&args.config, &args.data_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(CONFIG_FILE_NAME),
        (None, None) => default_config_dir().join(CONFIG_FILE_NAME),
    };

    ConfigFile::load_or_create(&path)
        .with_context(|| format!("설정 파일 로드 실패: {}", path.display()))
}

/// 플랫폼별 설정 디렉토리 (없으면 현재 디렉토리)
fn default_config_dir() -> PathBuf {
    ProjectDirs::from("io", "tpwatch", "server")
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// CLI 인자로 설정 오버라이드 후 검증
fn apply_overrides(mut config: AppConfig, args: &Args) -> Result<AppConfig> {
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(workers) = args.workers {
        config.ingest.workers = workers;
    }
    if let Some(capacity) = args.queue_capacity {
        config.ingest.queue_capacity = capacity;
    }
    if let Some(minutes) = args.lookback_minutes {
        config.history.lookback_minutes = minutes;
    }

    config.validate().context("설정 검증 실패")?;
    Ok(config)
}

/// 플랫폼별 기본 데이터 디렉토리
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/io.tpwatch.server`
/// - Windows: `%APPDATA%\tpwatch\server\data`
/// - Linux: `~/.local/share/tpwatch`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("io", "tpwatch", "server")
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 저장소 위치 결정: `--in-memory` > `--data-dir` > 설정 파일 > 플랫폼 기본
fn resolve_storage_target(args: &Args, config: &AppConfig) -> StorageTarget {
    if args.in_memory {
        return StorageTarget::InMemory;
    }
    if let Some(dir) = &args.data_dir {
        return StorageTarget::File(dir.join(DB_FILE_NAME));
    }
    if let Some(path) = &config.storage.db_path {
        return StorageTarget::File(path.clone());
    }
    StorageTarget::File(default_data_dir().join(DB_FILE_NAME))
}

fn open_storage(target: &StorageTarget) -> Result<Arc<SqliteStorage>> {
    let storage = match target {
        StorageTarget::InMemory => {
            warn!("인메모리 DB 사용: 재시작 시 이력이 사라집니다");
            SqliteStorage::open_in_memory()?
        }
        StorageTarget::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("데이터 디렉토리 생성 실패: {}", parent.display())
                    })?;
                }
            }
            SqliteStorage::open(path)?
        }
    };
    Ok(Arc::new(storage))
}

/// 조립된 서비스 묶음
struct Services {
    pool: Arc<WorkerPool>,
    state: AppState,
    sweeper: Option<RetentionSweeper>,
}

/// 어댑터 생성 (DI 와이어링) — tokio 런타임 안에서 호출
fn build_services(config: &AppConfig, store: Arc<dyn HistoryStore>) -> Services {
    let recorder = Arc::new(RuntimeHistoryRecorder::new(store.clone()));
    let registry = HandlerRegistry::new().with_handler(recorder);
    let pool = Arc::new(WorkerPool::start(
        config.ingest.workers,
        config.ingest.queue_capacity,
    ));

    let aggregator = DeltaAggregator::new(
        config.history.counter_reset_policy,
        config.history.time_label_offset_secs,
    );

    let state = AppState {
        query: QueryService::new(store.clone(), aggregator, config.history.lookback_minutes),
        ingest: IngestionQueue::new(pool.clone(), Arc::new(registry)),
    };

    let sweeper = config.history.clean_enabled.then(|| {
        RetentionSweeper::new(store, config.history.lookback_minutes, config.clean_interval())
    });

    Services {
        pool,
        state,
        sweeper,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("tpwatch 시작");

    // ── 설정 ──
    let config_file = load_config_file(&args)?;
    info!("설정 파일: {}", config_file.path().display());
    let config = apply_overrides(config_file.config().clone(), &args)?;

    info!(
        "조회 기간 {}분, 워커 {}개, 큐 용량 {}, 카운터 리셋 정책 {:?}",
        config.history.lookback_minutes,
        config.ingest.workers,
        config.ingest.queue_capacity,
        config.history.counter_reset_policy
    );

    // ── 저장소 ──
    let target = resolve_storage_target(&args, &config);
    let storage = open_storage(&target)?;
    let store: Arc<dyn HistoryStore> = storage.clone();
    info!("저장된 이력: {}건", storage.count_records()?);

    // ── 서비스 ──
    let services = build_services(&config, store);
    let mut lifecycle = LifecycleManager::new();

    if let Some(sweeper) = services.sweeper {
        let shutdown_rx = lifecycle.subscribe();
        lifecycle.track("보존 정책 루프", tokio::spawn(sweeper.run(shutdown_rx)));
    } else {
        info!("보존 정책 비활성화");
    }

    // ── HTTP 서버 ──
    let web_server = WebServer::new(services.state, config.web.clone());
    info!("HTTP API: {}/api/monitor", web_server.url());
    let web_shutdown_rx = lifecycle.subscribe();
    lifecycle.track(
        "HTTP 서버",
        tokio::spawn(async move {
            if let Err(e) = web_server.run(web_shutdown_rx).await {
                error!("HTTP 서버 오류: {e}");
            }
        }),
    );

    info!("tpwatch 실행 중 (Ctrl+C로 종료)");

    // OS 시그널 대기
    if let Err(e) = lifecycle.wait_for_signal().await {
        error!("시그널 핸들러 등록 실패: {e}");
        lifecycle.shutdown();
    }

    lifecycle.join_all(TASK_JOIN_TIMEOUT).await;

    // 큐에 남은 수집 작업 처리 후 워커 종료
    services.pool.shutdown().await;

    info!("tpwatch 종료");
    Ok(())
}
