//! 스키마 마이그레이션.
//!
//! 버전 기반 SQLite 스키마 관리.

use rusqlite::Connection;
use tracing::{debug, info};

/// 현재 스키마 버전
const CURRENT_VERSION: u32 = 2;

/// 스키마 마이그레이션 실행
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_version(conn)?;
    info!("현재 스키마 버전: {current}, 목표: {CURRENT_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// 현재 스키마 버전 조회
fn get_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    let result: Result<u32, _> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );
    result.or(Ok(0))
}

/// V1: his_run_data 테이블 생성
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V1 실행: his_run_data 테이블");

    conn.execute_batch(
        "
        -- 스레드 풀 런타임 이력 (음수 카운터는 저장 불가)
        CREATE TABLE IF NOT EXISTS his_run_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            tp_id TEXT NOT NULL,
            instance_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            pool_size INTEGER NOT NULL CHECK (pool_size >= 0),
            active_size INTEGER NOT NULL CHECK (active_size >= 0),
            queue_size INTEGER NOT NULL CHECK (queue_size >= 0),
            queue_capacity INTEGER NOT NULL CHECK (queue_capacity >= 0),
            queue_remaining_capacity INTEGER NOT NULL CHECK (queue_remaining_capacity >= 0),
            completed_task_count INTEGER NOT NULL CHECK (completed_task_count >= 0),
            reject_count INTEGER NOT NULL CHECK (reject_count >= 0),
            current_load REAL NOT NULL,
            gmt_create TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_his_run_data_identity
            ON his_run_data(tenant_id, item_id, tp_id, instance_id, timestamp);

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;

    info!("마이그레이션 V1 완료");
    Ok(())
}

/// V2: 보존 정책 삭제용 timestamp 인덱스
fn migrate_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V2 실행: his_run_data.timestamp 인덱스");

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_his_run_data_timestamp ON his_run_data(timestamp);

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;

    info!("마이그레이션 V2 완료");
    Ok(())
}
