//! 런타임 이력 스토리지 (HistoryStore 포트 구현).

use async_trait::async_trait;
use rusqlite::{params, Row};
use tpwatch_core::error::CoreError;
use tpwatch_core::models::metric::{IdentityKey, MetricRecord, TimeWindow};
use tpwatch_core::ports::history_store::HistoryStore;
use tracing::{debug, info};

use super::SqliteStorage;

const SELECT_COLUMNS: &str = "tenant_id, item_id, tp_id, instance_id, timestamp,
    pool_size, active_size, queue_size, queue_capacity, queue_remaining_capacity,
    completed_task_count, reject_count, current_load";

fn map_record(row: &Row<'_>) -> rusqlite::Result<MetricRecord> {
    Ok(MetricRecord {
        tenant_id: row.get(0)?,
        item_id: row.get(1)?,
        thread_pool_id: row.get(2)?,
        instance_id: row.get(3)?,
        timestamp: row.get(4)?,
        pool_size: row.get::<_, i64>(5)? as u64,
        active_size: row.get::<_, i64>(6)? as u64,
        queue_size: row.get::<_, i64>(7)? as u64,
        queue_capacity: row.get::<_, i64>(8)? as u64,
        queue_remaining_capacity: row.get::<_, i64>(9)? as u64,
        completed_task_count: row.get::<_, i64>(10)? as u64,
        reject_count: row.get::<_, i64>(11)? as u64,
        current_load: row.get(12)?,
    })
}

/// u64 카운터 → SQLite INTEGER. i64 범위를 넘으면 배치 전체가 실패한다.
fn sql_count(field: &str, value: u64) -> Result<i64, CoreError> {
    i64::try_from(value).map_err(|_| CoreError::Validation {
        field: field.to_string(),
        message: format!("i64 범위 초과: {value}"),
    })
}

#[async_trait]
impl HistoryStore for SqliteStorage {
    async fn range_query(
        &self,
        key: &IdentityKey,
        window: TimeWindow,
    ) -> Result<Vec<MetricRecord>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {SELECT_COLUMNS} FROM his_run_data
                 WHERE tenant_id = ?1 AND item_id = ?2 AND tp_id = ?3 AND instance_id = ?4
                   AND timestamp BETWEEN ?5 AND ?6
                 ORDER BY timestamp ASC, id ASC"
            ))
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let records = stmt
            .query_map(
                params![
                    key.tenant_id,
                    key.item_id,
                    key.thread_pool_id,
                    key.instance_id,
                    window.start_ms,
                    window.end_ms,
                ],
                map_record,
            )
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::Storage(format!("레코드 변환 실패: {e}")))?;

        debug!(
            "이력 조회: {}/{} {}건",
            key.thread_pool_id,
            key.instance_id,
            records.len()
        );
        Ok(records)
    }

    async fn latest(
        &self,
        key: &IdentityKey,
        window: TimeWindow,
    ) -> Result<Option<MetricRecord>, CoreError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM his_run_data
                 WHERE tenant_id = ?1 AND item_id = ?2 AND tp_id = ?3 AND instance_id = ?4
                   AND timestamp BETWEEN ?5 AND ?6
                 ORDER BY timestamp DESC, id DESC
                 LIMIT 1"
            ),
            params![
                key.tenant_id,
                key.item_id,
                key.thread_pool_id,
                key.instance_id,
                window.start_ms,
                window.end_ms,
            ],
            map_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CoreError::Storage(format!("최신 레코드 조회 실패: {e}"))),
        }
    }

    async fn batch_insert(&self, records: &[MetricRecord]) -> Result<usize, CoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;

        // 트랜잭션 drop 시 자동 롤백 → 부분 저장 없음
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::Storage(format!("트랜잭션 시작 실패: {e}")))?;

        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO his_run_data (tenant_id, item_id, tp_id, instance_id, timestamp,
                        pool_size, active_size, queue_size, queue_capacity, queue_remaining_capacity,
                        completed_task_count, reject_count, current_load)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                )
                .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

            for record in records {
                stmt.execute(params![
                    record.tenant_id,
                    record.item_id,
                    record.thread_pool_id,
                    record.instance_id,
                    record.timestamp,
                    sql_count("pool_size", record.pool_size)?,
                    sql_count("active_size", record.active_size)?,
                    sql_count("queue_size", record.queue_size)?,
                    sql_count("queue_capacity", record.queue_capacity)?,
                    sql_count("queue_remaining_capacity", record.queue_remaining_capacity)?,
                    sql_count("completed_task_count", record.completed_task_count)?,
                    sql_count("reject_count", record.reject_count)?,
                    record.current_load,
                ])
                .map_err(|e| CoreError::Storage(format!("런타임 이력 저장 실패: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| CoreError::Storage(format!("트랜잭션 커밋 실패: {e}")))?;

        debug!("런타임 이력 배치 저장: {}건", records.len());
        Ok(records.len())
    }

    async fn delete_before(&self, before_ms: i64) -> Result<usize, CoreError> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM his_run_data WHERE timestamp < ?1",
                params![before_ms],
            )
            .map_err(|e| CoreError::Storage(format!("오래된 이력 삭제 실패: {e}")))?;

        if deleted > 0 {
            info!("오래된 런타임 이력 {deleted}개 삭제");
        }
        Ok(deleted)
    }
}
