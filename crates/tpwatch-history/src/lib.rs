//! # tpwatch-history
//!
//! 스레드 풀 런타임 이력 수집/조회.
//!
//! ## 모듈
//! - `worker_pool`: 크기 제한 워커 풀 (try-submit, 포화 시 즉시 거부)
//! - `ingest`: 수집 큐 — 호출자를 막지 않는 fire-and-drop 제출
//! - `dispatch`: 메시지 유형별 처리기 라우팅
//! - `recorder`: 런타임 메시지 → 이력 배치 저장
//! - `aggregator`: 누적 카운터 → 구간 증가량 차트 시계열
//! - `query`: 조회 창 계산 + 저장소/집계기 오케스트레이션
//! - `retention`: 보존 기간 초과 이력 주기적 삭제

pub mod aggregator;
pub mod dispatch;
pub mod ingest;
pub mod query;
pub mod recorder;
pub mod retention;
pub mod worker_pool;

#[cfg(test)]
pub(crate) mod testing;
