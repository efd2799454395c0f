//! tpwatch 도메인 모델.
//!
//! 리포팅 에이전트와 서버, 조회 API가 공유하는 핵심 데이터 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod chart;
pub mod message;
pub mod metric;
