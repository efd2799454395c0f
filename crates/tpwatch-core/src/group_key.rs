//! 복합 그룹 키 인코딩/디코딩.
//!
//! 리포팅 에이전트는 스레드 풀 식별자를 `tpId+itemId+tenantId+instanceId`
//! 형식의 단일 문자열로 전송한다. 구성요소 안의 `%`는 `%25`, `+`는 `%2B`로
//! 이스케이프된다.

use crate::error::CoreError;

/// 구성요소 구분자
const SEPARATOR: char = '+';

/// 런타임 그룹 키 구성요소 수
pub const GROUP_KEY_PARTS: usize = 4;

/// 구성요소 목록을 그룹 키 문자열로 인코딩
pub fn format_key(parts: &[&str]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        for ch in part.chars() {
            match ch {
                '%' => key.push_str("%25"),
                '+' => key.push_str("%2B"),
                _ => key.push(ch),
            }
        }
    }
    key
}

/// 그룹 키 문자열을 정확히 4개 구성요소로 디코딩
///
/// 반환 순서는 인코딩 순서 그대로 (threadPoolId, itemId, tenantId, instanceId).
pub fn parse_key(key: &str) -> Result<[String; GROUP_KEY_PARTS], CoreError> {
    let parts: Vec<String> = key
        .split(SEPARATOR)
        .map(unescape)
        .collect::<Result<_, _>>()
        .map_err(|message| CoreError::Validation {
            field: "group_key".to_string(),
            message,
        })?;

    if parts.len() != GROUP_KEY_PARTS || parts.iter().any(String::is_empty) {
        return Err(CoreError::MalformedGroupKey {
            key: key.to_string(),
            parts: parts.iter().filter(|p| !p.is_empty()).count(),
        });
    }

    let mut iter = parts.into_iter();
    // 길이 검사 완료 → 4개 보장
    Ok(std::array::from_fn(|_| iter.next().unwrap_or_default()))
}

fn unescape(segment: &str) -> Result<String, String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let code: String = chars.by_ref().take(2).collect();
        match code.as_str() {
            "25" => out.push('%'),
            "2B" => out.push('+'),
            other => return Err(format!("알 수 없는 이스케이프 시퀀스: %{other}")),
        }
    }
    Ok(out)
}
