//! JSON 설정 파일.
//!
//! 파일이 없으면 기본 설정을 기록해 두고 그 값을 쓴다. 읽어 들인 설정은 항상 검증된다.

use crate::config::AppConfig;
use crate::error::CoreError;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 기본 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 디스크에서 읽은 설정과 그 위치
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigFile {
    /// `path`의 설정을 읽는다. 파일이 없으면 (상위 디렉토리 포함) 기본 설정으로 만든다.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let config = if path.exists() {
            read_config(&path)?
        } else {
            let config = AppConfig::default_config();
            write_config(&path, &config)?;
            info!("기본 설정 파일 생성: {}", path.display());
            config
        };

        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

fn read_config(path: &Path) -> Result<AppConfig, CoreError> {
    let raw = fs::read_to_string(path).map_err(|e| file_error("읽기", path, e))?;
    let config: AppConfig =
        serde_json::from_str(&raw).map_err(|e| file_error("파싱", path, e))?;
    config.validate()?;

    debug!("설정 파일 로드: {}", path.display());
    Ok(config)
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| file_error("디렉토리 생성", dir, e))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|e| file_error("저장", path, e))
}

fn file_error(action: &str, path: &Path, err: impl Display) -> CoreError {
    CoreError::Config(format!("설정 파일 {action} 실패: {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterResetPolicy;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let file = ConfigFile::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(file.path(), path.as_path());
        assert_eq!(file.config().web.port, 6691);

        // 다시 읽어도 같은 값
        let again = ConfigFile::load_or_create(&path).unwrap();
        assert_eq!(again.config().history.lookback_minutes, 30);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{"ingest": {"workers": 2}, "history": {"counter_reset_policy": "rebaseline"}}"#,
        )
        .unwrap();

        let config = ConfigFile::load_or_create(&path).unwrap().config().clone();
        assert_eq!(config.ingest.workers, 2);
        assert_eq!(config.ingest.queue_capacity, 256);
        assert_eq!(
            config.history.counter_reset_policy,
            CounterResetPolicy::Rebaseline
        );
    }

    #[test]
    fn invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"ingest": {"queue_capacity": 0}}"#).unwrap();

        let err = ConfigFile::load_or_create(&path).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn broken_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let err = ConfigFile::load_or_create(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
