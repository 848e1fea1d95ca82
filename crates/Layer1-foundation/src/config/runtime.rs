//! Runtime Config - 런타임 통합 설정
//!
//! `config.json` 하나로 앱/로깅/플러그인/이벤트 버스 설정을 관리합니다.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// 설정 파일명
pub const RUNTIME_CONFIG_FILE: &str = "config.json";

/// 허용되는 로그 레벨
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ============================================================================
// Runtime Config (통합)
// ============================================================================

/// 런타임 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,

    #[serde(default)]
    pub event_bus: EventBusSettings,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 파일에서 로드 (파일이 없거나 형식이 잘못되면 에러)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: RuntimeConfig = serde_json::from_str(&content)?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// 파일에서 로드, 파일이 없으면 기본값
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// 파일로 저장 (pretty JSON)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // ========================================================================
    // Validate / Merge
    // ========================================================================

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "Log level must be one of {:?}, got '{}'",
                VALID_LOG_LEVELS, self.logging.level
            )));
        }
        Ok(())
    }

    /// 다른 설정과 병합 (other의 기본값이 아닌 항목이 우선)
    pub fn merge(&mut self, other: RuntimeConfig) {
        let defaults = RuntimeConfig::default();

        if other.app.title != defaults.app.title {
            self.app.title = other.app.title;
        }
        if other.app.version != defaults.app.version {
            self.app.version = other.app.version;
        }
        if other.app.debug {
            self.app.debug = true;
        }
        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
        for package in other.plugins.packages {
            if !self.plugins.packages.contains(&package) {
                self.plugins.packages.push(package);
            }
        }
        if !other.plugins.enabled.is_empty() {
            self.plugins.enabled = other.plugins.enabled;
        }
        if other.plugins.auto_activate != defaults.plugins.auto_activate {
            self.plugins.auto_activate = other.plugins.auto_activate;
        }
        if other.plugins.on_duplicate != defaults.plugins.on_duplicate {
            self.plugins.on_duplicate = other.plugins.on_duplicate;
        }
        if other.event_bus.log_dispatch {
            self.event_bus.log_dispatch = true;
        }
    }

    /// 디버그 모드면 debug, 아니면 설정된 레벨
    pub fn effective_log_level(&self) -> String {
        if self.app.debug {
            "debug".to_string()
        } else {
            self.logging.level.to_ascii_lowercase()
        }
    }
}

// ============================================================================
// 개별 설정 섹션
// ============================================================================

/// 앱 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub title: String,
    pub version: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Universal App".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            debug: false,
        }
    }
}

/// 로깅 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// trace / debug / info / warn / error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 중복 플러그인 id 처리 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    /// 먼저 등록된 것이 유지됨 (이후 중복은 충돌로 기록만)
    #[default]
    KeepFirst,

    /// 나중에 발견된 것으로 교체
    Replace,
}

/// 플러그인 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginsConfig {
    /// 시작 시 등록할 네임스페이스
    pub packages: Vec<String>,

    /// 활성화할 플러그인 id (비어있으면 발견된 전체)
    pub enabled: Vec<String>,

    /// 시작 시 자동 활성화
    pub auto_activate: bool,

    /// 중복 id 처리
    pub on_duplicate: DuplicatePolicy,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            packages: vec![],
            enabled: vec![],
            auto_activate: true,
            on_duplicate: DuplicatePolicy::KeepFirst,
        }
    }
}

/// 이벤트 버스 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventBusSettings {
    /// 모든 전달을 trace 로깅
    pub log_dispatch: bool,
}

impl From<&EventBusSettings> for crate::event::EventBusConfig {
    fn from(settings: &EventBusSettings) -> Self {
        Self {
            log_dispatch: settings.log_dispatch,
        }
    }
}


