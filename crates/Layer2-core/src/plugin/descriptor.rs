//! Plugin Descriptor - 플러그인 정적 정보 및 상태

use serde::{Deserialize, Serialize};
use std::fmt;
use uniapp_foundation::{Error, Result};

/// 플러그인 정적 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// 고유 ID (비어있으면 안 됨)
    pub id: String,

    /// 표시 이름 (비어있으면 안 됨)
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub description: String,

    /// 의존 플러그인 ID (정보용, 자동 해석하지 않음)
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: "0.1.0".to_string(),
            description: String::new(),
            dependencies: vec![],
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// id / name 검증
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "Plugin '{}' must define an id",
                self.name
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "Plugin '{}' must define a name",
                self.id
            )));
        }
        Ok(())
    }
}

/// 플러그인 라이프사이클 상태
///
/// Uninitialized → Initialized → ShutDown 순으로만 이동합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    #[default]
    Uninitialized,
    Initialized,
    ShutDown,
}

impl PluginState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, PluginState::Initialized)
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginState::Uninitialized => "uninitialized",
            PluginState::Initialized => "initialized",
            PluginState::ShutDown => "shut_down",
        };
        f.write_str(s)
    }
}

/// 진단/목록 표시용 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginMetadata {
    #[serde(flatten)]
    pub descriptor: PluginDescriptor,

    pub state: PluginState,

    /// 구현 타입 이름
    #[serde(rename = "class")]
    pub type_name: String,
}

impl PluginMetadata {
    pub fn initialized(&self) -> bool {
        self.state.is_initialized()
    }
}


