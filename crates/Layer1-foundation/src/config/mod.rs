//! Config - 통합 설정 관리
//!
//! - `runtime.rs` - RuntimeConfig 통합 설정 (config.json)

mod runtime;

pub use runtime::{
    AppConfig, DuplicatePolicy, EventBusSettings, LoggingConfig, PluginsConfig, RuntimeConfig,
    RUNTIME_CONFIG_FILE,
};
