//! Error types for Uniapp
//!
//! 런타임 전체의 에러를 중앙에서 관리
//!
//! - 설정(wiring) 에러: 호출 지점에서 즉시 실패
//! - 라이프사이클/핸들러 에러: 경계에서 격리되어 bool/결과 마커로 변환

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Uniapp 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정(wiring) 관련
    // ========================================================================
    #[error("Service '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("No service registered for interface {0}")]
    InterfaceNotRegistered(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("Invalid plugin descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Plugin namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 라이프사이클 관련
    // ========================================================================
    #[error("Plugin error: {plugin} - {message}")]
    Plugin { plugin: String, message: String },

    // ========================================================================
    // 이벤트 핸들러 관련
    // ========================================================================
    #[error("Handler failed: {handler} - {message}")]
    Handler { handler: String, message: String },

    // ========================================================================
    // 서비스 호출 관련
    // ========================================================================
    #[error("Service call failed: {service}.{operation} - {message}")]
    Service {
        service: String,
        operation: String,
        message: String,
    },

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("No async runtime available for background dispatch")]
    NoAsyncRuntime,

    #[error("Worker error: {0}")]
    Worker(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// wiring 버그를 나타내는 에러인지 확인 (즉시 실패 대상)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::AlreadyRegistered(_)
                | Error::InterfaceNotRegistered(_)
                | Error::ServiceNotFound(_)
                | Error::InvalidRegistration(_)
                | Error::InvalidDescriptor(_)
                | Error::NamespaceNotFound(_)
                | Error::Config(_)
        )
    }

    /// 격리되어야 하는 라이프사이클/핸들러 에러인지 확인
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Error::Plugin { .. } | Error::Handler { .. })
    }

    /// Plugin 에러 생성 헬퍼
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Handler 에러 생성 헬퍼
    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Handler {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Service 호출 에러 생성 헬퍼
    pub fn service(
        service: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Service {
            service: service.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

/// panic payload를 사람이 읽을 수 있는 메시지로 변환
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}


