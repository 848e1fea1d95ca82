//! System Events - 애플리케이션 공통 이벤트
//!
//! 시스템/서비스/UI 레벨에서 미리 정의된 이벤트들입니다.

use super::types::{EventHeader, EventKind, SERVICE_EVENT, SYSTEM_EVENT, UI_EVENT};
use crate::impl_event;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Kind 정의
// ============================================================================

pub static APPLICATION_STARTED: EventKind =
    EventKind::child("ApplicationStarted", &SYSTEM_EVENT);

pub static APPLICATION_SHUTTING_DOWN: EventKind =
    EventKind::child("ApplicationShuttingDown", &SYSTEM_EVENT);

pub static CONFIGURATION_CHANGED: EventKind =
    EventKind::child("ConfigurationChanged", &SYSTEM_EVENT);

pub static SERVICE_INITIALIZED: EventKind =
    EventKind::child("ServiceInitialized", &SERVICE_EVENT);

pub static SERVICE_FAILED: EventKind = EventKind::child("ServiceFailed", &SERVICE_EVENT);

pub static PAGE_NAVIGATION: EventKind = EventKind::child("PageNavigation", &UI_EVENT);

// ============================================================================
// 시스템 이벤트
// ============================================================================

/// 애플리케이션 시작
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStarted {
    pub header: EventHeader,
    pub version: String,
}

impl ApplicationStarted {
    pub fn new(source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            header: EventHeader::new(source),
            version: version.into(),
        }
    }
}

impl_event!(ApplicationStarted, APPLICATION_STARTED);

/// 애플리케이션 종료 중
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationShuttingDown {
    pub header: EventHeader,
}

impl ApplicationShuttingDown {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            header: EventHeader::new(source),
        }
    }
}

impl_event!(ApplicationShuttingDown, APPLICATION_SHUTTING_DOWN);

/// 설정 변경 (변경된 키 → 새 값)
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationChanged {
    pub header: EventHeader,
    pub changes: HashMap<String, Value>,
}

impl ConfigurationChanged {
    pub fn new(source: impl Into<String>, changes: HashMap<String, Value>) -> Self {
        Self {
            header: EventHeader::new(source),
            changes,
        }
    }
}

impl_event!(ConfigurationChanged, CONFIGURATION_CHANGED);

// ============================================================================
// 서비스 이벤트
// ============================================================================

/// 서비스 초기화 완료
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInitialized {
    pub header: EventHeader,
    pub service_name: String,
}

impl ServiceInitialized {
    pub fn new(source: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            header: EventHeader::new(source),
            service_name: service_name.into(),
        }
    }
}

impl_event!(ServiceInitialized, SERVICE_INITIALIZED);

/// 서비스 오류
#[derive(Debug, Clone, Serialize)]
pub struct ServiceFailed {
    pub header: EventHeader,
    pub service_name: String,
    pub error_message: String,
    /// 에러 체인 (Debug 표현)
    pub detail: String,
}

impl ServiceFailed {
    pub fn new(
        source: impl Into<String>,
        service_name: impl Into<String>,
        error: &crate::Error,
    ) -> Self {
        Self {
            header: EventHeader::new(source),
            service_name: service_name.into(),
            error_message: error.to_string(),
            detail: format!("{:?}", error),
        }
    }
}

impl_event!(ServiceFailed, SERVICE_FAILED);

// ============================================================================
// UI 이벤트
// ============================================================================

/// 페이지 이동
#[derive(Debug, Clone, Serialize)]
pub struct PageNavigation {
    pub header: EventHeader,
    pub from_page: String,
    pub to_page: String,
    pub params: HashMap<String, Value>,
}

impl PageNavigation {
    pub fn new(
        component: impl Into<String>,
        from_page: impl Into<String>,
        to_page: impl Into<String>,
    ) -> Self {
        Self {
            header: EventHeader::new(component),
            from_page: from_page.into(),
            to_page: to_page.into(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

impl_event!(PageNavigation, PAGE_NAVIGATION);


