//! # uniapp-foundation
//!
//! Foundation layer for Uniapp:
//! - Error: 런타임 공통 에러 타입
//! - Event: 타입 계층 기반 발행/구독 이벤트 버스
//! - Config: 통합 설정 (RuntimeConfig, config.json)
//! - Worker: 콜백 기반 백그라운드 작업
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  uniapp-core (Plugin / Container / PluginRegistry)      │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  ┌──────────────┬──────────────┬──────────────┐         │
//! │  │  EventBus    │ RuntimeConfig│ Background   │         │
//! │  │  (publish)   │ (config.json)│ Worker       │         │
//! │  └──────────────┴──────────────┴──────────────┘         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod worker;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    AppConfig, DuplicatePolicy, EventBusSettings, LoggingConfig, PluginsConfig, RuntimeConfig,
    RUNTIME_CONFIG_FILE,
};

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{
    // Bus
    handler_fn,
    EventBus,
    EventBusConfig,
    EventHandler,
    HandlerOutcome,
    // Types
    Event,
    EventHeader,
    EventId,
    EventKind,
    TypedEvent,
};

// ============================================================================
// Worker (백그라운드 작업)
// ============================================================================
pub use worker::{BackgroundWorker, Completion, CompletionQueue, CompletionSender};
