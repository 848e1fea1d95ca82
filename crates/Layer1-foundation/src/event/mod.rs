//! Event System - 이벤트 발행/구독 시스템
//!
//! 서비스와 컴포넌트가 서로를 직접 참조하지 않고 상태 변화를 알리는 통로입니다.
//! 서비스 조회(resolution) 경로와는 독립적으로 동작합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        EventBus                              │
//! │  publish(PluginInitialized)                                  │
//! │         │                                                    │
//! │         ▼  kind.lineage(): PluginInitialized → PluginEvent   │
//! │                              → Event                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │  Handler 1   │  │  Handler 2   │  │  Handler N   │       │
//! │  │ (exact kind) │  │ (PluginEvent)│  │   (Event)    │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use uniapp_foundation::event::{handler_fn, EventBus, APPLICATION_SHUTTING_DOWN};
//!
//! let bus = Arc::new(EventBus::new());
//! bus.subscribe(&APPLICATION_SHUTTING_DOWN, handler_fn("cleanup", |_| Ok(Value::Null)));
//! bus.publish(&ApplicationShuttingDown::new("app"));
//! ```

pub mod bus;
pub mod system;
pub mod types;

// Re-exports
pub use bus::{handler_fn, EventBus, EventBusConfig, EventHandler, FnHandler, HandlerOutcome};

pub use system::{
    ApplicationShuttingDown, ApplicationStarted, ConfigurationChanged, PageNavigation,
    ServiceFailed, ServiceInitialized, APPLICATION_SHUTTING_DOWN, APPLICATION_STARTED,
    CONFIGURATION_CHANGED, PAGE_NAVIGATION, SERVICE_FAILED, SERVICE_INITIALIZED,
};

pub use types::{
    Event, EventHeader, EventId, EventKind, TypedEvent, EVENT, SERVICE_EVENT, SYSTEM_EVENT,
    UI_EVENT,
};
