//! # Plugin System
//!
//! 독립적으로 로드되는 플러그인의 라이프사이클, 발견, 활성화
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginRegistry                          │
//! │   activate / deactivate, ApplicationShuttingDown 구독       │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                   PluginManager                       │  │
//! │  │  PluginNamespace → PluginUnit → PluginFactory         │  │
//! │  │  load_plugin / unload_plugin (인스턴스 캐시)          │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │                          │                                  │
//! │  ┌───────────────────────┼───────────────────────────────┐  │
//! │  │     PluginContext     │                               │  │
//! │  │  - EventBus           │                               │  │
//! │  │  - Container          │                               │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 상태
//!
//! `Uninitialized → Initialized → ShutDown` (역방향 없음)
//!
//! ## 예시
//!
//! ```ignore
//! struct MyPlugin { lifecycle: Lifecycle }
//!
//! impl Plugin for MyPlugin {
//!     fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
//!     fn on_initialize(&self) -> Result<bool> { Ok(true) }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! let namespace = PluginNamespace::new("acme.plugins")
//!     .with_unit("my_plugin", || Ok(vec![PluginFactory::of::<MyPlugin>()]));
//! ```

mod descriptor;
mod discovery;
mod events;
mod manager;
mod registry;
mod service;
mod traits;
mod ui;

pub use descriptor::{PluginDescriptor, PluginMetadata, PluginState};
pub use discovery::{
    Collision, DiscoveryReport, PluginConstructor, PluginFactory, PluginNamespace, PluginUnit,
    UnitFailure, UnitLoader,
};
pub use events::{
    PluginError, PluginInitialized, PluginShutdown, PLUGIN_ERROR, PLUGIN_EVENT,
    PLUGIN_INITIALIZED, PLUGIN_SHUTDOWN,
};
pub use manager::PluginManager;
pub use registry::PluginRegistry;
pub use service::ServicePlugin;
pub use traits::{Lifecycle, Plugin, PluginClass, PluginContext};
pub use ui::{AttachedPage, HeadlessHost, PageHost, UiPlugin};
