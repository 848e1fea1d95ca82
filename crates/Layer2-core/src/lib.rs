//! uniapp-core: Core Runtime for Uniapp
//!
//! Layer2 - 플러그인/서비스 런타임 레이어
//!
//! # 주요 모듈
//!
//! - `container`: 인터페이스 색인 서비스 레지스트리 + 컨테이너 (override/reset)
//! - `plugin`: 플러그인 라이프사이클, 발견(PluginManager), 활성화(PluginRegistry)
//! - `runtime`: 버스/컨테이너/매니저/레지스트리를 소유하는 런타임 컨텍스트
//! - `builtin`: 기본 제공 예제 플러그인 (calculator, calculator_ui)
//!
//! # 사용 예시
//!
//! ```ignore
//! use uniapp_core::{builtin, Runtime};
//! use uniapp_core::builtin::CalculatorService;
//!
//! let runtime = Runtime::new(RuntimeConfig::default());
//! runtime.bootstrap([builtin::namespace()])?;
//! runtime.start();
//!
//! let calc = runtime.container().resolve_by_interface::<dyn CalculatorService>()?;
//! assert_eq!(calc.add(2.0, 3.0), 5.0);
//!
//! runtime.shutdown();
//! ```

// Core modules
pub mod builtin;
pub mod container;
pub mod plugin;
pub mod runtime;

// Re-exports: Container
pub use container::{
    service_call, Container, InterfaceId, RegistryEntry, ServiceFactory, ServiceRegistration,
    ServiceRegistry, ServiceSummary,
};

// Re-exports: Plugin
pub use plugin::{
    // Discovery
    Collision,
    DiscoveryReport,
    // Host
    HeadlessHost,
    // Traits
    Lifecycle,
    PageHost,
    Plugin,
    PluginClass,
    PluginContext,
    // Descriptor
    PluginDescriptor,
    PluginFactory,
    // Manager
    PluginManager,
    PluginMetadata,
    PluginNamespace,
    // Registry
    PluginRegistry,
    PluginState,
    ServicePlugin,
    UiPlugin,
};

// Re-exports: Runtime
pub use runtime::Runtime;

// Re-exports: Foundation
pub use uniapp_foundation::{Error, EventBus, Result, RuntimeConfig};
