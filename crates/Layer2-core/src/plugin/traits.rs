//! Plugin traits - 핵심 플러그인 인터페이스
//!
//! 구현체는 [`Lifecycle`]을 하나 보관하고 `on_initialize` / `on_shutdown` 훅만 작성합니다.
//! 상태 전이와 이벤트 발행은 `initialize()` / `shutdown()` 기본 구현이 담당합니다.

use super::descriptor::{PluginDescriptor, PluginMetadata, PluginState};
use super::events::{PluginError, PluginInitialized, PluginShutdown};
use super::service::ServicePlugin;
use super::ui::UiPlugin;
use crate::container::Container;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};
use uniapp_foundation::error::panic_message;
use uniapp_foundation::{Event, EventBus, HandlerOutcome, Result};

// ============================================================================
// PluginContext - 플러그인에 제공되는 컨텍스트
// ============================================================================

/// 플러그인 컨텍스트 - 플러그인이 런타임과 상호작용하는 통로
#[derive(Clone)]
pub struct PluginContext {
    event_bus: Arc<EventBus>,
    container: Arc<Container>,
}

impl PluginContext {
    pub fn new(event_bus: Arc<EventBus>, container: Arc<Container>) -> Self {
        Self {
            event_bus,
            container,
        }
    }

    /// 이벤트 버스 접근
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// 서비스 컨테이너 접근
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// 이벤트 발행
    pub fn publish(&self, event: &dyn Event) -> Vec<HandlerOutcome> {
        self.event_bus.publish(event)
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext").finish_non_exhaustive()
    }
}

// ============================================================================
// Lifecycle - 상태 머신
// ============================================================================

/// 플러그인 라이프사이클 상태 보관소
pub struct Lifecycle {
    descriptor: PluginDescriptor,
    state: Mutex<PluginState>,
    context: PluginContext,
    type_name: &'static str,
}

impl Lifecycle {
    /// 생성 (descriptor 검증 실패 시 에러)
    pub fn new<P: ?Sized + 'static>(
        descriptor: PluginDescriptor,
        context: PluginContext,
    ) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            descriptor,
            state: Mutex::new(PluginState::Uninitialized),
            context,
            type_name: short_type_name(std::any::type_name::<P>()),
        })
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> PluginState {
        *self.state.lock()
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        self.context.event_bus()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn set_state(&self, state: PluginState) {
        *self.state.lock() = state;
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.descriptor.id)
            .field("state", &self.state())
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

// ============================================================================
// Plugin trait
// ============================================================================

/// 플러그인 trait
///
/// `initialize` / `shutdown` / `metadata`는 재정의하지 않습니다.
pub trait Plugin: Send + Sync + 'static {
    /// 라이프사이클 상태 보관소
    fn lifecycle(&self) -> &Lifecycle;

    /// 초기화 훅 (`Ok(false)` 또는 `Err`는 실패)
    fn on_initialize(&self) -> Result<bool>;

    /// 종료 훅
    fn on_shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// 다운캐스팅용
    fn as_any(&self) -> &dyn Any;

    /// 서비스 플러그인이면 Some
    fn as_service(&self) -> Option<&dyn ServicePlugin> {
        None
    }

    /// UI 플러그인이면 Some
    fn as_ui(&self) -> Option<&dyn UiPlugin> {
        None
    }

    // ========================================================================
    // 기본 구현
    // ========================================================================

    fn descriptor(&self) -> &PluginDescriptor {
        self.lifecycle().descriptor()
    }

    fn id(&self) -> &str {
        &self.lifecycle().descriptor().id
    }

    fn name(&self) -> &str {
        &self.lifecycle().descriptor().name
    }

    fn state(&self) -> PluginState {
        self.lifecycle().state()
    }

    fn is_initialized(&self) -> bool {
        self.state().is_initialized()
    }

    /// 플러그인 초기화
    ///
    /// 이미 초기화되어 있으면 훅을 다시 실행하지 않고 `true`.
    /// 훅 실패/panic은 `PluginError` 이벤트로 보고되고 `false`를 반환합니다.
    fn initialize(&self) -> bool {
        run_initialize(self)
    }

    /// 플러그인 종료
    ///
    /// 초기화되지 않았으면 경고만 남깁니다. 훅이 실패해도 상태는 ShutDown이 됩니다.
    fn shutdown(&self) {
        run_shutdown(self)
    }

    fn metadata(&self) -> PluginMetadata {
        let lifecycle = self.lifecycle();
        PluginMetadata {
            descriptor: lifecycle.descriptor().clone(),
            state: lifecycle.state(),
            type_name: lifecycle.type_name().to_string(),
        }
    }
}

fn run_initialize<P: Plugin + ?Sized>(plugin: &P) -> bool {
    let lifecycle = plugin.lifecycle();
    let descriptor = lifecycle.descriptor();

    match lifecycle.state() {
        PluginState::Initialized => {
            warn!("Plugin {} already initialized", descriptor.id);
            return true;
        }
        PluginState::ShutDown => {
            warn!(
                "Plugin {} has been shut down and cannot be initialized again",
                descriptor.id
            );
            return false;
        }
        PluginState::Uninitialized => {}
    }

    info!(
        "Initializing plugin {} v{}",
        descriptor.name, descriptor.version
    );

    let failure = match panic::catch_unwind(AssertUnwindSafe(|| plugin.on_initialize())) {
        Ok(Ok(true)) => None,
        Ok(Ok(false)) => Some("initialization hook returned false".to_string()),
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(format!(
            "initialization panicked: {}",
            panic_message(&*payload)
        )),
    };

    match failure {
        None => {
            lifecycle.set_state(PluginState::Initialized);
            lifecycle
                .event_bus()
                .publish(&PluginInitialized::new(descriptor));
            info!("Plugin {} initialized successfully", descriptor.name);
            true
        }
        Some(message) => {
            error!(
                plugin = %descriptor.id,
                "Plugin {} initialization failed: {}", descriptor.name, message
            );
            lifecycle
                .event_bus()
                .publish(&PluginError::new(&descriptor.id, message));
            false
        }
    }
}

fn run_shutdown<P: Plugin + ?Sized>(plugin: &P) {
    let lifecycle = plugin.lifecycle();
    let descriptor = lifecycle.descriptor();

    if !lifecycle.state().is_initialized() {
        warn!(
            "Plugin {} not initialized, nothing to shut down",
            descriptor.id
        );
        return;
    }

    info!("Shutting down plugin {}", descriptor.name);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| plugin.on_shutdown()));
    lifecycle.set_state(PluginState::ShutDown);

    let message = match outcome {
        Ok(Ok(())) => {
            lifecycle
                .event_bus()
                .publish(&PluginShutdown::new(descriptor));
            info!("Plugin {} shut down successfully", descriptor.name);
            return;
        }
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(&*payload)),
    };

    error!(
        plugin = %descriptor.id,
        "Error shutting down plugin {}: {}", descriptor.name, message
    );
    lifecycle.event_bus().publish(&PluginError::new(
        &descriptor.id,
        format!("Shutdown error: {}", message),
    ));
}

// ============================================================================
// PluginClass - 정적 정보 + 생성자
// ============================================================================

/// 등록 테이블에 올릴 수 있는 플러그인 타입
pub trait PluginClass: Plugin + Sized {
    /// 인스턴스 없이 조회 가능한 정적 descriptor
    fn class_descriptor() -> PluginDescriptor;

    /// 인스턴스 생성
    fn construct(context: PluginContext) -> Result<Self>;
}


