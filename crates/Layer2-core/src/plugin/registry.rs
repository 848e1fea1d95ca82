//! Plugin Registry - 활성 플러그인 관리
//!
//! PluginManager(발견/로드) 위에서 활성화 단위를 관리합니다.
//!
//! - 서비스 플러그인은 활성화 시 컨테이너에 바인딩 등록 (전부 성공 또는 전부 취소)
//! - 비활성화 시 그 플러그인이 등록한 바인딩을 제거한 뒤 언로드
//! - `ApplicationShuttingDown` 이벤트를 받으면 활성 플러그인 전체 비활성화

use super::descriptor::PluginMetadata;
use super::discovery::DiscoveryReport;
use super::events::{PluginInitialized, PLUGIN_INITIALIZED};
use super::manager::PluginManager;
use super::traits::Plugin;
use super::ui::PageHost;
use crate::container::Container;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};
use uniapp_foundation::error::panic_message;
use uniapp_foundation::event::APPLICATION_SHUTTING_DOWN;
use uniapp_foundation::{handler_fn, Error, EventBus, EventHandler, Result};

/// 활성 플러그인 정보
struct ActivePlugin {
    plugin: Arc<dyn Plugin>,

    /// 활성화 시 등록한 서비스 이름
    services: Vec<String>,

    /// 활성화 순서
    order: u64,
}

/// 플러그인 레지스트리
pub struct PluginRegistry {
    manager: Arc<PluginManager>,
    container: Arc<Container>,
    event_bus: Arc<EventBus>,

    /// 등록된 패키지 경로
    packages: Mutex<BTreeSet<String>>,

    /// 패키지별 마지막 발견 결과
    reports: Mutex<Vec<DiscoveryReport>>,

    active: RwLock<BTreeMap<String, ActivePlugin>>,
    activation_counter: Mutex<u64>,

    /// 버스에 등록한 핸들러 (Drop 시 해제)
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl PluginRegistry {
    /// 새 레지스트리 생성 및 이벤트 구독
    pub fn new(
        manager: Arc<PluginManager>,
        container: Arc<Container>,
        event_bus: Arc<EventBus>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let registry = weak.clone();
            let on_shutting_down = handler_fn("PluginRegistry::on_shutting_down", move |_event| {
                let Some(registry) = registry.upgrade() else {
                    return Ok(Value::Null);
                };
                info!("Application shutting down, deactivating plugins");
                let results = registry.deactivate_all();
                Ok(json!(results))
            });

            let on_plugin_initialized =
                handler_fn("PluginRegistry::on_plugin_initialized", |event| {
                    if let Some(event) = event.downcast_ref::<PluginInitialized>() {
                        debug!(
                            "Plugin initialized: {} v{}",
                            event.plugin_name, event.plugin_version
                        );
                    }
                    Ok(Value::Null)
                });

            event_bus.subscribe(&APPLICATION_SHUTTING_DOWN, Arc::clone(&on_shutting_down));
            event_bus.subscribe(&PLUGIN_INITIALIZED, Arc::clone(&on_plugin_initialized));

            Self {
                manager,
                container,
                event_bus,
                packages: Mutex::new(BTreeSet::new()),
                reports: Mutex::new(Vec::new()),
                active: RwLock::new(BTreeMap::new()),
                activation_counter: Mutex::new(0),
                handlers: vec![on_shutting_down, on_plugin_initialized],
            }
        })
    }

    pub fn manager(&self) -> &Arc<PluginManager> {
        &self.manager
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    // ========================================================================
    // 패키지
    // ========================================================================

    /// 패키지(네임스페이스) 등록 및 플러그인 발견
    ///
    /// 이미 등록된 패키지는 다시 스캔하지 않고 빈 목록을 반환합니다.
    pub fn register_plugin_package(&self, path: &str) -> Result<Vec<String>> {
        if !self.packages.lock().insert(path.to_string()) {
            warn!("Plugin package {} already registered", path);
            return Ok(vec![]);
        }

        match self.manager.discover(path) {
            Ok(report) => {
                let discovered = report.discovered.clone();
                if !report.is_clean() {
                    warn!(
                        "Plugin package {}: {} collision(s), {} skipped, {} failed unit(s)",
                        path,
                        report.collisions.len(),
                        report.skipped.len(),
                        report.failed_units.len()
                    );
                }
                info!(
                    "Registered plugin package {} ({} plugins)",
                    path,
                    discovered.len()
                );
                self.reports.lock().push(report);
                Ok(discovered)
            }
            Err(e) => {
                self.packages.lock().remove(path);
                Err(e)
            }
        }
    }

    /// 등록된 패키지 경로
    pub fn list_packages(&self) -> Vec<String> {
        self.packages.lock().iter().cloned().collect()
    }

    /// 패키지 발견 결과 (등록 순)
    pub fn discovery_reports(&self) -> Vec<DiscoveryReport> {
        self.reports.lock().clone()
    }

    // ========================================================================
    // 활성화 / 비활성화
    // ========================================================================

    /// 플러그인 활성화 (이미 활성이면 `true`)
    pub fn activate_plugin(&self, id: &str) -> bool {
        if self.active.read().contains_key(id) {
            debug!("Plugin {} already active", id);
            return true;
        }

        let Some(plugin) = self.manager.load_plugin(id) else {
            error!("Failed to load plugin {}", id);
            return false;
        };

        for dependency in &plugin.descriptor().dependencies {
            if !self.active.read().contains_key(dependency) {
                warn!(
                    "Plugin {} depends on {}, which is not active",
                    id, dependency
                );
            }
        }

        let mut services = vec![];
        if let Some(service) = plugin.as_service() {
            match self.register_services(id, service) {
                Ok(names) => services = names,
                Err(e) => {
                    error!("Failed to register service for plugin {}: {}", id, e);
                    self.manager.unload_plugin(id);
                    return false;
                }
            }
        }

        let order = {
            let mut counter = self.activation_counter.lock();
            *counter += 1;
            *counter
        };
        self.active.write().insert(
            id.to_string(),
            ActivePlugin {
                plugin,
                services,
                order,
            },
        );
        info!("Plugin {} activated", id);
        true
    }

    /// 서비스 등록
    ///
    /// 반환값은 플러그인이 보고한 이름이 아니라 컨테이너에 실제로 추가된 이름입니다.
    /// 실패하면 추가된 바인딩을 전부 되돌립니다.
    fn register_services(
        &self,
        id: &str,
        service: &dyn super::service::ServicePlugin,
    ) -> Result<Vec<String>> {
        let before: BTreeSet<String> = self.container.service_names().into_iter().collect();

        let result =
            panic::catch_unwind(AssertUnwindSafe(|| service.register_service(&self.container)))
                .unwrap_or_else(|payload| {
                    Err(Error::plugin(
                        id,
                        format!("service registration panicked: {}", panic_message(&*payload)),
                    ))
                });

        let added: Vec<String> = self
            .container
            .service_names()
            .into_iter()
            .filter(|name| !before.contains(name))
            .collect();

        match result {
            Ok(reported) => {
                let unreported: Vec<&str> = added
                    .iter()
                    .filter(|name| !reported.contains(name))
                    .map(String::as_str)
                    .collect();
                if !unreported.is_empty() {
                    warn!(
                        "Plugin {} registered services it did not report: {}",
                        id,
                        unreported.join(", ")
                    );
                }
                Ok(added)
            }
            Err(e) => {
                for name in &added {
                    if let Err(e) = self.container.unregister(name) {
                        warn!("Cannot roll back service {}: {}", name, e);
                    }
                }
                Err(e)
            }
        }
    }

    /// 플러그인 비활성화 (활성이 아니면 `false`)
    pub fn deactivate_plugin(&self, id: &str) -> bool {
        let Some(active) = self.active.write().remove(id) else {
            warn!("Plugin {} is not active", id);
            return false;
        };

        for name in &active.services {
            if let Err(e) = self.container.unregister(name) {
                warn!(
                    "Cannot unregister service {} of plugin {}: {}",
                    name, id, e
                );
            }
        }
        drop(active);

        if !self.manager.unload_plugin(id) {
            warn!("Plugin {} was active but not loaded", id);
        }
        info!("Plugin {} deactivated", id);
        true
    }

    /// 등록된 모든 플러그인 활성화
    pub fn activate_all(&self) -> BTreeMap<String, bool> {
        self.manager
            .list_plugin_factories()
            .into_iter()
            .map(|id| {
                let activated = self.activate_plugin(&id);
                (id, activated)
            })
            .collect()
    }

    /// 활성 플러그인 전체 비활성화 (활성화 역순)
    pub fn deactivate_all(&self) -> BTreeMap<String, bool> {
        let mut ids: Vec<(u64, String)> = self
            .active
            .read()
            .iter()
            .map(|(id, active)| (active.order, id.clone()))
            .collect();
        ids.sort_by(|a, b| b.0.cmp(&a.0));

        ids.into_iter()
            .map(|(_, id)| {
                let deactivated = self.deactivate_plugin(&id);
                (id, deactivated)
            })
            .collect()
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 활성 플러그인 id (정렬)
    pub fn list_active_plugins(&self) -> Vec<String> {
        self.active.read().keys().cloned().collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.read().contains_key(id)
    }

    /// 활성 플러그인 인스턴스
    pub fn get_plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.active
            .read()
            .get(id)
            .map(|active| Arc::clone(&active.plugin))
    }

    /// 활성화 시 등록한 서비스 이름
    pub fn services_of(&self, id: &str) -> Vec<String> {
        self.active
            .read()
            .get(id)
            .map(|active| active.services.clone())
            .unwrap_or_default()
    }

    pub fn get_plugin_metadata(&self, id: &str) -> Option<PluginMetadata> {
        self.manager.get_plugin_metadata(id)
    }

    /// 발견된 모든 플러그인의 메타데이터 (id 순)
    pub fn list_all_plugin_metadata(&self) -> Vec<PluginMetadata> {
        self.manager
            .list_plugin_factories()
            .iter()
            .filter_map(|id| self.manager.get_plugin_metadata(id))
            .collect()
    }

    /// 활성 UI 플러그인의 페이지를 호스트에 붙임
    pub fn attach_ui_plugins(&self, host: &mut dyn PageHost) -> BTreeMap<String, bool> {
        let plugins: Vec<(String, Arc<dyn Plugin>)> = self
            .active
            .read()
            .iter()
            .map(|(id, active)| (id.clone(), Arc::clone(&active.plugin)))
            .collect();

        plugins
            .into_iter()
            .filter_map(|(id, plugin)| {
                let ui = plugin.as_ui()?;
                let attached = ui.register_page(host);
                Some((id, attached))
            })
            .collect()
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        for handler in &self.handlers {
            self.event_bus.unsubscribe_all(handler);
        }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("packages", &self.list_packages())
            .field("active", &self.list_active_plugins())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{self, CalculatorService};
    use crate::container::{InterfaceId, ServiceRegistration};
    use crate::plugin::descriptor::{PluginDescriptor, PluginState};
    use crate::plugin::discovery::{PluginFactory, PluginNamespace};
    use crate::plugin::service::ServicePlugin;
    use crate::plugin::traits::{Lifecycle, PluginClass, PluginContext};
    use crate::plugin::ui::HeadlessHost;
    use std::any::Any;
    use uniapp_foundation::event::ApplicationShuttingDown;

    trait Clock: Send + Sync {}
    struct FixedClock;
    impl Clock for FixedClock {}

    /// 두 번째 서비스 등록에서 실패하는 플러그인
    struct HalfBaked {
        lifecycle: Lifecycle,
    }

    impl Plugin for HalfBaked {
        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }

        fn on_initialize(&self) -> Result<bool> {
            Ok(true)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_service(&self) -> Option<&dyn ServicePlugin> {
            Some(self)
        }
    }

    impl ServicePlugin for HalfBaked {
        fn interface(&self) -> InterfaceId {
            InterfaceId::of::<dyn Clock>()
        }

        fn on_register_service(&self, container: &Container) -> Result<Vec<String>> {
            container.register(ServiceRegistration::<dyn Clock>::instance(
                "clock.primary",
                Arc::new(FixedClock),
            ))?;
            Err(Error::Internal("backup clock unavailable".into()))
        }
    }

    impl PluginClass for HalfBaked {
        fn class_descriptor() -> PluginDescriptor {
            PluginDescriptor::new("half_baked", "Half Baked")
        }

        fn construct(context: PluginContext) -> Result<Self> {
            Ok(Self {
                lifecycle: Lifecycle::new::<Self>(Self::class_descriptor(), context)?,
            })
        }
    }

    fn half_baked_unit() -> Result<Vec<PluginFactory>> {
        Ok(vec![PluginFactory::of::<HalfBaked>()])
    }

    /// 등록한 서비스 중 하나만 보고하는 플러그인
    struct Forgetful {
        lifecycle: Lifecycle,
    }

    impl Plugin for Forgetful {
        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }

        fn on_initialize(&self) -> Result<bool> {
            Ok(true)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_service(&self) -> Option<&dyn ServicePlugin> {
            Some(self)
        }
    }

    impl ServicePlugin for Forgetful {
        fn interface(&self) -> InterfaceId {
            InterfaceId::of::<dyn Clock>()
        }

        fn on_register_service(&self, container: &Container) -> Result<Vec<String>> {
            container.register_instance::<dyn Clock>("clock.a", Arc::new(FixedClock))?;
            container.register_instance::<dyn Clock>("clock.b", Arc::new(FixedClock))?;
            Ok(vec!["clock.a".to_string()])
        }
    }

    impl PluginClass for Forgetful {
        fn class_descriptor() -> PluginDescriptor {
            PluginDescriptor::new("forgetful", "Forgetful")
        }

        fn construct(context: PluginContext) -> Result<Self> {
            Ok(Self {
                lifecycle: Lifecycle::new::<Self>(Self::class_descriptor(), context)?,
            })
        }
    }

    fn forgetful_unit() -> Result<Vec<PluginFactory>> {
        Ok(vec![PluginFactory::of::<Forgetful>()])
    }

    fn registry() -> Arc<PluginRegistry> {
        let bus = Arc::new(EventBus::new());
        let container = Arc::new(Container::new());
        let manager = Arc::new(PluginManager::new(PluginContext::new(
            Arc::clone(&bus),
            Arc::clone(&container),
        )));
        manager.add_namespace(builtin::namespace());
        manager.add_namespace(
            PluginNamespace::new("test.plugins")
                .with_unit("half_baked", half_baked_unit)
                .with_unit("forgetful", forgetful_unit),
        );
        PluginRegistry::new(manager, container, bus)
    }

    #[test]
    fn test_register_package_once() {
        let registry = registry();

        let ids = registry.register_plugin_package(builtin::NAMESPACE).unwrap();
        assert_eq!(ids, vec!["calculator", "calculator_ui"]);
        assert!(registry
            .register_plugin_package(builtin::NAMESPACE)
            .unwrap()
            .is_empty());
        assert_eq!(registry.list_packages(), vec![builtin::NAMESPACE]);
        assert_eq!(registry.discovery_reports().len(), 1);
    }

    #[test]
    fn test_unknown_package_can_be_retried() {
        let registry = registry();
        assert!(registry.register_plugin_package("missing").is_err());
        assert!(registry.list_packages().is_empty());
    }

    #[test]
    fn test_activate_registers_services() {
        let registry = registry();
        registry.register_plugin_package(builtin::NAMESPACE).unwrap();

        assert!(registry.activate_plugin("calculator"));
        assert!(registry.activate_plugin("calculator"));
        assert_eq!(registry.services_of("calculator"), vec!["calculator"]);

        let calculator = registry
            .container()
            .resolve_by_interface::<dyn CalculatorService>()
            .unwrap();
        assert_eq!(calculator.add(2.0, 3.0), 5.0);
    }

    #[test]
    fn test_activation_is_all_or_nothing() {
        let registry = registry();
        registry.register_plugin_package("test.plugins").unwrap();

        assert!(!registry.activate_plugin("half_baked"));
        assert!(!registry.is_active("half_baked"));
        assert!(!registry.manager().is_loaded("half_baked"));
        assert!(!registry.container().contains("clock.primary"));
    }

    #[test]
    fn test_deactivate() {
        let registry = registry();
        registry.register_plugin_package(builtin::NAMESPACE).unwrap();
        registry.activate_plugin("calculator");
        let plugin = registry.get_plugin("calculator").unwrap();

        assert!(registry.deactivate_plugin("calculator"));
        assert!(!registry.deactivate_plugin("calculator"));
        assert_eq!(plugin.state(), PluginState::ShutDown);
        assert!(registry.container().is_empty());
        assert!(registry.get_plugin("calculator").is_none());
    }

    #[test]
    fn test_deactivate_removes_unreported_services() {
        let registry = registry();
        registry.register_plugin_package("test.plugins").unwrap();

        assert!(registry.activate_plugin("forgetful"));
        assert_eq!(registry.services_of("forgetful"), vec!["clock.a", "clock.b"]);

        assert!(registry.deactivate_plugin("forgetful"));
        assert!(registry.container().is_empty());
        assert!(registry
            .container()
            .resolve_by_interface::<dyn Clock>()
            .is_err());
    }

    #[test]
    fn test_activate_all_and_attach_pages() {
        let registry = registry();
        registry.register_plugin_package(builtin::NAMESPACE).unwrap();

        let results = registry.activate_all();
        assert_eq!(results.get("calculator"), Some(&true));
        assert_eq!(results.get("calculator_ui"), Some(&true));

        let mut host = HeadlessHost::new();
        let attached = registry.attach_ui_plugins(&mut host);
        assert_eq!(attached.len(), 1);
        assert_eq!(attached.get("calculator_ui"), Some(&true));
        assert_eq!(host.pages()[0].page_id, "calculator");
    }

    #[test]
    fn test_shutdown_event_deactivates_all() {
        let registry = registry();
        registry.register_plugin_package(builtin::NAMESPACE).unwrap();
        registry.activate_all();

        let outcomes = registry
            .event_bus
            .publish(&ApplicationShuttingDown::new("test"));

        assert!(outcomes.iter().all(|o| !o.is_failed()));
        assert!(registry.list_active_plugins().is_empty());
        assert!(registry.container().is_empty());
    }

    #[test]
    fn test_metadata_listing() {
        let registry = registry();
        registry.register_plugin_package(builtin::NAMESPACE).unwrap();
        registry.activate_plugin("calculator");

        let all = registry.list_all_plugin_metadata();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].state, PluginState::Initialized);
        assert_eq!(all[1].state, PluginState::Uninitialized);
        assert_eq!(all[1].descriptor.dependencies, vec!["calculator"]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = {
            let registry = registry();
            let bus = Arc::clone(&registry.event_bus);
            assert_eq!(bus.subscriber_count(&APPLICATION_SHUTTING_DOWN), 1);
            bus
        };
        assert_eq!(bus.subscriber_count(&APPLICATION_SHUTTING_DOWN), 0);
    }
}
