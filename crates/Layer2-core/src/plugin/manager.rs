//! Plugin Manager - 플러그인 발견/로드/언로드
//!
//! - 네임스페이스의 unit을 한 번씩만 로드해 팩토리 테이블을 채움
//! - 중복 id는 [`DuplicatePolicy`]로 처리하고 [`DiscoveryReport`]에 기록
//! - 로드된 인스턴스를 캐시 (초기화 성공한 것만)

use super::descriptor::{PluginMetadata, PluginState};
use super::discovery::{Collision, DiscoveryReport, PluginFactory, PluginNamespace, UnitFailure};
use super::traits::{Plugin, PluginContext};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uniapp_foundation::error::panic_message;
use uniapp_foundation::{DuplicatePolicy, Error, EventBus, Result};

/// 플러그인 매니저
pub struct PluginManager {
    /// 생성자에 넘길 컨텍스트
    context: PluginContext,

    /// 중복 id 처리 정책
    policy: DuplicatePolicy,

    namespaces: RwLock<HashMap<String, PluginNamespace>>,

    /// 로드 완료된 unit 경로
    loaded_units: Mutex<HashSet<String>>,

    /// id → 팩토리
    factories: RwLock<BTreeMap<String, PluginFactory>>,

    /// id → 로드된 인스턴스
    plugins: RwLock<BTreeMap<String, Arc<dyn Plugin>>>,
}

impl PluginManager {
    /// 새 매니저 생성
    pub fn new(context: PluginContext) -> Self {
        Self::with_policy(context, DuplicatePolicy::default())
    }

    /// 중복 정책 지정
    pub fn with_policy(context: PluginContext, policy: DuplicatePolicy) -> Self {
        debug!("Plugin manager initialized ({:?})", policy);
        Self {
            context,
            policy,
            namespaces: RwLock::new(HashMap::new()),
            loaded_units: Mutex::new(HashSet::new()),
            factories: RwLock::new(BTreeMap::new()),
            plugins: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        self.context.event_bus()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    // ========================================================================
    // 발견
    // ========================================================================

    /// 네임스페이스 추가 (같은 경로면 교체)
    pub fn add_namespace(&self, namespace: PluginNamespace) {
        let path = namespace.path().to_string();
        if self
            .namespaces
            .write()
            .insert(path.clone(), namespace)
            .is_some()
        {
            warn!("Plugin namespace {} replaced", path);
        } else {
            debug!("Plugin namespace {} added", path);
        }
    }

    /// 네임스페이스의 플러그인 발견
    ///
    /// 이미 로드된 unit은 건너뜁니다. 실패한 unit은 다음 호출에서 다시 시도합니다.
    pub fn discover(&self, path: &str) -> Result<DiscoveryReport> {
        let namespace = self
            .namespaces
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NamespaceNotFound(path.to_string()))?;

        info!("Discovering plugins in package {}", path);
        let mut report = DiscoveryReport::new(path);

        for unit in namespace.units() {
            let unit_path = namespace.unit_path(unit);
            if self.loaded_units.lock().contains(&unit_path) {
                debug!("Unit {} already loaded, skipping", unit_path);
                continue;
            }

            let factories = match panic::catch_unwind(AssertUnwindSafe(|| unit.load())) {
                Ok(Ok(factories)) => factories,
                Ok(Err(e)) => {
                    error!("Error loading unit {}: {}", unit_path, e);
                    report.failed_units.push(UnitFailure {
                        unit: unit_path,
                        error: e.to_string(),
                    });
                    continue;
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    error!("Unit {} panicked while loading: {}", unit_path, message);
                    report.failed_units.push(UnitFailure {
                        unit: unit_path,
                        error: message,
                    });
                    continue;
                }
            };
            self.loaded_units.lock().insert(unit_path);

            for factory in factories {
                self.register_factory(factory, &mut report);
            }
        }

        info!(
            "Discovered {} plugins in {}",
            report.discovered.len(),
            path
        );
        Ok(report)
    }

    fn register_factory(&self, factory: PluginFactory, report: &mut DiscoveryReport) {
        let id = factory.id().to_string();
        if id.trim().is_empty() {
            warn!(
                "Plugin class {} has no plugin id, skipping",
                factory.type_name()
            );
            report.skipped.push(factory.type_name().to_string());
            return;
        }

        let mut factories = self.factories.write();
        match factories.get(&id) {
            Some(existing) => {
                let existing_type = existing.type_name().to_string();
                let incoming_type = factory.type_name().to_string();
                match self.policy {
                    DuplicatePolicy::KeepFirst => {
                        warn!(
                            "Plugin id {} already registered by {}, ignoring {}",
                            id, existing_type, incoming_type
                        );
                        report.collisions.push(Collision {
                            id,
                            kept: existing_type,
                            ignored: incoming_type,
                        });
                    }
                    DuplicatePolicy::Replace => {
                        warn!(
                            "Plugin id {} already registered by {}, replacing with {}",
                            id, existing_type, incoming_type
                        );
                        factories.insert(id.clone(), factory);
                        report.collisions.push(Collision {
                            id,
                            kept: incoming_type,
                            ignored: existing_type,
                        });
                    }
                }
            }
            None => {
                debug!("Found plugin class {} ({})", factory.type_name(), id);
                factories.insert(id.clone(), factory);
                report.discovered.push(id);
            }
        }
    }

    // ========================================================================
    // 로드/언로드
    // ========================================================================

    /// 플러그인 로드 및 초기화
    ///
    /// 이미 로드되었으면 캐시된 인스턴스를 반환합니다.
    /// 생성/초기화 실패 시 아무것도 캐시하지 않고 `None`.
    pub fn load_plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        if let Some(plugin) = self.plugins.read().get(id) {
            debug!("Plugin {} already loaded", id);
            return Some(Arc::clone(plugin));
        }

        let Some(factory) = self.factories.read().get(id).cloned() else {
            warn!("Plugin {} not found", id);
            return None;
        };

        info!("Loading plugin {}", id);
        let context = self.context.clone();
        let plugin = match panic::catch_unwind(AssertUnwindSafe(|| factory.construct(context))) {
            Ok(Ok(plugin)) => plugin,
            Ok(Err(e)) => {
                error!("Error creating plugin {}: {}", id, e);
                return None;
            }
            Err(payload) => {
                error!(
                    "Plugin {} constructor panicked: {}",
                    id,
                    panic_message(&*payload)
                );
                return None;
            }
        };

        if plugin.id() != id {
            warn!(
                "Plugin registered as {} reports id {}",
                id,
                plugin.id()
            );
        }

        if !plugin.initialize() {
            error!("Failed to initialize plugin {}", id);
            return None;
        }

        let plugin = Arc::clone(
            self.plugins
                .write()
                .entry(id.to_string())
                .or_insert(plugin),
        );
        info!("Plugin {} loaded", id);
        Some(plugin)
    }

    /// 플러그인 종료 및 캐시에서 제거 (로드되지 않았으면 `false`)
    pub fn unload_plugin(&self, id: &str) -> bool {
        let Some(plugin) = self.plugins.write().remove(id) else {
            warn!("Plugin {} not loaded", id);
            return false;
        };

        plugin.shutdown();
        info!("Plugin {} unloaded", id);
        true
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 로드된 인스턴스
    pub fn get_plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.read().get(id).cloned()
    }

    /// 등록된 팩토리
    pub fn get_plugin_factory(&self, id: &str) -> Option<PluginFactory> {
        self.factories.read().get(id).cloned()
    }

    /// 로드된 플러그인 id (정렬)
    pub fn list_plugins(&self) -> Vec<String> {
        self.plugins.read().keys().cloned().collect()
    }

    /// 등록된 팩토리 id (정렬)
    pub fn list_plugin_factories(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    /// 메타데이터 (로드되지 않았으면 팩토리의 정적 descriptor)
    pub fn get_plugin_metadata(&self, id: &str) -> Option<PluginMetadata> {
        if let Some(plugin) = self.get_plugin(id) {
            return Some(plugin.metadata());
        }

        self.factories.read().get(id).map(|factory| PluginMetadata {
            descriptor: factory.descriptor().clone(),
            state: PluginState::Uninitialized,
            type_name: factory.type_name().to_string(),
        })
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.plugins.read().contains_key(id)
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("policy", &self.policy)
            .field("factories", &self.list_plugin_factories())
            .field("loaded", &self.list_plugins())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::plugin::descriptor::PluginDescriptor;
    use crate::plugin::traits::{Lifecycle, PluginClass};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        lifecycle: Lifecycle,
    }

    impl Plugin for Echo {
        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }

        fn on_initialize(&self) -> Result<bool> {
            Ok(true)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl PluginClass for Echo {
        fn class_descriptor() -> PluginDescriptor {
            PluginDescriptor::new("echo", "Echo").with_version("1.0.0")
        }

        fn construct(context: PluginContext) -> Result<Self> {
            Ok(Self {
                lifecycle: Lifecycle::new::<Self>(Self::class_descriptor(), context)?,
            })
        }
    }

    struct Loud {
        lifecycle: Lifecycle,
    }

    impl Plugin for Loud {
        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }

        fn on_initialize(&self) -> Result<bool> {
            Ok(false)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl PluginClass for Loud {
        fn class_descriptor() -> PluginDescriptor {
            PluginDescriptor::new("echo", "Loud Echo")
        }

        fn construct(context: PluginContext) -> Result<Self> {
            Ok(Self {
                lifecycle: Lifecycle::new::<Self>(Self::class_descriptor(), context)?,
            })
        }
    }

    fn echo_unit() -> Result<Vec<PluginFactory>> {
        Ok(vec![PluginFactory::of::<Echo>()])
    }

    fn loud_unit() -> Result<Vec<PluginFactory>> {
        Ok(vec![PluginFactory::of::<Loud>()])
    }

    fn broken_unit() -> Result<Vec<PluginFactory>> {
        Err(Error::Internal("syntax error".into()))
    }

    fn nameless_unit() -> Result<Vec<PluginFactory>> {
        Ok(vec![PluginFactory::new(
            PluginDescriptor::new("", "Nameless"),
            "Nameless",
            |_| Err(Error::Internal("never constructed".into())),
        )])
    }

    fn failing_ctor_unit() -> Result<Vec<PluginFactory>> {
        Ok(vec![PluginFactory::new(
            PluginDescriptor::new("fragile", "Fragile"),
            "Fragile",
            |_| Err(Error::Internal("constructor failed".into())),
        )])
    }

    fn manager(policy: DuplicatePolicy) -> PluginManager {
        let context = PluginContext::new(Arc::new(EventBus::new()), Arc::new(Container::new()));
        PluginManager::with_policy(context, policy)
    }

    #[test]
    fn test_unknown_namespace() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        assert!(matches!(
            manager.discover("nowhere"),
            Err(Error::NamespaceNotFound(_))
        ));
    }

    #[test]
    fn test_discover_once_per_unit() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(PluginNamespace::new("test.plugins").with_unit("echo", echo_unit));

        let first = manager.discover("test.plugins").unwrap();
        assert_eq!(first.discovered, vec!["echo"]);
        assert!(first.is_clean());

        let second = manager.discover("test.plugins").unwrap();
        assert!(second.discovered.is_empty());
        assert!(second.collisions.is_empty());
        assert_eq!(manager.list_plugin_factories(), vec!["echo"]);
    }

    #[test]
    fn test_discover_continues_past_bad_units() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(
            PluginNamespace::new("test.plugins")
                .with_unit("broken", broken_unit)
                .with_unit("nameless", nameless_unit)
                .with_unit("echo", echo_unit),
        );

        let report = manager.discover("test.plugins").unwrap();
        assert_eq!(report.discovered, vec!["echo"]);
        assert_eq!(report.skipped, vec!["Nameless"]);
        assert_eq!(report.failed_units.len(), 1);
        assert_eq!(report.failed_units[0].unit, "test.plugins.broken");
    }

    #[test]
    fn test_first_registration_wins() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(
            PluginNamespace::new("test.plugins")
                .with_unit("echo", echo_unit)
                .with_unit("loud", loud_unit),
        );

        let report = manager.discover("test.plugins").unwrap();
        assert_eq!(report.discovered, vec!["echo"]);
        assert_eq!(
            report.collisions,
            vec![Collision {
                id: "echo".into(),
                kept: "Echo".into(),
                ignored: "Loud".into(),
            }]
        );
        assert_eq!(manager.get_plugin_factory("echo").unwrap().type_name(), "Echo");
    }

    #[test]
    fn test_replace_policy() {
        let manager = manager(DuplicatePolicy::Replace);
        manager.add_namespace(
            PluginNamespace::new("test.plugins")
                .with_unit("echo", echo_unit)
                .with_unit("loud", loud_unit),
        );

        let report = manager.discover("test.plugins").unwrap();
        assert_eq!(report.collisions[0].kept, "Loud");
        assert_eq!(manager.get_plugin_factory("echo").unwrap().type_name(), "Loud");
    }

    #[test]
    fn test_load_is_cached() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(PluginNamespace::new("test.plugins").with_unit("echo", echo_unit));
        manager.discover("test.plugins").unwrap();

        let first = manager.load_plugin("echo").unwrap();
        let second = manager.load_plugin("echo").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_initialized());
        assert_eq!(manager.list_plugins(), vec!["echo"]);
        assert!(manager.load_plugin("missing").is_none());
    }

    #[test]
    fn test_failed_load_not_cached() {
        let manager = manager(DuplicatePolicy::Replace);
        manager.add_namespace(
            PluginNamespace::new("test.plugins")
                .with_unit("loud", loud_unit)
                .with_unit("fragile", failing_ctor_unit),
        );
        manager.discover("test.plugins").unwrap();

        assert!(manager.load_plugin("echo").is_none());
        assert!(manager.load_plugin("fragile").is_none());
        assert!(manager.list_plugins().is_empty());
    }

    #[test]
    fn test_unload() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(PluginNamespace::new("test.plugins").with_unit("echo", echo_unit));
        manager.discover("test.plugins").unwrap();

        assert!(!manager.unload_plugin("echo"));

        let plugin = manager.load_plugin("echo").unwrap();
        assert!(manager.unload_plugin("echo"));
        assert_eq!(plugin.state(), PluginState::ShutDown);
        assert!(!manager.is_loaded("echo"));
        assert!(!manager.unload_plugin("echo"));
    }

    #[test]
    fn test_metadata_fallback() {
        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(PluginNamespace::new("test.plugins").with_unit("echo", echo_unit));
        manager.discover("test.plugins").unwrap();

        let metadata = manager.get_plugin_metadata("echo").unwrap();
        assert_eq!(metadata.state, PluginState::Uninitialized);
        assert_eq!(metadata.type_name, "Echo");

        manager.load_plugin("echo").unwrap();
        let metadata = manager.get_plugin_metadata("echo").unwrap();
        assert_eq!(metadata.state, PluginState::Initialized);
        assert!(manager.get_plugin_metadata("missing").is_none());
    }

    #[test]
    fn test_retry_failed_unit() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        fn flaky_unit() -> Result<Vec<PluginFactory>> {
            if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::Internal("first load fails".into()))
            } else {
                Ok(vec![PluginFactory::of::<Echo>()])
            }
        }

        let manager = manager(DuplicatePolicy::KeepFirst);
        manager.add_namespace(PluginNamespace::new("test.plugins").with_unit("flaky", flaky_unit));

        assert_eq!(manager.discover("test.plugins").unwrap().failed_units.len(), 1);
        assert_eq!(manager.discover("test.plugins").unwrap().discovered, vec!["echo"]);
    }
}
