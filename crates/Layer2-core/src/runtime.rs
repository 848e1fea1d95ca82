//! Runtime - 런타임 컨텍스트
//!
//! 프로세스 시작 시 한 번 만들어 필요한 곳에 넘깁니다. 전역 상태는 없습니다.
//!
//! ```text
//! Runtime
//!  ├─ EventBus        (Arc, 공유)
//!  ├─ Container       (Arc, 공유)
//!  ├─ PluginManager   (context = EventBus + Container)
//!  └─ PluginRegistry  (ApplicationShuttingDown 구독)
//! ```

use crate::container::Container;
use crate::plugin::{PluginContext, PluginManager, PluginNamespace, PluginRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uniapp_foundation::event::{ApplicationShuttingDown, ApplicationStarted};
use uniapp_foundation::{BackgroundWorker, EventBus, HandlerOutcome, Result, RuntimeConfig};

/// 이벤트 소스 이름
const RUNTIME_SOURCE: &str = "runtime";

/// 런타임 컨텍스트
pub struct Runtime {
    config: RuntimeConfig,
    event_bus: Arc<EventBus>,
    container: Arc<Container>,
    plugin_manager: Arc<PluginManager>,
    plugin_registry: Arc<PluginRegistry>,
}

impl Runtime {
    /// 설정으로 생성
    pub fn new(config: RuntimeConfig) -> Self {
        let event_bus = Arc::new(EventBus::with_config((&config.event_bus).into()));
        let container = Arc::new(Container::new());
        let context = PluginContext::new(Arc::clone(&event_bus), Arc::clone(&container));
        let plugin_manager = Arc::new(PluginManager::with_policy(
            context,
            config.plugins.on_duplicate,
        ));
        let plugin_registry = PluginRegistry::new(
            Arc::clone(&plugin_manager),
            Arc::clone(&container),
            Arc::clone(&event_bus),
        );

        Self {
            config,
            event_bus,
            container,
            plugin_manager,
            plugin_registry,
        }
    }

    /// 네임스페이스 추가 후 설정된 패키지 등록, `autoActivate`면 활성화
    ///
    /// `plugins.packages`가 비어있으면 주어진 네임스페이스 전체를 등록합니다.
    /// `plugins.enabled`가 비어있으면 발견된 플러그인 전체를 활성화합니다.
    /// 반환값은 플러그인 id별 활성화 결과입니다.
    pub fn bootstrap(
        &self,
        namespaces: impl IntoIterator<Item = PluginNamespace>,
    ) -> Result<BTreeMap<String, bool>> {
        let mut paths = vec![];
        for namespace in namespaces {
            paths.push(namespace.path().to_string());
            self.plugin_manager.add_namespace(namespace);
        }

        let packages = if self.config.plugins.packages.is_empty() {
            paths
        } else {
            self.config.plugins.packages.clone()
        };

        for package in &packages {
            self.plugin_registry.register_plugin_package(package)?;
        }

        if !self.config.plugins.auto_activate {
            info!("Plugin auto activation disabled");
            return Ok(BTreeMap::new());
        }

        let results = if self.config.plugins.enabled.is_empty() {
            self.plugin_registry.activate_all()
        } else {
            self.config
                .plugins
                .enabled
                .iter()
                .map(|id| (id.clone(), self.plugin_registry.activate_plugin(id)))
                .collect()
        };

        let failed: Vec<_> = results
            .iter()
            .filter(|(_, activated)| !**activated)
            .map(|(id, _)| id.as_str())
            .collect();
        if !failed.is_empty() {
            warn!("Plugins failed to activate: {}", failed.join(", "));
        }
        info!(
            "Bootstrap complete: {} of {} plugins active",
            results.len() - failed.len(),
            results.len()
        );
        Ok(results)
    }

    /// `ApplicationStarted` 발행
    pub fn start(&self) -> Vec<HandlerOutcome> {
        info!("{} v{} starting", self.config.app.title, self.config.app.version);
        self.event_bus.publish(&ApplicationStarted::new(
            RUNTIME_SOURCE,
            self.config.app.version.clone(),
        ))
    }

    /// `ApplicationShuttingDown` 발행 (플러그인 레지스트리가 전체 비활성화)
    pub fn shutdown(&self) -> Vec<HandlerOutcome> {
        info!("{} shutting down", self.config.app.title);
        self.event_bus
            .publish(&ApplicationShuttingDown::new(RUNTIME_SOURCE))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn plugin_manager(&self) -> &Arc<PluginManager> {
        &self.plugin_manager
    }

    pub fn plugin_registry(&self) -> &Arc<PluginRegistry> {
        &self.plugin_registry
    }

    /// 현재 tokio 런타임의 백그라운드 worker
    pub fn worker(&self) -> Result<BackgroundWorker> {
        BackgroundWorker::current()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("app", &self.config.app.title)
            .field("registry", &self.plugin_registry)
            .field("container", &self.container)
            .finish()
    }
}


