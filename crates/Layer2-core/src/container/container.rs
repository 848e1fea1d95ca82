//! Container - 서비스 바인딩 및 조회
//!
//! 레지스트리 항목마다 바인딩을 하나씩 가집니다.
//!
//! ```text
//! resolve(name)
//!     │
//!     ├─ override 있음 → override 인스턴스
//!     ├─ 원본 생성됨   → 원본 인스턴스 (항상 같은 Arc)
//!     └─ 미생성        → entry.provide() 후 원본으로 고정
//! ```
//!
//! 팩토리는 락 밖에서 호출합니다. 동시에 생성되면 먼저 기록된 쪽이 원본이 됩니다.

use super::entry::{erase, unerase, ErasedInstance, ServiceRegistration, ServiceSummary};
use super::interface::InterfaceId;
use super::registry::ServiceRegistry;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};
use uniapp_foundation::{Error, Result};

/// 항목별 바인딩
#[derive(Default)]
struct Binding {
    /// 원본 인스턴스 (한 번 생성되면 바뀌지 않음)
    original: Option<ErasedInstance>,

    /// 테스트 등에서 덧씌운 인스턴스
    overridden: Option<ErasedInstance>,
}

impl Binding {
    fn effective(&self) -> Option<ErasedInstance> {
        self.overridden.as_ref().or(self.original.as_ref()).cloned()
    }
}

#[derive(Default)]
struct ContainerState {
    registry: ServiceRegistry,
    bindings: HashMap<String, Binding>,
}

/// 서비스 컨테이너
#[derive(Default)]
pub struct Container {
    state: RwLock<ContainerState>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 정적 등록 (바인딩은 첫 resolve 때 생성)
    pub fn register<I>(&self, registration: ServiceRegistration<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        let sequence = state.registry.next_sequence();
        let entry = registration.into_entry(sequence)?;
        let name = entry.name.clone();
        let interface = entry.interface;

        state.registry.insert(entry)?;
        info!("Registered service '{}' for {}", name, interface);
        Ok(())
    }

    /// 인스턴스 등록 단축 메서드
    pub fn register_instance<I>(&self, name: impl Into<String>, instance: Arc<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.register(ServiceRegistration::instance(name, instance))
    }

    /// 동적 등록 (바인딩을 즉시 생성)
    pub fn register_dynamic<I>(&self, registration: ServiceRegistration<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let sequence = self.state.write().registry.next_sequence();
        let entry = registration.into_entry(sequence)?;
        let name = entry.name.clone();
        let interface = entry.interface;

        if self.contains(&name) {
            return Err(Error::AlreadyRegistered(name));
        }

        // 팩토리 호출은 락 밖에서
        let instance = entry.provide();

        let mut state = self.state.write();
        state.registry.insert(entry)?;
        state.bindings.insert(
            name.clone(),
            Binding {
                original: instance,
                overridden: None,
            },
        );
        info!("Registered dynamic service '{}' for {}", name, interface);
        Ok(())
    }

    /// 등록 해제 (항목과 바인딩 모두 제거)
    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        let entry = state
            .registry
            .remove(name)
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))?;
        state.bindings.remove(name);

        info!("Unregistered service '{}' ({})", name, entry.interface);
        Ok(())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 이름으로 조회
    pub fn resolve<I>(&self, name: &str) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let (interface, erased) = self.resolve_erased(name)?;
        unerase::<I>(name, interface, &erased)
    }

    /// 인터페이스의 최신 등록으로 조회
    pub fn resolve_by_interface<I>(&self) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let interface = InterfaceId::of::<I>();
        let name = self
            .state
            .read()
            .registry
            .latest_name(&interface)
            .map(str::to_string)
            .ok_or_else(|| Error::InterfaceNotRegistered(interface.to_string()))?;

        self.resolve::<I>(&name)
    }

    /// 인터페이스로 등록된 모든 구현 (이름 → 인스턴스)
    pub fn resolve_all_by_interface<I>(&self) -> Result<BTreeMap<String, Arc<I>>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let interface = InterfaceId::of::<I>();
        let names = self.state.read().registry.names_for(&interface).to_vec();
        if names.is_empty() {
            return Err(Error::InterfaceNotRegistered(interface.to_string()));
        }

        names
            .into_iter()
            .map(|name| {
                let instance = self.resolve::<I>(&name)?;
                Ok((name, instance))
            })
            .collect()
    }

    fn resolve_erased(&self, name: &str) -> Result<(InterfaceId, ErasedInstance)> {
        let entry_provider = {
            let state = self.state.read();
            let entry = state
                .registry
                .get(name)
                .ok_or_else(|| Error::ServiceNotFound(name.to_string()))?;

            if let Some(instance) = state.bindings.get(name).and_then(Binding::effective) {
                return Ok((entry.interface, instance));
            }
            (entry.interface, entry.instance.clone(), entry.factory.clone())
        };

        let (interface, instance, factory) = entry_provider;
        let provided = match (instance, factory) {
            (Some(instance), _) => instance,
            (None, Some(factory)) => {
                debug!("Materializing service '{}' from factory", name);
                factory()
            }
            (None, None) => {
                return Err(Error::InvalidRegistration(format!(
                    "Service '{}' has neither instance nor factory",
                    name
                )))
            }
        };

        let mut state = self.state.write();
        if !state.registry.contains(name) {
            return Err(Error::ServiceNotFound(name.to_string()));
        }
        let binding = state.bindings.entry(name.to_string()).or_default();
        if binding.original.is_none() {
            binding.original = Some(provided);
        }
        binding
            .effective()
            .map(|instance| (interface, instance))
            .ok_or_else(|| Error::Internal(format!("Binding for '{}' is empty", name)))
    }

    // ========================================================================
    // Override / Reset
    // ========================================================================

    /// 바인딩 위에 다른 구현을 덧씌움 (레지스트리의 원본 기록은 그대로)
    pub fn override_service<I>(&self, name: &str, implementation: Arc<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        let entry = state
            .registry
            .get(name)
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))?;

        let expected = entry.interface;
        let given = InterfaceId::of::<I>();
        if expected != given {
            return Err(Error::InvalidRegistration(format!(
                "Override for '{}' must implement {}, got {}",
                name, expected, given
            )));
        }

        state.bindings.entry(name.to_string()).or_default().overridden = Some(erase(implementation));
        info!("Overrode service '{}'", name);
        Ok(())
    }

    /// 한 항목의 override 해제 (override가 없으면 아무 일도 없음)
    pub fn reset_one(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if !state.registry.contains(name) {
            return Err(Error::ServiceNotFound(name.to_string()));
        }
        if let Some(binding) = state.bindings.get_mut(name) {
            if binding.overridden.take().is_some() {
                debug!("Reset override of service '{}'", name);
            }
        }
        Ok(())
    }

    /// 모든 override 해제
    pub fn reset_all(&self) {
        let mut state = self.state.write();
        let cleared = state
            .bindings
            .values_mut()
            .filter_map(|binding| binding.overridden.take())
            .count();
        if cleared > 0 {
            debug!("Reset {} service override(s)", cleared);
        }
    }

    // ========================================================================
    // 진단
    // ========================================================================

    /// 이름 → 요약
    pub fn list_all_services(&self) -> BTreeMap<String, ServiceSummary> {
        let state = self.state.read();
        state
            .registry
            .iter()
            .map(|entry| {
                let binding = state.bindings.get(&entry.name);
                let summary = ServiceSummary {
                    interface: entry.interface.short_name().to_string(),
                    type_name: entry.interface.name().to_string(),
                    overridden: binding.is_some_and(|b| b.overridden.is_some()),
                    materialized: binding.is_some_and(|b| b.original.is_some()),
                    registered_at: entry.registered_at,
                };
                (entry.name.clone(), summary)
            })
            .collect()
    }

    /// 인터페이스로 등록된 이름 목록 (등록 순)
    pub fn names_for_interface<I>(&self) -> Vec<String>
    where
        I: ?Sized + 'static,
    {
        self.state
            .read()
            .registry
            .names_for(&InterfaceId::of::<I>())
            .to_vec()
    }

    /// 등록된 서비스 이름 (정렬)
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .state
            .read()
            .registry
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().registry.contains(name)
    }

    pub fn len(&self) -> usize {
        self.state.read().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().registry.is_empty()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.len())
            .finish()
    }
}


