//! Registry Entry - 서비스 등록 항목
//!
//! 인스턴스는 `Arc<I>`를 한 번 더 감싼 `Arc<dyn Any>`로 보관합니다.
//! 꺼낼 때 `Arc<I>`를 clone하므로 등록된 인스턴스의 정체성(`Arc::ptr_eq`)이 유지됩니다.

use super::interface::InterfaceId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use uniapp_foundation::{Error, Result};

/// 타입이 지워진 인스턴스 (내부는 `Arc<I>`)
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// 타입이 지워진 팩토리
pub(crate) type ErasedFactory = Arc<dyn Fn() -> ErasedInstance + Send + Sync>;

/// 서비스 팩토리
pub type ServiceFactory<I> = Arc<dyn Fn() -> Arc<I> + Send + Sync>;

pub(crate) fn erase<I: ?Sized + Send + Sync + 'static>(instance: Arc<I>) -> ErasedInstance {
    Arc::new(instance)
}

/// `erase`의 역연산
pub(crate) fn unerase<I: ?Sized + Send + Sync + 'static>(
    name: &str,
    interface: InterfaceId,
    erased: &ErasedInstance,
) -> Result<Arc<I>> {
    erased.downcast_ref::<Arc<I>>().cloned().ok_or_else(|| {
        Error::InvalidRegistration(format!(
            "Service '{}' implements {}, not {}",
            name,
            interface,
            InterfaceId::of::<I>()
        ))
    })
}

// ============================================================================
// ServiceRegistration - 등록 요청
// ============================================================================

/// 서비스 등록 요청 (이름 + 인스턴스 및/또는 팩토리)
///
/// 인터페이스는 타입 인자 `I`로 정해집니다.
pub struct ServiceRegistration<I: ?Sized> {
    name: String,
    instance: Option<Arc<I>>,
    factory: Option<ServiceFactory<I>>,
}

impl<I: ?Sized + Send + Sync + 'static> ServiceRegistration<I> {
    /// 이미 만들어진 인스턴스로 등록
    pub fn instance(name: impl Into<String>, instance: Arc<I>) -> Self {
        Self {
            name: name.into(),
            instance: Some(instance),
            factory: None,
        }
    }

    /// 팩토리로 등록 (첫 resolve 시 생성)
    pub fn factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<I> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            instance: None,
            factory: Some(Arc::new(factory)),
        }
    }

    /// 빈 등록 요청 (검증 실패 케이스용)
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
            factory: None,
        }
    }

    /// 등록 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_entry(self, sequence: u64) -> Result<RegistryEntry> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRegistration(
                "Service name must not be empty".to_string(),
            ));
        }
        if self.instance.is_none() && self.factory.is_none() {
            return Err(Error::InvalidRegistration(format!(
                "Service '{}' needs an instance or a factory",
                self.name
            )));
        }

        let factory: Option<ErasedFactory> = self.factory.map(|factory| {
            let erased: ErasedFactory = Arc::new(move || erase(factory()));
            erased
        });

        Ok(RegistryEntry {
            name: self.name,
            interface: InterfaceId::of::<I>(),
            instance: self.instance.map(erase),
            factory,
            registered_at: Utc::now(),
            sequence,
        })
    }
}

// ============================================================================
// RegistryEntry - 등록 항목
// ============================================================================

/// 레지스트리 항목 `(name, instance, interface, factory)`
pub struct RegistryEntry {
    pub(crate) name: String,
    pub(crate) interface: InterfaceId,
    pub(crate) instance: Option<ErasedInstance>,
    pub(crate) factory: Option<ErasedFactory>,
    pub(crate) registered_at: DateTime<Utc>,
    pub(crate) sequence: u64,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface(&self) -> InterfaceId {
        self.interface
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// 등록 순번 (최신 인덱스 재계산용)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// 등록 시 인스턴스가 주어졌는지
    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// 등록된 원본 인스턴스, 없으면 팩토리로 생성
    pub(crate) fn provide(&self) -> Option<ErasedInstance> {
        match (&self.instance, &self.factory) {
            (Some(instance), _) => Some(Arc::clone(instance)),
            (None, Some(factory)) => Some(factory()),
            (None, None) => None,
        }
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("interface", &self.interface)
            .field("has_instance", &self.has_instance())
            .field("has_factory", &self.has_factory())
            .field("sequence", &self.sequence)
            .finish()
    }
}

// ============================================================================
// ServiceSummary - 진단용 요약
// ============================================================================

/// `list_all_services` 결과 항목
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    /// 인터페이스 짧은 이름
    pub interface: String,

    /// 인터페이스 전체 타입 이름
    pub type_name: String,

    /// override가 걸려 있는지
    pub overridden: bool,

    /// 바인딩이 생성되었는지
    pub materialized: bool,

    pub registered_at: DateTime<Utc>,
}


