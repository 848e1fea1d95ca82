//! Plugin Discovery - 명시적 등록 테이블
//!
//! 네임스페이스는 경로(`uniapp.builtin` 등)와 로드 단위(unit) 목록을 가집니다.
//! 각 unit의 loader는 해당 unit이 제공하는 [`PluginFactory`] 목록을 반환합니다.
//!
//! ```text
//! PluginNamespace "uniapp.builtin"
//!   ├─ unit "calculator"    → [CalculatorPlugin]
//!   └─ unit "calculator_ui" → [CalculatorUiPlugin]
//! ```

use super::descriptor::PluginDescriptor;
use super::traits::{Plugin, PluginClass, PluginContext};
use serde::Serialize;
use std::sync::Arc;
use uniapp_foundation::Result;

/// 플러그인 생성자
pub type PluginConstructor =
    Arc<dyn Fn(PluginContext) -> Result<Arc<dyn Plugin>> + Send + Sync>;

/// unit loader
pub type UnitLoader = fn() -> Result<Vec<PluginFactory>>;

// ============================================================================
// PluginFactory
// ============================================================================

/// 플러그인 팩토리 - 정적 descriptor + 구현 타입 이름 + 생성자
#[derive(Clone)]
pub struct PluginFactory {
    descriptor: PluginDescriptor,
    type_name: &'static str,
    constructor: PluginConstructor,
}

impl PluginFactory {
    /// 직접 생성
    pub fn new<F>(descriptor: PluginDescriptor, type_name: &'static str, constructor: F) -> Self
    where
        F: Fn(PluginContext) -> Result<Arc<dyn Plugin>> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            type_name,
            constructor: Arc::new(constructor),
        }
    }

    /// [`PluginClass`] 구현 타입으로 생성
    pub fn of<P: PluginClass>() -> Self {
        let full = std::any::type_name::<P>();
        Self {
            descriptor: P::class_descriptor(),
            type_name: full.rsplit("::").next().unwrap_or(full),
            constructor: Arc::new(|context: PluginContext| -> Result<Arc<dyn Plugin>> {
                let plugin: Arc<dyn Plugin> = Arc::new(P::construct(context)?);
                Ok(plugin)
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 인스턴스 생성 (초기화는 하지 않음)
    pub fn construct(&self, context: PluginContext) -> Result<Arc<dyn Plugin>> {
        (self.constructor)(context)
    }
}

impl std::fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFactory")
            .field("id", &self.descriptor.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

// ============================================================================
// PluginUnit / PluginNamespace
// ============================================================================

/// 로드 단위
#[derive(Debug, Clone)]
pub struct PluginUnit {
    name: String,
    loader: UnitLoader,
}

impl PluginUnit {
    pub fn new(name: impl Into<String>, loader: UnitLoader) -> Self {
        Self {
            name: name.into(),
            loader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load(&self) -> Result<Vec<PluginFactory>> {
        (self.loader)()
    }
}

/// 플러그인 네임스페이스
#[derive(Debug, Clone)]
pub struct PluginNamespace {
    path: String,
    units: Vec<PluginUnit>,
}

impl PluginNamespace {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            units: vec![],
        }
    }

    pub fn with_unit(mut self, name: impl Into<String>, loader: UnitLoader) -> Self {
        self.units.push(PluginUnit::new(name, loader));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn units(&self) -> &[PluginUnit] {
        &self.units
    }

    /// unit의 전체 경로 (`<namespace>.<unit>`)
    pub fn unit_path(&self, unit: &PluginUnit) -> String {
        format!("{}.{}", self.path, unit.name)
    }
}

// ============================================================================
// DiscoveryReport
// ============================================================================

/// 중복 id 충돌 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub id: String,

    /// 남은 구현 타입
    pub kept: String,

    /// 무시된 구현 타입
    pub ignored: String,
}

/// 로드 실패한 unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub error: String,
}

/// 발견 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub namespace: String,

    /// 새로 등록된 플러그인 id
    pub discovered: Vec<String>,

    pub collisions: Vec<Collision>,

    /// id가 없어 건너뛴 구현 타입
    pub skipped: Vec<String>,

    pub failed_units: Vec<UnitFailure>,
}

impl DiscoveryReport {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.collisions.is_empty() && self.skipped.is_empty() && self.failed_units.is_empty()
    }
}


