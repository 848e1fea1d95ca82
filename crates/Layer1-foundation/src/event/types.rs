//! Event Types - 이벤트 계층 및 공통 타입 정의
//!
//! 이벤트는 정적인 [`EventKind`] 체인으로 계층을 표현합니다.
//! 하위 kind 인스턴스를 발행하면 조상 kind 구독자에게도 전달됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// Event ID
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// 새 이벤트 ID 생성
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Kind (계층)
// ============================================================================

/// 이벤트 종류
///
/// `parent`를 따라 올라가면 루트 [`EVENT`]에 도달합니다.
/// kind는 `static` 주소로 구분되고, 이름은 표시용입니다 (같은 이름의 kind도 서로 다른 kind).
#[derive(Debug)]
pub struct EventKind {
    name: &'static str,
    parent: Option<&'static EventKind>,
}

impl EventKind {
    /// 루트 kind 생성
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// 하위 kind 생성
    pub const fn child(name: &'static str, parent: &'static EventKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// kind 이름
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 부모 kind
    pub fn parent(&self) -> Option<&'static EventKind> {
        self.parent
    }

    /// 자기 자신부터 루트까지 (가까운 순)
    pub fn lineage(&'static self) -> impl Iterator<Item = &'static EventKind> {
        std::iter::successors(Some(self), |kind| kind.parent)
    }

    /// `other`와 같거나 `other`의 하위 kind인지 확인
    pub fn is_a(&'static self, other: &EventKind) -> bool {
        self.lineage().any(|kind| kind == other)
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// 기본 kind 정의
// ============================================================================

/// 모든 이벤트의 루트
pub static EVENT: EventKind = EventKind::root("Event");

/// 시스템 레벨 이벤트 (시작, 종료, 설정 변경)
pub static SYSTEM_EVENT: EventKind = EventKind::child("SystemEvent", &EVENT);

/// 서비스 레벨 이벤트
pub static SERVICE_EVENT: EventKind = EventKind::child("ServiceEvent", &EVENT);

/// UI 레벨 이벤트
pub static UI_EVENT: EventKind = EventKind::child("UiEvent", &EVENT);

// ============================================================================
// Event Header
// ============================================================================

/// 모든 이벤트가 공유하는 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventHeader {
    /// 인스턴스별 고유 ID
    pub event_id: EventId,

    /// 생성 시간
    pub timestamp: DateTime<Utc>,

    /// 이벤트를 만든 컴포넌트 이름
    pub source: String,
}

impl EventHeader {
    /// 새 헤더 생성
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }

    /// 이벤트 ID 지정
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = EventId(id.into());
        self
    }
}

// ============================================================================
// Event Trait
// ============================================================================

/// 이벤트 trait
///
/// 이벤트는 불변이며 발행 시점에 생성되고, 버스는 dispatch 후 보관하지 않습니다.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// 이 인스턴스의 kind
    fn kind(&self) -> &'static EventKind;

    /// 공통 헤더
    fn header(&self) -> &EventHeader;

    /// 다운캐스팅용
    fn as_any(&self) -> &dyn Any;
}

impl dyn Event {
    /// 구체 이벤트 타입으로 다운캐스팅
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// `kind`(또는 그 하위)의 이벤트인지 확인
    pub fn is_a(&self, kind: &EventKind) -> bool {
        self.kind().is_a(kind)
    }

    /// 이벤트 ID
    pub fn event_id(&self) -> &EventId {
        &self.header().event_id
    }

    /// 이벤트 소스
    pub fn source(&self) -> &str {
        &self.header().source
    }
}

/// 구체 이벤트 타입의 정적 kind 조회
pub trait TypedEvent: Event {
    fn event_kind() -> &'static EventKind;
}

/// 구조체에 `Event` / `TypedEvent` 구현
///
/// 구조체는 `header: EventHeader` 필드를 가져야 합니다.
#[macro_export]
macro_rules! impl_event {
    ($ty:ty, $kind:expr) => {
        impl $crate::event::Event for $ty {
            fn kind(&self) -> &'static $crate::event::EventKind {
                &$kind
            }

            fn header(&self) -> &$crate::event::EventHeader {
                &self.header
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::event::TypedEvent for $ty {
            fn event_kind() -> &'static $crate::event::EventKind {
                &$kind
            }
        }
    };
}


