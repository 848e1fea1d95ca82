//! Interface Id - 능력(capability) 인터페이스 식별자
//!
//! 서비스는 `dyn Trait` 타입의 [`TypeId`]로 색인됩니다.
//! 컨테이너는 인터페이스의 메서드를 보지 않고 타입 정체성만 사용합니다.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 능력 인터페이스 식별자
///
/// ```ignore
/// let id = InterfaceId::of::<dyn CalculatorService>();
/// assert_eq!(id.short_name(), "CalculatorService");
/// ```
#[derive(Clone, Copy)]
pub struct InterfaceId {
    type_id: TypeId,
    name: &'static str,
}

impl InterfaceId {
    /// 인터페이스 타입(보통 `dyn Trait`)의 식별자
    pub fn of<I: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<I>(),
            name: std::any::type_name::<I>(),
        }
    }

    /// 전체 타입 이름 (`dyn uniapp_core::builtin::CalculatorService` 등)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 경로를 뺀 짧은 이름
    pub fn short_name(&self) -> &'static str {
        let base = self.name.trim_start_matches("dyn ");
        let head = base.split('<').next().unwrap_or(base);
        head.rsplit("::").next().unwrap_or(head)
    }
}

impl PartialEq for InterfaceId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for InterfaceId {}

impl Hash for InterfaceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterfaceId").field(&self.name).finish()
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}


