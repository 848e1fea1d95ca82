//! Service Container - 인터페이스 색인 서비스 레지스트리 + 컨테이너
//!
//! ## 구조
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Container                         │
//! │  ┌────────────────────────┐   ┌───────────────────────┐  │
//! │  │    ServiceRegistry     │   │       Bindings        │  │
//! │  │  name → entry          │   │  name → original      │  │
//! │  │  interface → latest    │   │       + override      │  │
//! │  │  interface → [names]   │   │                       │  │
//! │  └────────────────────────┘   └───────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! let container = Container::new();
//! container.register_instance::<dyn CalculatorService>("calc", Arc::new(BasicCalculator::default()))?;
//!
//! let calc = container.resolve_by_interface::<dyn CalculatorService>()?;
//! assert_eq!(calc.add(2.0, 3.0), 5.0);
//! ```

mod call;
#[allow(clippy::module_inception)]
mod container;
mod entry;
mod interface;
mod registry;

pub use call::service_call;
pub use container::Container;
pub use entry::{RegistryEntry, ServiceFactory, ServiceRegistration, ServiceSummary};
pub use interface::InterfaceId;
pub use registry::ServiceRegistry;
