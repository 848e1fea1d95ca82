//! Calculator - 예제 서비스 플러그인
//!
//! `CalculatorService` 인터페이스를 컨테이너에 `calculator` 이름으로 등록합니다.

use crate::container::{Container, InterfaceId, ServiceRegistration};
use crate::plugin::{Lifecycle, Plugin, PluginClass, PluginContext, PluginDescriptor, ServicePlugin};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};
use uniapp_foundation::event::{EventHeader, EventKind, SERVICE_EVENT};
use uniapp_foundation::{impl_event, Error, EventBus, Result};

/// 보관하는 계산 기록 최대 개수
pub const HISTORY_LIMIT: usize = 100;

/// 컨테이너 등록 이름
pub const SERVICE_NAME: &str = "calculator";

// ============================================================================
// Interface
// ============================================================================

/// 계산기 서비스 인터페이스
pub trait CalculatorService: Send + Sync {
    fn add(&self, a: f64, b: f64) -> f64;

    fn subtract(&self, a: f64, b: f64) -> f64;

    fn multiply(&self, a: f64, b: f64) -> f64;

    /// `b == 0`이면 에러
    fn divide(&self, a: f64, b: f64) -> Result<f64>;

    /// 계산 기록 (오래된 순)
    fn history(&self) -> Vec<CalculationRecord>;
}

/// 계산 기록 한 건
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationRecord {
    pub operation: String,
    pub a: f64,
    pub b: f64,
    pub result: f64,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event
// ============================================================================

pub static CALCULATION_PERFORMED: EventKind =
    EventKind::child("CalculationPerformed", &SERVICE_EVENT);

/// 계산 수행됨
#[derive(Debug, Clone, Serialize)]
pub struct CalculationPerformed {
    pub header: EventHeader,
    pub operation: String,
    pub a: f64,
    pub b: f64,
    pub result: f64,
}

impl_event!(CalculationPerformed, CALCULATION_PERFORMED);

// ============================================================================
// BasicCalculator
// ============================================================================

/// 기본 계산기 구현
pub struct BasicCalculator {
    history: Mutex<VecDeque<CalculationRecord>>,
    event_bus: Arc<EventBus>,
}

impl BasicCalculator {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
            event_bus,
        }
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    fn record(&self, operation: &str, a: f64, b: f64, result: f64) -> f64 {
        {
            let mut history = self.history.lock();
            history.push_back(CalculationRecord {
                operation: operation.to_string(),
                a,
                b,
                result,
                timestamp: Utc::now(),
            });
            if history.len() > HISTORY_LIMIT {
                history.pop_front();
            }
        }

        self.event_bus.publish(&CalculationPerformed {
            header: EventHeader::new(format!("plugin.{}", SERVICE_NAME)),
            operation: operation.to_string(),
            a,
            b,
            result,
        });
        debug!("Recorded calculation: {}({}, {}) = {}", operation, a, b, result);
        result
    }
}

impl CalculatorService for BasicCalculator {
    fn add(&self, a: f64, b: f64) -> f64 {
        self.record("add", a, b, a + b)
    }

    fn subtract(&self, a: f64, b: f64) -> f64 {
        self.record("subtract", a, b, a - b)
    }

    fn multiply(&self, a: f64, b: f64) -> f64 {
        self.record("multiply", a, b, a * b)
    }

    fn divide(&self, a: f64, b: f64) -> Result<f64> {
        if b == 0.0 {
            return Err(Error::service(SERVICE_NAME, "divide", "Cannot divide by zero"));
        }
        Ok(self.record("divide", a, b, a / b))
    }

    fn history(&self) -> Vec<CalculationRecord> {
        self.history.lock().iter().cloned().collect()
    }
}

// ============================================================================
// CalculatorPlugin
// ============================================================================

/// 계산기 서비스 플러그인
pub struct CalculatorPlugin {
    lifecycle: Lifecycle,
    service: Arc<BasicCalculator>,
}

impl CalculatorPlugin {
    /// 등록될 서비스 인스턴스
    pub fn service(&self) -> &Arc<BasicCalculator> {
        &self.service
    }
}

impl PluginClass for CalculatorPlugin {
    fn class_descriptor() -> PluginDescriptor {
        PluginDescriptor::new("calculator", "Calculator")
            .with_version("1.0.0")
            .with_description("Example calculator service plugin")
    }

    fn construct(context: PluginContext) -> Result<Self> {
        let service = Arc::new(BasicCalculator::new(Arc::clone(context.event_bus())));
        Ok(Self {
            lifecycle: Lifecycle::new::<Self>(Self::class_descriptor(), context)?,
            service,
        })
    }
}

impl Plugin for CalculatorPlugin {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn on_initialize(&self) -> Result<bool> {
        info!("Initializing calculator plugin");
        Ok(true)
    }

    fn on_shutdown(&self) -> Result<()> {
        info!("Shutting down calculator plugin");
        self.service.clear_history();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_service(&self) -> Option<&dyn ServicePlugin> {
        Some(self)
    }
}

impl ServicePlugin for CalculatorPlugin {
    fn interface(&self) -> InterfaceId {
        InterfaceId::of::<dyn CalculatorService>()
    }

    fn on_register_service(&self, container: &Container) -> Result<Vec<String>> {
        let service: Arc<dyn CalculatorService> = self.service.clone();
        container.register(ServiceRegistration::instance(SERVICE_NAME, service))?;
        Ok(vec![SERVICE_NAME.to_string()])
    }
}


