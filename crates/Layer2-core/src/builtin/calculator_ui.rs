//! Calculator UI - 예제 UI 플러그인
//!
//! 초기화 시 컨테이너에서 계산기 서비스를 찾고, 호스트에 `calculator` 페이지를 붙입니다.

use super::calculator::CalculatorService;
use crate::plugin::{
    Lifecycle, PageHost, Plugin, PluginClass, PluginContext, PluginDescriptor, UiPlugin,
};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use tracing::{error, info};
use uniapp_foundation::Result;

pub const PAGE_ID: &str = "calculator";
pub const PAGE_TITLE: &str = "Calculator";

/// 계산기 UI 플러그인
pub struct CalculatorUiPlugin {
    lifecycle: Lifecycle,
    calculator: Mutex<Option<Arc<dyn CalculatorService>>>,
}

impl CalculatorUiPlugin {
    /// 초기화 시 찾은 계산기 서비스
    pub fn calculator(&self) -> Option<Arc<dyn CalculatorService>> {
        self.calculator.lock().clone()
    }
}

impl PluginClass for CalculatorUiPlugin {
    fn class_descriptor() -> PluginDescriptor {
        PluginDescriptor::new("calculator_ui", "Calculator UI")
            .with_version("1.0.0")
            .with_description("Example calculator UI plugin")
            .with_dependency("calculator")
    }

    fn construct(context: PluginContext) -> Result<Self> {
        Ok(Self {
            lifecycle: Lifecycle::new::<Self>(Self::class_descriptor(), context)?,
            calculator: Mutex::new(None),
        })
    }
}

impl Plugin for CalculatorUiPlugin {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn on_initialize(&self) -> Result<bool> {
        info!("Initializing calculator UI plugin");
        let container = self.lifecycle.context().container();
        match container.resolve_by_interface::<dyn CalculatorService>() {
            Ok(calculator) => {
                *self.calculator.lock() = Some(calculator);
                Ok(true)
            }
            Err(e) => {
                error!("Calculator service not available: {}", e);
                Ok(false)
            }
        }
    }

    fn on_shutdown(&self) -> Result<()> {
        info!("Shutting down calculator UI plugin");
        self.calculator.lock().take();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_ui(&self) -> Option<&dyn UiPlugin> {
        Some(self)
    }
}

impl UiPlugin for CalculatorUiPlugin {
    fn on_register_page(&self, host: &mut dyn PageHost) -> Result<()> {
        host.attach_page(PAGE_ID, PAGE_TITLE)?;
        info!("Calculator page registered with host");
        Ok(())
    }
}


